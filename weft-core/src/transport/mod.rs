/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
pub use local::LocalTransport;

mod local;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::common::TransportError;
use crate::context::Address;
use crate::message::{ControlMessage, Envelope};

/// A message arriving at an instance address: either a data envelope or an
/// ack/fail control message. One registration carries both logical streams.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A data message from an upstream connection.
    Message(Envelope),
    /// An ack/fail answer for a message this instance emitted.
    Control(ControlMessage),
}

/// Boundary trait for the mechanism that physically moves bytes between
/// nodes.
///
/// The core routes by address only; how envelopes cross process or machine
/// boundaries is the implementation's concern. Messages sent from one source
/// to one target must arrive in send order (per-route FIFO).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Delivers a data envelope to the instance registered at `target`.
    async fn send(&self, target: &Address, envelope: Envelope) -> Result<(), TransportError>;

    /// Delivers an ack/fail control message to the instance at `target`.
    async fn send_control(
        &self,
        target: &Address,
        control: ControlMessage,
    ) -> Result<(), TransportError>;

    /// Registers a receive channel for `address` and returns its inbox.
    fn register(&self, address: &Address) -> mpsc::Receiver<Inbound>;

    /// Removes the route for `address`.
    fn unregister(&self, address: &Address);
}
