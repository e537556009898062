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

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::trace;

use crate::common::{TransportError, CONFIG};
use crate::context::Address;
use crate::message::{ControlMessage, Envelope};
use crate::transport::{Inbound, Transport};

/// In-process transport: a route table of channel senders, one per
/// registered instance address.
///
/// Per-route FIFO order follows channel order. Suitable for single-node
/// deployments and tests.
#[derive(Debug, Default)]
pub struct LocalTransport {
    routes: DashMap<Address, mpsc::Sender<Inbound>>,
}

impl LocalTransport {
    /// Creates a transport ready to share across instances.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn deliver(&self, target: &Address, inbound: Inbound) -> Result<(), TransportError> {
        let sender = self
            .routes
            .get(target)
            .map(|route| route.value().clone())
            .ok_or_else(|| TransportError::Unroutable(target.clone()))?;
        sender
            .send(inbound)
            .await
            .map_err(|_| TransportError::Closed(target.clone()))
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn send(&self, target: &Address, envelope: Envelope) -> Result<(), TransportError> {
        trace!(%target, message_id = %envelope.message_id, "delivering envelope");
        self.deliver(target, Inbound::Message(envelope)).await
    }

    async fn send_control(
        &self,
        target: &Address,
        control: ControlMessage,
    ) -> Result<(), TransportError> {
        self.deliver(target, Inbound::Control(control)).await
    }

    fn register(&self, address: &Address) -> mpsc::Receiver<Inbound> {
        let (sender, receiver) = mpsc::channel(CONFIG.limits.instance_inbox_capacity);
        self.routes.insert(address.clone(), sender);
        receiver
    }

    fn unregister(&self, address: &Address) {
        self.routes.remove(address);
    }
}
