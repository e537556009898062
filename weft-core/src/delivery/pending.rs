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

use derive_new::new;
use tokio::time::Instant;

use crate::context::Address;
use crate::message::MessageId;

/// One in-flight message: created on emit, removed on exactly one of ack,
/// fail, or timeout.
///
/// Owned exclusively by the delivery tracker of the emitting connection.
#[derive(new, Debug, Clone)]
pub struct PendingDelivery {
    message_id: MessageId,
    target: Address,
    emitted_at: Instant,
}

impl PendingDelivery {
    /// Returns the tracked message id.
    pub fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    /// Returns the target instance the message was sent to.
    pub fn target(&self) -> &Address {
        &self.target
    }

    /// Returns the emission timestamp.
    pub fn emitted_at(&self) -> Instant {
        self.emitted_at
    }
}
