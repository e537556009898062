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

use crate::common::{AckHandler, DeliveryError, FailHandler};
use crate::delivery::DeliveryTracker;
use crate::message::{MessageId, Payload, CODEC};
use crate::traits::StreamMessage;

/// All output connections of one instance for one named output port.
///
/// Emitting forwards the message to every connection of the port; fan-out
/// multiplicity comes from one tracker per (source, target) pair, so a single
/// emit on a fan-out port yields one tracked delivery per target instance.
#[derive(Debug, Clone)]
pub struct OutputPort {
    name: String,
    connections: Vec<Arc<DeliveryTracker>>,
}

impl OutputPort {
    pub(crate) fn new(name: String, connections: Vec<Arc<DeliveryTracker>>) -> Self {
        OutputPort { name, connections }
    }

    /// Returns the port name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the delivery trackers of this port, one per connection.
    pub fn connections(&self) -> &[Arc<DeliveryTracker>] {
        &self.connections
    }

    /// True when any connection of this port is at capacity.
    pub fn queue_full(&self) -> bool {
        self.connections.iter().any(|tracker| tracker.queue_full())
    }

    /// Total messages awaiting a terminal transition across this port.
    pub fn pending_count(&self) -> usize {
        self.connections.iter().map(|tracker| tracker.pending_count()).sum()
    }

    /// Emits a message on every connection of this port.
    pub async fn emit<T: StreamMessage>(&self, message: &T) -> Result<Vec<MessageId>, DeliveryError> {
        let payload = CODEC.encode(message)?;
        self.emit_payload(payload, None).await
    }

    /// Emits a keyed message; key-based connections route by the key's hash.
    pub async fn emit_keyed<T: StreamMessage>(
        &self,
        message: &T,
        key: &str,
    ) -> Result<Vec<MessageId>, DeliveryError> {
        let payload = CODEC.encode(message)?;
        self.emit_payload(payload, Some(key)).await
    }

    pub(crate) async fn emit_payload(
        &self,
        payload: Payload,
        key: Option<&str>,
    ) -> Result<Vec<MessageId>, DeliveryError> {
        let mut message_ids = Vec::with_capacity(self.connections.len());
        for tracker in &self.connections {
            message_ids.push(tracker.emit(payload.clone(), key).await?);
        }
        Ok(message_ids)
    }

    /// Registers one ack handler across every connection of this port.
    pub fn on_ack(&self, handler: AckHandler) {
        for tracker in &self.connections {
            tracker.on_ack(handler.clone());
        }
    }

    /// Registers one fail handler across every connection of this port.
    pub fn on_fail(&self, handler: FailHandler) {
        for tracker in &self.connections {
            tracker.on_fail(handler.clone());
        }
    }
}
