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

use serde::{Deserialize, Serialize};
use static_assertions::assert_impl_all;

use crate::message::MessageId;

/// Type-tagged payload as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Stable type tag selecting the deserialization strategy on the receiver.
    pub type_tag: String,
    /// The serialized message value.
    pub value: serde_json::Value,
}

/// Carries one data message from a source connection to a target instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Identifier tracked by the source connection's delivery tracker.
    pub message_id: MessageId,
    /// Id of the connection context the message was emitted on; the receiver
    /// selects its input binding (and hooks) by this id.
    pub source_connection: String,
    /// The message payload.
    pub payload: Payload,
}

/// Ack/fail control messages, keyed by message id, sent from a receiving
/// instance back to the emitting instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMessage {
    /// The message was processed successfully.
    Ack {
        /// Id of the acknowledged message.
        message_id: MessageId,
    },
    /// The message was rejected.
    Fail {
        /// Id of the rejected message.
        message_id: MessageId,
    },
}

// Ensures the wire types implement the Send trait.
assert_impl_all!(Envelope: Send);
assert_impl_all!(ControlMessage: Send);
