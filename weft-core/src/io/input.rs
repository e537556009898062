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

use std::fmt;
use std::sync::Arc;

use crate::common::{CodecError, TransportError};
use crate::context::{Address, ConnectionContext};
use crate::message::{ControlMessage, Envelope, MessageId, Payload, CODEC};
use crate::traits::{InputHook, StreamMessage};
use crate::transport::Transport;

/// One resolved input connection of an instance, with its receipt hooks
/// resolved from the registry at bind time.
pub(crate) struct InputBinding {
    pub(crate) context: ConnectionContext,
    pub(crate) hooks: Vec<Arc<dyn InputHook>>,
}

/// A data message delivered to an input port.
///
/// The ack/fail helpers answer the emitting instance, whose delivery tracker
/// resolves the pending record; exactly one of them should be called per
/// message, though duplicates are harmless.
pub struct IncomingMessage {
    envelope: Envelope,
    source: Address,
    port: String,
    transport: Arc<dyn Transport>,
}

impl IncomingMessage {
    pub(crate) fn new(
        envelope: Envelope,
        source: Address,
        port: String,
        transport: Arc<dyn Transport>,
    ) -> Self {
        IncomingMessage {
            envelope,
            source,
            port,
            transport,
        }
    }

    /// Returns the wire payload.
    pub fn payload(&self) -> &Payload {
        &self.envelope.payload
    }

    /// Returns the tracked message id.
    pub fn message_id(&self) -> &MessageId {
        &self.envelope.message_id
    }

    /// Returns the input port this message arrived on.
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Returns the address of the emitting instance.
    pub fn source(&self) -> &Address {
        &self.source
    }

    /// Decodes the payload into a statically known message type.
    pub fn decode<T: StreamMessage>(&self) -> Result<T, CodecError> {
        CODEC.decode(&self.envelope.payload)
    }

    /// Acknowledges the message to its source.
    pub async fn ack(&self) -> Result<(), TransportError> {
        self.transport
            .send_control(
                &self.source,
                ControlMessage::Ack {
                    message_id: self.envelope.message_id.clone(),
                },
            )
            .await
    }

    /// Rejects the message; the source surfaces it through its fail handler.
    pub async fn fail(&self) -> Result<(), TransportError> {
        self.transport
            .send_control(
                &self.source,
                ControlMessage::Fail {
                    message_id: self.envelope.message_id.clone(),
                },
            )
            .await
    }
}

impl fmt::Debug for IncomingMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncomingMessage")
            .field("message_id", &self.envelope.message_id)
            .field("port", &self.port)
            .field("source", &self.source)
            .finish()
    }
}
