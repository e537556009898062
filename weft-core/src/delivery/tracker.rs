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
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::time::Instant;
use tokio_util::task::TaskTracker;
use tracing::{trace, warn};

use crate::common::{AckHandler, DeliveryError, FailHandler, CONFIG};
use crate::context::ConnectionContext;
use crate::delivery::PendingDelivery;
use crate::message::{Envelope, MessageId, Payload};
use crate::network::SelectionPolicy;
use crate::transport::Transport;

type PendingTable = Arc<DashMap<MessageId, PendingDelivery>>;
type HandlerCell<H> = Arc<RwLock<Option<H>>>;

/// Per-connection reliable-delivery state machine.
///
/// One tracker exists per output connection of a component instance. Tracking
/// is deliberately per-connection, not per-instance: an instance's output may
/// fan out across connections with independent capacities and failure
/// domains, and coalescing them would hide the backpressure signal of a slow
/// downstream.
///
/// Each emitted message moves through exactly one terminal transition:
/// `PENDING -> ACKED`, or `PENDING -> FAILED` via explicit fail or timeout.
/// The atomic removal from the pending table decides the transition, so
/// duplicate or late signals from at-least-once transports are no-ops.
pub struct DeliveryTracker {
    context: ConnectionContext,
    transport: Arc<dyn Transport>,
    pending: PendingTable,
    next_sequence: AtomicU64,
    cursor: AtomicU64,
    ack_timeout: Duration,
    max_pending: usize,
    ack_handler: HandlerCell<AckHandler>,
    fail_handler: HandlerCell<FailHandler>,
    timeouts: TaskTracker,
}

impl fmt::Debug for DeliveryTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryTracker")
            .field("connection", &self.context.id())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl DeliveryTracker {
    /// Creates a tracker for one output connection.
    pub fn new(context: ConnectionContext, transport: Arc<dyn Transport>) -> Self {
        DeliveryTracker {
            context,
            transport,
            pending: Arc::new(DashMap::new()),
            next_sequence: AtomicU64::new(0),
            cursor: AtomicU64::new(0),
            ack_timeout: CONFIG.ack_timeout(),
            max_pending: CONFIG.feeder.max_queue_size,
            ack_handler: Arc::new(RwLock::new(None)),
            fail_handler: Arc::new(RwLock::new(None)),
            timeouts: TaskTracker::new(),
        }
    }

    /// Sets how long an emitted message may stay pending before it fails
    /// with a timeout.
    pub fn with_ack_timeout(mut self, ack_timeout: Duration) -> Self {
        self.ack_timeout = ack_timeout;
        self
    }

    /// Sets the pending-message capacity reported through [`queue_full`](Self::queue_full).
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }

    /// Returns the connection this tracker serves.
    pub fn connection(&self) -> &ConnectionContext {
        &self.context
    }

    /// Registers the callback invoked on acknowledgment.
    pub fn on_ack(&self, handler: AckHandler) {
        *self.ack_handler.write() = Some(handler);
    }

    /// Registers the callback invoked on failure or timeout.
    pub fn on_fail(&self, handler: FailHandler) {
        *self.fail_handler.write() = Some(handler);
    }

    /// Number of messages awaiting a terminal transition.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// True when the pending table has reached the connection's capacity.
    pub fn queue_full(&self) -> bool {
        self.pending.len() >= self.max_pending
    }

    /// Emits a payload on this connection.
    ///
    /// Allocates a message id, records the pending delivery, forwards the
    /// envelope to the target selected by the connection's policy, and
    /// schedules the ack timeout. A keyless emit on a key-based connection
    /// hashes the payload's canonical JSON text, keeping routing
    /// deterministic per payload.
    pub async fn emit(&self, payload: Payload, key: Option<&str>) -> Result<MessageId, DeliveryError> {
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let message_id = MessageId::new(self.context.id(), sequence);
        let target = match self.context.policy() {
            SelectionPolicy::KeyBased => match key {
                Some(key) => self.context.target_for_key(key).clone(),
                None => self.context.target_for_key(&payload.value.to_string()).clone(),
            },
            _ => self
                .context
                .select_target(self.cursor.fetch_add(1, Ordering::Relaxed))
                .clone(),
        };
        let envelope = Envelope {
            message_id: message_id.clone(),
            source_connection: self.context.id().to_string(),
            payload,
        };
        self.pending.insert(
            message_id.clone(),
            PendingDelivery::new(message_id.clone(), target.clone(), Instant::now()),
        );
        if let Err(error) = self.transport.send(&target, envelope).await {
            self.pending.remove(&message_id);
            return Err(error.into());
        }
        trace!(message_id = %message_id, %target, "message emitted");

        let pending = self.pending.clone();
        let fail_handler = self.fail_handler.clone();
        let timeout = self.ack_timeout;
        let timed_out = message_id.clone();
        self.timeouts.spawn(async move {
            tokio::time::sleep(timeout).await;
            expire(&pending, &fail_handler, &timed_out, timeout);
        });
        Ok(message_id)
    }

    /// Acknowledges a pending message and invokes the ack callback.
    ///
    /// Unknown or already-terminal ids are a no-op: duplicate acknowledgments
    /// from an at-least-once transport must not fail the caller.
    pub fn ack(&self, message_id: &MessageId) {
        if self.pending.remove(message_id).is_some() {
            trace!(message_id = %message_id, "message acked");
            let handler = self.ack_handler.read().clone();
            if let Some(handler) = handler {
                handler(message_id);
            }
        }
    }

    /// Fails a pending message (explicit downstream rejection) and invokes
    /// the fail callback. Unknown or already-terminal ids are a no-op.
    pub fn fail(&self, message_id: &MessageId) {
        if self.pending.remove(message_id).is_some() {
            trace!(message_id = %message_id, "message failed");
            let handler = self.fail_handler.read().clone();
            if let Some(handler) = handler {
                handler(message_id, &DeliveryError::Failed(message_id.clone()));
            }
        }
    }
}

/// Times out a message that outlived its window, with a cause that lets
/// retry logic distinguish "destination said no" from "destination never
/// answered". Runs from the scheduled timeout task; the pending-table
/// removal keeps it a no-op for messages that already reached a terminal
/// state.
fn expire(
    pending: &DashMap<MessageId, PendingDelivery>,
    fail_handler: &RwLock<Option<FailHandler>>,
    message_id: &MessageId,
    timeout: Duration,
) {
    if pending.remove(message_id).is_some() {
        warn!(message_id = %message_id, timeout = ?timeout, "message timed out");
        let handler = fail_handler.read().clone();
        if let Some(handler) = handler {
            handler(message_id, &DeliveryError::TimedOut(message_id.clone(), timeout));
        }
    }
}
