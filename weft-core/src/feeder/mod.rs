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

//! Backpressure-aware production loop.
//!
//! A feeder drives a user-supplied production callback while downstream
//! capacity allows, without unbounded queuing and without busy-polling. Each
//! scheduled tick runs a tight pass: while the pass produced something and
//! the output reports capacity, the callback is invoked again; when capacity
//! is exhausted or a pass produces nothing, the loop suspends and re-arms
//! after the feed delay. The loop is an explicit scheduled task, never
//! recursion, so the call stack stays bounded.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::trace;

use crate::common::{AckHandler, DeliveryError, FailHandler, FeedHandler, FutureBox, CONFIG};
use crate::io::OutputPort;
use crate::message::MessageId;
use crate::traits::StreamMessage;

/// Builder for a production loop over one output port.
///
/// Ack and fail handlers registered here are wired through to every delivery
/// tracker of the port, so the caller observes delivery outcomes uniformly
/// regardless of which emission path produced the message.
pub struct Feeder {
    output: OutputPort,
    feed_delay: Duration,
    feed_handler: Option<FeedHandler>,
}

impl Feeder {
    /// Creates a feeder over an output port with the configured feed delay.
    pub fn new(output: OutputPort) -> Self {
        Feeder {
            output,
            feed_delay: CONFIG.feed_delay(),
            feed_handler: None,
        }
    }

    /// Sets the delay before the loop re-arms after an idle or saturated pass.
    pub fn with_feed_delay(mut self, feed_delay: Duration) -> Self {
        self.feed_delay = feed_delay;
        self
    }

    /// Registers the production callback invoked by the loop.
    pub fn on_feed<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(FeederEmitter) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.feed_handler = Some(Arc::new(move |emitter| -> FutureBox {
            Box::pin(handler(emitter))
        }));
        self
    }

    /// Registers the ack handler observed for every emission of this feeder.
    pub fn on_ack<F>(self, handler: F) -> Self
    where
        F: Fn(&MessageId) + Send + Sync + 'static,
    {
        let handler: AckHandler = Arc::new(handler);
        self.output.on_ack(handler);
        self
    }

    /// Registers the fail handler observed for every emission of this feeder.
    pub fn on_fail<F>(self, handler: F) -> Self
    where
        F: Fn(&MessageId, &DeliveryError) + Send + Sync + 'static,
    {
        let handler: FailHandler = Arc::new(handler);
        self.output.on_fail(handler);
        self
    }

    /// Starts the loop; returns a handle for manual emission and shutdown.
    pub fn start(self) -> FeederHandle {
        let fed = Arc::new(AtomicBool::new(false));
        let emitter = FeederEmitter {
            output: self.output.clone(),
            fed: fed.clone(),
        };
        let cancel = CancellationToken::new();
        let tasks = TaskTracker::new();
        let handle = FeederHandle {
            emitter: emitter.clone(),
            cancel: cancel.clone(),
            tasks: tasks.clone(),
        };

        let output = self.output;
        let feed_delay = self.feed_delay;
        let feed_handler = self.feed_handler;
        tasks.spawn(async move {
            loop {
                if let Some(handler) = &feed_handler {
                    // Tight pass: each invocation clears the flag; emissions
                    // re-set it, keeping the pass going while capacity lasts.
                    fed.store(true, Ordering::SeqCst);
                    while fed.swap(false, Ordering::SeqCst) && !output.queue_full() {
                        handler(emitter.clone()).await;
                    }
                }
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(feed_delay) => {}
                }
            }
            trace!("feeder loop stopped");
        });
        tasks.close();
        handle
    }
}

/// Emission path handed to the production callback.
///
/// Emissions mark the current pass as productive, which keeps the tight loop
/// running until capacity is exhausted.
#[derive(Debug, Clone)]
pub struct FeederEmitter {
    output: OutputPort,
    fed: Arc<AtomicBool>,
}

impl FeederEmitter {
    /// Emits a message on the feeder's output port.
    pub async fn emit<T: StreamMessage>(&self, message: &T) -> Result<Vec<MessageId>, DeliveryError> {
        self.fed.store(true, Ordering::SeqCst);
        self.output.emit(message).await
    }

    /// Emits a keyed message on the feeder's output port.
    pub async fn emit_keyed<T: StreamMessage>(
        &self,
        message: &T,
        key: &str,
    ) -> Result<Vec<MessageId>, DeliveryError> {
        self.fed.store(true, Ordering::SeqCst);
        self.output.emit_keyed(message, key).await
    }

    /// True when the downstream connection reports no remaining capacity.
    pub fn queue_full(&self) -> bool {
        self.output.queue_full()
    }
}

/// Handle to a running feeder: manual emission and shutdown.
#[derive(Debug, Clone)]
pub struct FeederHandle {
    emitter: FeederEmitter,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl FeederHandle {
    /// Emits outside the production callback. Manual emissions set the
    /// produced flag too, re-enabling the tight loop on the next tick.
    pub async fn emit<T: StreamMessage>(&self, message: &T) -> Result<Vec<MessageId>, DeliveryError> {
        self.emitter.emit(message).await
    }

    /// Emits a keyed message outside the production callback.
    pub async fn emit_keyed<T: StreamMessage>(
        &self,
        message: &T,
        key: &str,
    ) -> Result<Vec<MessageId>, DeliveryError> {
        self.emitter.emit_keyed(message, key).await
    }

    /// Total messages awaiting a terminal transition on the feeder's port.
    pub fn pending_count(&self) -> usize {
        self.emitter.output.pending_count()
    }

    /// Stops the loop and waits for the feeder task to finish.
    pub async fn stop(&self) {
        self.cancel.cancel();
        self.tasks.wait().await;
    }
}
