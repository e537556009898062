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

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, trace, warn};

use crate::common::{FutureBox, InputHandler, CONFIG};
use crate::context::{Address, NetworkContext};
use crate::delivery::DeliveryTracker;
use crate::io::input::InputBinding;
use crate::io::{IncomingMessage, OutputPort};
use crate::message::ControlMessage;
use crate::traits::HookRegistry;
use crate::transport::{Inbound, Transport};

/// Tuning for binding one instance to a transport.
#[derive(Debug, Clone)]
pub struct IoOptions {
    /// How long an emitted message may stay pending before it fails with a
    /// timeout.
    pub ack_timeout: Duration,
    /// Pending-message capacity of each output connection.
    pub max_pending: usize,
}

impl Default for IoOptions {
    fn default() -> Self {
        IoOptions {
            ack_timeout: CONFIG.ack_timeout(),
            max_pending: CONFIG.feeder.max_queue_size,
        }
    }
}

/// Binds one resolved instance to a transport.
///
/// Binding builds the instance's output ports (one delivery tracker per
/// output connection) and input bindings (hooks resolved by name), then
/// `start` runs the dispatch loop: data envelopes go to the handler of their
/// target port, ack/fail control messages go to the tracker owning the
/// message id. Dispatch is one task per instance handling messages
/// sequentially, which preserves per-connection FIFO order.
pub struct InstanceIo {
    address: Address,
    inbox: Receiver<Inbound>,
    inputs: HashMap<String, InputBinding>,
    handlers: HashMap<String, InputHandler>,
    outputs: HashMap<String, OutputPort>,
    trackers: HashMap<String, Arc<DeliveryTracker>>,
    transport: Arc<dyn Transport>,
}

impl InstanceIo {
    /// Binds with configured defaults and no hooks.
    pub fn bind(context: &NetworkContext, address: &Address, transport: Arc<dyn Transport>) -> Self {
        Self::bind_with(
            context,
            address,
            transport,
            IoOptions::default(),
            &HookRegistry::default(),
        )
    }

    /// Binds with explicit tuning and a hook registry resolving the hook
    /// names carried by this instance's input connections.
    pub fn bind_with(
        context: &NetworkContext,
        address: &Address,
        transport: Arc<dyn Transport>,
        options: IoOptions,
        hooks: &HookRegistry,
    ) -> Self {
        let inbox = transport.register(address);

        let mut trackers = HashMap::new();
        let mut ports: HashMap<String, Vec<Arc<DeliveryTracker>>> = HashMap::new();
        for connection in context.outputs_for(address) {
            let tracker = Arc::new(
                DeliveryTracker::new(connection.clone(), transport.clone())
                    .with_ack_timeout(options.ack_timeout)
                    .with_max_pending(options.max_pending),
            );
            trackers.insert(connection.id().to_string(), tracker.clone());
            ports
                .entry(connection.source_port().to_string())
                .or_default()
                .push(tracker);
        }
        let outputs = ports
            .into_iter()
            .map(|(port, connections)| {
                let output = OutputPort::new(port.clone(), connections);
                (port, output)
            })
            .collect();

        let mut inputs = HashMap::new();
        for connection in context.inputs_for(address) {
            let resolved = connection
                .hooks()
                .iter()
                .filter_map(|name| {
                    let hook = hooks.get(name);
                    if hook.is_none() {
                        warn!(hook = name.as_str(), "no hook registered under this name");
                    }
                    hook
                })
                .collect();
            inputs.insert(
                connection.id().to_string(),
                InputBinding {
                    context: connection.clone(),
                    hooks: resolved,
                },
            );
        }

        trace!(%address, outputs = trackers.len(), inputs = inputs.len(), "instance bound");
        InstanceIo {
            address: address.clone(),
            inbox,
            inputs,
            handlers: HashMap::new(),
            outputs,
            trackers,
            transport,
        }
    }

    /// Registers the handler for a named input port.
    pub fn on_input<F, Fut>(&mut self, port: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(IncomingMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let boxed: InputHandler = Arc::new(move |message| -> FutureBox { Box::pin(handler(message)) });
        self.handlers.insert(port.into(), boxed);
        self
    }

    /// Returns the named output port.
    pub fn output(&self, port: &str) -> Option<OutputPort> {
        self.outputs.get(port).cloned()
    }

    /// Starts the dispatch loop and returns the running instance's handle.
    pub fn start(self) -> InstanceHandle {
        let cancel = CancellationToken::new();
        let tasks = TaskTracker::new();
        let handle = InstanceHandle {
            address: self.address.clone(),
            outputs: self.outputs.clone(),
            cancel: cancel.clone(),
            tasks: tasks.clone(),
        };
        let mut io = self;
        tasks.spawn(async move {
            loop {
                let inbound = tokio::select! {
                    _ = cancel.cancelled() => None,
                    inbound = io.inbox.recv() => inbound,
                };
                let Some(inbound) = inbound else {
                    break;
                };
                io.dispatch(inbound).await;
            }
            io.transport.unregister(&io.address);
            trace!(address = %io.address, "instance dispatch stopped");
        });
        tasks.close();
        handle
    }

    async fn dispatch(&self, inbound: Inbound) {
        match inbound {
            Inbound::Message(envelope) => {
                let Some(input) = self.inputs.get(&envelope.source_connection) else {
                    debug!(
                        address = %self.address,
                        connection = %envelope.source_connection,
                        "envelope for unknown input connection dropped"
                    );
                    return;
                };
                for hook in &input.hooks {
                    hook.on_receive(&envelope);
                }
                let port = input.context.target_port();
                let Some(handler) = self.handlers.get(port) else {
                    debug!(address = %self.address, port, "no handler for input port");
                    return;
                };
                let message = IncomingMessage::new(
                    envelope,
                    input.context.source().clone(),
                    port.to_string(),
                    self.transport.clone(),
                );
                handler(message).await;
            }
            Inbound::Control(ControlMessage::Ack { message_id }) => {
                match self.trackers.get(message_id.connection_id()) {
                    Some(tracker) => tracker.ack(&message_id),
                    None => trace!(message_id = %message_id, "ack for unknown connection"),
                }
            }
            Inbound::Control(ControlMessage::Fail { message_id }) => {
                match self.trackers.get(message_id.connection_id()) {
                    Some(tracker) => tracker.fail(&message_id),
                    None => trace!(message_id = %message_id, "fail for unknown connection"),
                }
            }
        }
    }
}

impl fmt::Debug for InstanceIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceIo")
            .field("address", &self.address)
            .field("inputs", &self.inputs.len())
            .field("outputs", &self.outputs.len())
            .finish()
    }
}

/// Handle to a running instance: emit through its output ports, stop to
/// shut down.
#[derive(Debug, Clone)]
pub struct InstanceHandle {
    address: Address,
    outputs: HashMap<String, OutputPort>,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl InstanceHandle {
    /// Returns the instance address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Returns the named output port.
    pub fn output(&self, port: &str) -> Option<OutputPort> {
        self.outputs.get(port).cloned()
    }

    /// Stops the dispatch loop and waits for instance tasks to finish.
    pub async fn stop(&self) -> anyhow::Result<()> {
        self.cancel.cancel();
        self.tasks.wait().await;
        Ok(())
    }
}
