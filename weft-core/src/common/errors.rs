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

//! Error taxonomy for the Weft framework.
//!
//! Every fallible operation completes through an explicit `Result`; nothing is
//! silently dropped. Resolution errors are fatal to the deploy caller,
//! delivery errors reach the registered fail handler, deployment errors carry
//! the causing instance and any stranded rollback leftovers, and store errors
//! propagate verbatim from the backend.

use std::time::Duration;

use thiserror::Error;

use crate::context::Address;
use crate::message::MessageId;
use crate::store::StoreKind;

/// Raised when a declarative network cannot be resolved into a runtime context.
///
/// These indicate a malformed topology and are never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// The network declares no components at all.
    #[error("network `{0}` declares no components")]
    EmptyNetwork(String),
    /// Two components share the same name.
    #[error("network declares component `{0}` more than once")]
    DuplicateComponent(String),
    /// A connection references a component the network does not declare.
    #[error("connection references unknown component `{component}`")]
    UnknownComponent {
        /// Name the connection referenced.
        component: String,
    },
    /// A connection references a port the component does not declare, or a
    /// port declared in the opposite direction.
    #[error("component `{component}` declares no {direction} port named `{port}`")]
    UnknownPort {
        /// Component the connection endpoint names.
        component: String,
        /// Port the connection endpoint names.
        port: String,
        /// `"input"` or `"output"`.
        direction: &'static str,
    },
}

/// Terminal causes for a tracked delivery, plus emit-side failures.
///
/// `Failed` and `TimedOut` are surfaced through the fail handler so retry
/// logic can tell "destination said no" from "destination never answered".
/// The core never retries; the message id is exposed for resubmission.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The destination explicitly rejected the message.
    #[error("message `{0}` was rejected downstream")]
    Failed(MessageId),
    /// No ack or fail arrived within the timeout window.
    #[error("message `{0}` timed out after {1:?}")]
    TimedOut(MessageId, Duration),
    /// The envelope could not be handed to the transport.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The payload could not be encoded for the wire.
    #[error(transparent)]
    Encode(#[from] CodecError),
}

/// Raised by the transport boundary when an envelope cannot be routed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No receive handler is registered for the target address.
    #[error("no route registered for `{0}`")]
    Unroutable(Address),
    /// The target's inbox channel has been closed.
    #[error("channel to `{0}` is closed")]
    Closed(Address),
}

/// Raised when a payload cannot be moved through the serializer cache.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The receiver has no strategy registered for the payload's type tag.
    #[error("no serialization strategy registered for type tag `{0}`")]
    UnknownTag(String),
    /// The payload's tag does not match the requested type.
    #[error("payload tagged `{found}` cannot decode as `{expected}`")]
    TagMismatch {
        /// Tag of the requested type.
        expected: &'static str,
        /// Tag carried by the payload.
        found: String,
    },
    /// The underlying JSON conversion failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Raised by cluster deploy/undeploy orchestration.
#[derive(Debug, Error)]
pub enum DeploymentError {
    /// The network could not be resolved; nothing was deployed.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    /// One instance failed to deploy. Already-deployed instances were rolled
    /// back before this was returned.
    #[error("deployment of instance `{address}` failed")]
    Instance {
        /// Address of the instance whose deployment failed.
        address: Address,
        /// Error reported by the deployment mechanism.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Rollback after a partial failure could not undeploy every instance.
    #[error("rollback of network `{network}` left {} instance(s) deployed", .stranded.len())]
    RollbackIncomplete {
        /// Network whose rollback was incomplete.
        network: String,
        /// Instances still running after the rollback attempt.
        stranded: Vec<Address>,
        /// The deployment failure that triggered the rollback.
        #[source]
        source: Box<DeploymentError>,
    },
    /// Undeploy left instances running.
    #[error("undeploy of network `{network}` left {} instance(s) deployed", .stranded.len())]
    UndeployIncomplete {
        /// Network whose undeploy was incomplete.
        network: String,
        /// Instances still running after the undeploy attempt.
        stranded: Vec<Address>,
    },
    /// The deployed-network registry could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Raised by data store handles.
///
/// Backend failures are delivered through the same asynchronous result channel
/// as success; a store failure never crashes the calling instance.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Propagated verbatim from the backing store.
    #[error("store backend error: {0}")]
    Backend(String),
    /// No backend constructor is registered for the requested kind.
    #[error("no data store backend registered for kind `{0}`")]
    UnknownBackend(StoreKind),
    /// A stored value could not be serialized or deserialized.
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}
