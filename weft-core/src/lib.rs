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

#![forbid(unsafe_code)]
//! Weft Core Library
//!
//! This library provides the core functionality for the Weft dataflow
//! framework: declarative networks of components connected by typed streams,
//! resolved into addressable instance graphs, with per-connection reliable
//! delivery tracking, backpressure-aware feeders, and pluggable cluster
//! coordination primitives.

/// Common utilities, errors, and configuration used throughout the Weft framework.
pub(crate) mod common;

pub(crate) mod cluster;
pub(crate) mod context;
pub(crate) mod delivery;
pub(crate) mod feeder;
pub(crate) mod io;
pub(crate) mod message;
pub(crate) mod network;
pub(crate) mod store;
/// Trait definitions used in the Weft framework.
pub(crate) mod traits;
pub(crate) mod transport;

/// Prelude module for convenient imports.
///
/// This module re-exports the public surface of `weft-core`: the topology and
/// context model, delivery tracking, feeders, data store abstraction, cluster
/// management, and the boundary traits they plug into.
pub mod prelude {
    pub use async_trait;

    pub use crate::cluster::{ClusterManager, DeploymentMechanism, LocalDeployment};
    pub use crate::common::{
        AckHandler, CodecError, DeliveryError, DeploymentError, FailHandler, ResolutionError,
        StoreError, TransportError, WeftConfig, CONFIG,
    };
    pub use crate::context::{
        resolve, Address, ComponentContext, ConnectionContext, InstanceContext, NetworkContext,
    };
    pub use crate::delivery::{DeliveryTracker, PendingDelivery};
    pub use crate::feeder::{Feeder, FeederEmitter, FeederHandle};
    pub use crate::io::{IncomingMessage, InstanceHandle, InstanceIo, IoOptions, OutputPort};
    pub use crate::message::{ControlMessage, Envelope, MessageId, Payload, SerializerCache, CODEC};
    pub use crate::network::{
        ComponentDef, ConnectionDef, Endpoint, Network, PortDef, SelectionPolicy,
    };
    pub use crate::store::{
        data_store, register_backend, AsyncIdGenerator, AsyncList, AsyncLock, AsyncMap,
        AsyncQueue, AsyncSet, BackendFactory, DataStore, SharedDataStore, StoreKind, StoreResult,
    };
    pub use crate::traits::{HookRegistry, InputHook, StreamMessage};
    pub use crate::transport::{Inbound, LocalTransport, Transport};
}
