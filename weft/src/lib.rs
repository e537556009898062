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

//! # Weft
//!
//! Weft is a reliable dataflow runtime built on Tokio: you describe a network
//! of components connected by typed, named streams, and the runtime deploys
//! component instances, routes messages along the declared connections, and
//! guarantees that every message is acknowledged or explicitly failed within
//! a bounded time.
//!
//! ## Key Concepts
//!
//! - **Networks (`Network`)**: Declarative graphs of components and
//!   connections, resolved into an addressable [`NetworkContext`] at deploy
//!   time.
//! - **Delivery tracking (`DeliveryTracker`)**: A per-connection state
//!   machine tracking every emitted message from emission to
//!   acknowledgment, failure, or timeout.
//! - **Feeders (`Feeder`)**: Backpressure-aware production loops that
//!   throttle a message source against downstream capacity.
//! - **Data stores (`DataStore`)**: Pluggable cluster-wide coordination
//!   primitives (maps, lists, sets, queues, locks, id generators).
//! - **Cluster management (`ClusterManager`)**: Deploys and undeploys
//!   resolved networks through an external deployment mechanism, with
//!   best-effort rollback on partial failure.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use weft::prelude::*;
//!
//! let network = Network::new("orders")
//!     .add_component(ComponentDef::new("ingest", "ingest::main").with_output("out", "order"))
//!     .add_component(ComponentDef::new("sink", "sink::main").with_instances(2).with_input("in", "order"))
//!     .connect(ConnectionDef::between("ingest", "out", "sink", "in", SelectionPolicy::RoundRobin));
//!
//! let context = resolve(&network)?;
//! ```
//!
//! [`NetworkContext`]: prelude::NetworkContext

/// Prelude module for convenient imports.
///
/// Re-exports the public surface of `weft-core`.
pub mod prelude {
    pub use weft_core::prelude::*;
}
