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

//! Pluggable cluster-wide coordination primitives.
//!
//! A [`DataStore`] hands out named handles to maps, lists, sets, queues,
//! locks, and monotonic id generators. Every operation is asynchronous and
//! completes with a result-or-error; nothing blocks the caller's thread of
//! control. Backends are selected by [`StoreKind`] through a registry and
//! must be behaviorally substitutable: identical handle semantics regardless
//! of backend.

pub use shared::SharedDataStore;

mod shared;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::StoreError;

/// Result type for data store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Recognized data store backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreKind {
    /// Single-node shared state; nothing survives a process restart.
    InProcess,
    /// Cluster-replicated map; survives individual node loss.
    ReplicatedMap,
    /// External key/value service; persistent, one network round trip per
    /// operation.
    ExternalKv,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            StoreKind::InProcess => "in-process",
            StoreKind::ReplicatedMap => "replicated-map",
            StoreKind::ExternalKv => "external-kv",
        };
        write!(f, "{kind}")
    }
}

/// Asynchronous map handle backed by the data store.
#[async_trait]
pub trait AsyncMap: Send + Sync {
    /// Stores a value, returning the previous value for the key.
    async fn put(&self, key: String, value: Value) -> StoreResult<Option<Value>>;
    /// Loads the value for a key.
    async fn get(&self, key: &str) -> StoreResult<Option<Value>>;
    /// Removes a key, returning its value.
    async fn remove(&self, key: &str) -> StoreResult<Option<Value>>;
    /// True when the key is present.
    async fn contains(&self, key: &str) -> StoreResult<bool>;
    /// Number of entries.
    async fn len(&self) -> StoreResult<usize>;
    /// Removes every entry.
    async fn clear(&self) -> StoreResult<()>;
}

/// Asynchronous list handle backed by the data store.
#[async_trait]
pub trait AsyncList: Send + Sync {
    /// Appends a value.
    async fn push(&self, value: Value) -> StoreResult<()>;
    /// Loads the value at an index.
    async fn get(&self, index: usize) -> StoreResult<Option<Value>>;
    /// Removes and returns the value at an index.
    async fn remove(&self, index: usize) -> StoreResult<Option<Value>>;
    /// Number of elements.
    async fn len(&self) -> StoreResult<usize>;
    /// Removes every element.
    async fn clear(&self) -> StoreResult<()>;
}

/// Asynchronous set handle backed by the data store.
#[async_trait]
pub trait AsyncSet: Send + Sync {
    /// Adds a value; returns false when it was already present.
    async fn insert(&self, value: Value) -> StoreResult<bool>;
    /// Removes a value; returns false when it was absent.
    async fn remove(&self, value: &Value) -> StoreResult<bool>;
    /// True when the value is present.
    async fn contains(&self, value: &Value) -> StoreResult<bool>;
    /// Number of elements.
    async fn len(&self) -> StoreResult<usize>;
    /// Removes every element.
    async fn clear(&self) -> StoreResult<()>;
}

/// Asynchronous queue handle backed by the data store.
#[async_trait]
pub trait AsyncQueue: Send + Sync {
    /// Enqueues a value at the tail.
    async fn push(&self, value: Value) -> StoreResult<()>;
    /// Dequeues the head value.
    async fn pop(&self) -> StoreResult<Option<Value>>;
    /// Reads the head value without removing it.
    async fn peek(&self) -> StoreResult<Option<Value>>;
    /// Number of queued elements.
    async fn len(&self) -> StoreResult<usize>;
}

/// Asynchronous lock handle backed by the data store.
///
/// A crashed holder must not permanently strand the lock: the lease duration
/// bounds how long an acquisition outlives its holder, and an expired lease
/// makes the lock acquirable by another caller without an explicit release.
#[async_trait]
pub trait AsyncLock: Send + Sync {
    /// Tries to take the lock, waiting up to `timeout`; on success the lock
    /// is held for at most `lease`. Returns false when the wait timed out.
    async fn acquire(&self, timeout: Duration, lease: Duration) -> StoreResult<bool>;
    /// Releases the lock if this handle holds it; releasing a lock this
    /// handle does not hold is a no-op.
    async fn release(&self) -> StoreResult<()>;
}

/// Asynchronous monotonic id generator backed by the data store.
#[async_trait]
pub trait AsyncIdGenerator: Send + Sync {
    /// Returns the next id; ids are unique and strictly increasing per name.
    async fn next_id(&self) -> StoreResult<u64>;
}

/// Capability interface for cluster-wide coordination primitives.
///
/// Handles are named and lazily created; their lifetime matches the store's,
/// not any single component instance's.
pub trait DataStore: Send + Sync {
    /// Returns the named map handle.
    fn map(&self, name: &str) -> Arc<dyn AsyncMap>;
    /// Returns the named list handle.
    fn list(&self, name: &str) -> Arc<dyn AsyncList>;
    /// Returns the named set handle.
    fn set(&self, name: &str) -> Arc<dyn AsyncSet>;
    /// Returns the named queue handle.
    fn queue(&self, name: &str) -> Arc<dyn AsyncQueue>;
    /// Returns the named lock handle.
    fn lock(&self, name: &str) -> Arc<dyn AsyncLock>;
    /// Returns the named id generator handle.
    fn id_generator(&self, name: &str) -> Arc<dyn AsyncIdGenerator>;
}

/// Constructor registered for a store kind.
pub type BackendFactory = fn() -> Arc<dyn DataStore>;

lazy_static! {
    static ref BACKENDS: DashMap<StoreKind, BackendFactory> = {
        let backends = DashMap::new();
        backends.insert(StoreKind::InProcess, shared::in_process as BackendFactory);
        backends
    };
}

/// Returns a data store of the requested kind.
///
/// `InProcess` is available out of the box; distributed backends are
/// registered by their own crates via [`register_backend`].
pub fn data_store(kind: StoreKind) -> StoreResult<Arc<dyn DataStore>> {
    let factory = *BACKENDS
        .get(&kind)
        .ok_or(StoreError::UnknownBackend(kind))?
        .value();
    Ok(factory())
}

/// Registers (or replaces) the backend constructor for a store kind.
pub fn register_backend(kind: StoreKind, factory: BackendFactory) {
    BACKENDS.insert(kind, factory);
}
