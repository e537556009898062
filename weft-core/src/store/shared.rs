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

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use lazy_static::lazy_static;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::trace;

use crate::store::{
    AsyncIdGenerator, AsyncList, AsyncLock, AsyncMap, AsyncQueue, AsyncSet, DataStore, StoreResult,
};

// Process-wide state shared by every handle with the same name, regardless of
// which store instance produced the handle.
lazy_static! {
    static ref MAPS: DashMap<String, Arc<DashMap<String, Value>>> = DashMap::new();
    static ref LISTS: DashMap<String, Arc<Mutex<Vec<Value>>>> = DashMap::new();
    static ref SETS: DashMap<String, Arc<Mutex<Vec<Value>>>> = DashMap::new();
    static ref QUEUES: DashMap<String, Arc<Mutex<VecDeque<Value>>>> = DashMap::new();
    static ref LOCKS: DashMap<String, Arc<LockState>> = DashMap::new();
    static ref COUNTERS: DashMap<String, Arc<AtomicU64>> = DashMap::new();
}

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

pub(crate) fn in_process() -> Arc<dyn DataStore> {
    Arc::new(SharedDataStore)
}

/// In-process data store backed by process-wide shared state.
///
/// Suitable for single-node deployments and tests; nothing survives a
/// process restart.
#[derive(Debug, Default, Clone, Copy)]
pub struct SharedDataStore;

impl DataStore for SharedDataStore {
    fn map(&self, name: &str) -> Arc<dyn AsyncMap> {
        let entries = MAPS.entry(name.to_string()).or_default().clone();
        Arc::new(SharedMap { entries })
    }

    fn list(&self, name: &str) -> Arc<dyn AsyncList> {
        let items = LISTS.entry(name.to_string()).or_default().clone();
        Arc::new(SharedList { items })
    }

    fn set(&self, name: &str) -> Arc<dyn AsyncSet> {
        let items = SETS.entry(name.to_string()).or_default().clone();
        Arc::new(SharedSet { items })
    }

    fn queue(&self, name: &str) -> Arc<dyn AsyncQueue> {
        let items = QUEUES.entry(name.to_string()).or_default().clone();
        Arc::new(SharedQueue { items })
    }

    fn lock(&self, name: &str) -> Arc<dyn AsyncLock> {
        let state = LOCKS.entry(name.to_string()).or_default().clone();
        Arc::new(SharedLock {
            state,
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
        })
    }

    fn id_generator(&self, name: &str) -> Arc<dyn AsyncIdGenerator> {
        let counter = COUNTERS.entry(name.to_string()).or_default().clone();
        Arc::new(SharedIdGenerator { counter })
    }
}

#[derive(Debug)]
struct SharedMap {
    entries: Arc<DashMap<String, Value>>,
}

#[async_trait]
impl AsyncMap for SharedMap {
    async fn put(&self, key: String, value: Value) -> StoreResult<Option<Value>> {
        Ok(self.entries.insert(key, value))
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn remove(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.entries.remove(key).map(|(_, value)| value))
    }

    async fn contains(&self, key: &str) -> StoreResult<bool> {
        Ok(self.entries.contains_key(key))
    }

    async fn len(&self) -> StoreResult<usize> {
        Ok(self.entries.len())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.entries.clear();
        Ok(())
    }
}

#[derive(Debug)]
struct SharedList {
    items: Arc<Mutex<Vec<Value>>>,
}

#[async_trait]
impl AsyncList for SharedList {
    async fn push(&self, value: Value) -> StoreResult<()> {
        self.items.lock().push(value);
        Ok(())
    }

    async fn get(&self, index: usize) -> StoreResult<Option<Value>> {
        Ok(self.items.lock().get(index).cloned())
    }

    async fn remove(&self, index: usize) -> StoreResult<Option<Value>> {
        let mut items = self.items.lock();
        if index < items.len() {
            Ok(Some(items.remove(index)))
        } else {
            Ok(None)
        }
    }

    async fn len(&self) -> StoreResult<usize> {
        Ok(self.items.lock().len())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.items.lock().clear();
        Ok(())
    }
}

#[derive(Debug)]
struct SharedSet {
    items: Arc<Mutex<Vec<Value>>>,
}

#[async_trait]
impl AsyncSet for SharedSet {
    async fn insert(&self, value: Value) -> StoreResult<bool> {
        let mut items = self.items.lock();
        if items.contains(&value) {
            Ok(false)
        } else {
            items.push(value);
            Ok(true)
        }
    }

    async fn remove(&self, value: &Value) -> StoreResult<bool> {
        let mut items = self.items.lock();
        match items.iter().position(|existing| existing == value) {
            Some(index) => {
                items.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn contains(&self, value: &Value) -> StoreResult<bool> {
        Ok(self.items.lock().contains(value))
    }

    async fn len(&self) -> StoreResult<usize> {
        Ok(self.items.lock().len())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.items.lock().clear();
        Ok(())
    }
}

#[derive(Debug)]
struct SharedQueue {
    items: Arc<Mutex<VecDeque<Value>>>,
}

#[async_trait]
impl AsyncQueue for SharedQueue {
    async fn push(&self, value: Value) -> StoreResult<()> {
        self.items.lock().push_back(value);
        Ok(())
    }

    async fn pop(&self) -> StoreResult<Option<Value>> {
        Ok(self.items.lock().pop_front())
    }

    async fn peek(&self) -> StoreResult<Option<Value>> {
        Ok(self.items.lock().front().cloned())
    }

    async fn len(&self) -> StoreResult<usize> {
        Ok(self.items.lock().len())
    }
}

#[derive(Debug, Default)]
struct LockState {
    holder: Mutex<Option<Holder>>,
    released: Notify,
}

#[derive(Debug, Clone, Copy)]
struct Holder {
    owner: u64,
    expires_at: Instant,
}

#[derive(Debug)]
struct SharedLock {
    state: Arc<LockState>,
    owner: u64,
}

#[async_trait]
impl AsyncLock for SharedLock {
    async fn acquire(&self, timeout: Duration, lease: Duration) -> StoreResult<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            let wait_until = {
                let mut holder = self.state.holder.lock();
                let now = Instant::now();
                match *holder {
                    Some(current) if current.expires_at > now => current.expires_at.min(deadline),
                    _ => {
                        // free, or the previous holder's lease ran out
                        *holder = Some(Holder {
                            owner: self.owner,
                            expires_at: now + lease,
                        });
                        trace!(owner = self.owner, "lock acquired");
                        return Ok(true);
                    }
                }
            };
            if Instant::now() >= deadline {
                return Ok(false);
            }
            // woken by a release, or by the holder's lease running out
            let _ = tokio::time::timeout_at(wait_until, self.state.released.notified()).await;
        }
    }

    async fn release(&self) -> StoreResult<()> {
        let mut holder = self.state.holder.lock();
        if matches!(*holder, Some(current) if current.owner == self.owner) {
            *holder = None;
            self.state.released.notify_waiters();
            trace!(owner = self.owner, "lock released");
        }
        Ok(())
    }
}

#[derive(Debug)]
struct SharedIdGenerator {
    counter: Arc<AtomicU64>,
}

#[async_trait]
impl AsyncIdGenerator for SharedIdGenerator {
    async fn next_id(&self) -> StoreResult<u64> {
        Ok(self.counter.fetch_add(1, Ordering::Relaxed) + 1)
    }
}
