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

#![allow(dead_code)]

use std::time::Duration;

use serde_json::json;
use weft::prelude::*;

use crate::setup::initialize_tracing;

mod setup;

/// Map handles support the usual key/value operations, and two handles with
/// the same name observe the same data regardless of which store instance
/// produced them.
#[tokio::test]
async fn test_map_semantics_and_name_sharing() -> anyhow::Result<()> {
    initialize_tracing();
    let store = data_store(StoreKind::InProcess)?;

    let map = store.map("store-tests.routing");
    assert_eq!(map.put("k1".to_string(), json!("v1")).await?, None);
    assert_eq!(map.put("k1".to_string(), json!("v2")).await?, Some(json!("v1")));
    assert!(map.contains("k1").await?);
    assert_eq!(map.len().await?, 1);

    let second = data_store(StoreKind::InProcess)?.map("store-tests.routing");
    assert_eq!(second.get("k1").await?, Some(json!("v2")));

    let isolated = store.map("store-tests.routing-other");
    assert_eq!(isolated.get("k1").await?, None);

    assert_eq!(map.remove("k1").await?, Some(json!("v2")));
    assert_eq!(map.len().await?, 0);
    Ok(())
}

/// Lists keep insertion order, sets deduplicate, queues are FIFO.
#[tokio::test]
async fn test_collection_handles() -> anyhow::Result<()> {
    initialize_tracing();
    let store = data_store(StoreKind::InProcess)?;

    let list = store.list("store-tests.list");
    list.push(json!(1)).await?;
    list.push(json!(2)).await?;
    assert_eq!(list.get(0).await?, Some(json!(1)));
    assert_eq!(list.remove(0).await?, Some(json!(1)));
    assert_eq!(list.remove(5).await?, None);
    assert_eq!(list.len().await?, 1);

    let set = store.set("store-tests.set");
    assert!(set.insert(json!("member")).await?);
    assert!(!set.insert(json!("member")).await?);
    assert!(set.contains(&json!("member")).await?);
    assert!(set.remove(&json!("member")).await?);
    assert!(!set.remove(&json!("member")).await?);

    let queue = store.queue("store-tests.queue");
    queue.push(json!("first")).await?;
    queue.push(json!("second")).await?;
    assert_eq!(queue.peek().await?, Some(json!("first")));
    assert_eq!(queue.pop().await?, Some(json!("first")));
    assert_eq!(queue.pop().await?, Some(json!("second")));
    assert_eq!(queue.pop().await?, None);
    Ok(())
}

/// Id generators hand out unique, strictly increasing ids per name.
#[tokio::test]
async fn test_id_generator_is_monotonic() -> anyhow::Result<()> {
    initialize_tracing();
    let store = data_store(StoreKind::InProcess)?;
    let ids = store.id_generator("store-tests.ids");

    let mut last = 0;
    for _ in 0..100 {
        let id = ids.next_id().await?;
        assert!(id > last);
        last = id;
    }
    Ok(())
}

/// Scenario: a lock acquired with a 5-unit lease that is never explicitly
/// released becomes acquirable again by a different caller once the lease
/// expires; while the lease is live, a second acquire times out.
#[tokio::test(start_paused = true)]
async fn test_lock_lease_expiry() -> anyhow::Result<()> {
    initialize_tracing();
    let store = data_store(StoreKind::InProcess)?;

    let holder = store.lock("store-tests.lease");
    let contender = store.lock("store-tests.lease");

    assert!(holder.acquire(Duration::from_millis(100), Duration::from_millis(500)).await?);

    // the lease is still live, so the contender's wait times out
    assert!(!contender.acquire(Duration::from_millis(50), Duration::from_millis(500)).await?);

    // never released; after the lease runs out the lock is acquirable again
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(contender.acquire(Duration::from_millis(50), Duration::from_millis(500)).await?);

    Ok(())
}

/// An explicit release wakes a waiting acquirer before its timeout, and
/// releasing a lock the handle does not hold is a no-op.
#[tokio::test(start_paused = true)]
async fn test_lock_release_hands_over() -> anyhow::Result<()> {
    initialize_tracing();
    let store = data_store(StoreKind::InProcess)?;

    let holder = store.lock("store-tests.handover");
    let contender = store.lock("store-tests.handover");

    assert!(holder.acquire(Duration::from_millis(100), Duration::from_secs(60)).await?);

    // releasing from a handle that does not hold the lock changes nothing
    contender.release().await?;
    assert!(!contender.acquire(Duration::from_millis(50), Duration::from_secs(60)).await?);

    let waiter = {
        let contender = contender.clone();
        tokio::spawn(async move {
            contender.acquire(Duration::from_secs(10), Duration::from_secs(60)).await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    holder.release().await?;

    assert!(waiter.await??);
    Ok(())
}

/// Store kinds without a registered backend are reported, not guessed.
#[tokio::test]
async fn test_unregistered_backend_is_an_error() {
    initialize_tracing();
    assert!(matches!(
        data_store(StoreKind::ExternalKv),
        Err(StoreError::UnknownBackend(StoreKind::ExternalKv))
    ));
}
