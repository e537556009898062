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

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use weft::prelude::*;

use crate::setup::{initialize_tracing, TextRecord};

mod setup;

const CAPACITY: usize = 3;
const FEED_DELAY: Duration = Duration::from_millis(10);

fn single_link(name: &str) -> Network {
    Network::new(name)
        .add_component(ComponentDef::new("source", "source::main").with_output("out", "test.text-record"))
        .add_component(ComponentDef::new("drain", "drain::main").with_input("in", "test.text-record"))
        .connect(ConnectionDef::between("source", "out", "drain", "in", SelectionPolicy::RoundRobin))
}

/// With a production callback emitting exactly one message per invocation and
/// a downstream capacity of C, the feeder issues at most C outstanding
/// productions before suspending, and resumes within one feed-delay interval
/// after capacity frees.
#[tokio::test(start_paused = true)]
async fn test_feeder_respects_downstream_capacity() -> anyhow::Result<()> {
    initialize_tracing();
    let network = single_link("backpressure");
    let context = resolve(&network)?;
    let transport = LocalTransport::new();

    // drain never acks; its inbox just absorbs envelopes
    let drain = context.component("drain").expect("drain resolved").instances()[0]
        .address()
        .clone();
    let _sink = transport.register(&drain);

    let source = context.component("source").expect("source resolved").instances()[0]
        .address()
        .clone();
    let io = InstanceIo::bind_with(
        &context,
        &source,
        transport.clone(),
        IoOptions {
            ack_timeout: Duration::from_secs(3_600),
            max_pending: CAPACITY,
        },
        &HookRegistry::new(),
    );
    let instance = io.start();
    let port = instance.output("out").expect("source has an out port");

    let produced = Arc::new(AtomicUsize::new(0));
    let emitted = Arc::new(Mutex::new(Vec::new()));
    let feeder = {
        let produced = produced.clone();
        let emitted = emitted.clone();
        Feeder::new(port.clone())
            .with_feed_delay(FEED_DELAY)
            .on_feed(move |emitter| {
                let produced = produced.clone();
                let emitted = emitted.clone();
                async move {
                    produced.fetch_add(1, Ordering::SeqCst);
                    if let Ok(ids) = emitter.emit(&TextRecord::new("produced")).await {
                        emitted.lock().unwrap().extend(ids);
                    }
                }
            })
    };
    let handle = feeder.start();

    // let several ticks elapse; production must stop at the capacity
    tokio::time::sleep(FEED_DELAY * 10).await;
    assert_eq!(produced.load(Ordering::SeqCst), CAPACITY);
    assert_eq!(port.pending_count(), CAPACITY);

    // still suspended while the queue stays full
    tokio::time::sleep(FEED_DELAY * 10).await;
    assert_eq!(produced.load(Ordering::SeqCst), CAPACITY);

    // free the capacity; the loop resumes within one feed-delay interval
    let tracker = &port.connections()[0];
    for message_id in emitted.lock().unwrap().drain(..) {
        tracker.ack(&message_id);
    }
    assert_eq!(port.pending_count(), 0);

    tokio::time::sleep(FEED_DELAY * 2).await;
    assert!(produced.load(Ordering::SeqCst) > CAPACITY);

    handle.stop().await;
    instance.stop().await?;
    Ok(())
}

/// A pass that produces nothing suspends the loop instead of spinning: the
/// callback runs once per tick, not continuously.
#[tokio::test(start_paused = true)]
async fn test_idle_feeder_does_not_spin() -> anyhow::Result<()> {
    initialize_tracing();
    let network = single_link("idle");
    let context = resolve(&network)?;
    let transport = LocalTransport::new();

    let source = context.component("source").expect("source resolved").instances()[0]
        .address()
        .clone();
    let instance = InstanceIo::bind(&context, &source, transport.clone()).start();
    let port = instance.output("out").expect("source has an out port");

    let invoked = Arc::new(AtomicUsize::new(0));
    let handle = {
        let invoked = invoked.clone();
        Feeder::new(port)
            .with_feed_delay(FEED_DELAY)
            .on_feed(move |_emitter| {
                let invoked = invoked.clone();
                async move {
                    // produce nothing
                    invoked.fetch_add(1, Ordering::SeqCst);
                }
            })
            .start()
    };

    tokio::time::sleep(FEED_DELAY * 10).await;
    let after_ten_ticks = invoked.load(Ordering::SeqCst);
    // one invocation per tick plus the initial pass, never a busy loop
    assert!(after_ten_ticks >= 10);
    assert!(after_ten_ticks <= 12);

    handle.stop().await;
    instance.stop().await?;
    Ok(())
}

/// Manual emissions bypass the production callback but flow through the same
/// delivery tracking, and the feeder's ack handler observes their outcomes
/// uniformly.
#[tokio::test]
async fn test_manual_emit_shares_ack_path() -> anyhow::Result<()> {
    initialize_tracing();
    let network = single_link("manual");
    let context = resolve(&network)?;
    let transport = LocalTransport::new();

    let drain = context.component("drain").expect("drain resolved").instances()[0]
        .address()
        .clone();
    let mut drain_io = InstanceIo::bind(&context, &drain, transport.clone());
    drain_io.on_input("in", move |message: IncomingMessage| async move {
        let _ = message.ack().await;
    });
    let drain_instance = drain_io.start();

    let source = context.component("source").expect("source resolved").instances()[0]
        .address()
        .clone();
    let instance = InstanceIo::bind(&context, &source, transport.clone()).start();
    let port = instance.output("out").expect("source has an out port");

    let acked = Arc::new(AtomicUsize::new(0));
    let handle = {
        let acked = acked.clone();
        Feeder::new(port)
            .on_ack(move |_message_id| {
                acked.fetch_add(1, Ordering::SeqCst);
            })
            .start()
    };

    handle.emit(&TextRecord::new("driven by hand")).await?;

    tokio::time::timeout(Duration::from_secs(5), async {
        while acked.load(Ordering::SeqCst) < 1 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("manual emission acked");

    assert_eq!(handle.pending_count(), 0);

    handle.stop().await;
    instance.stop().await?;
    drain_instance.stop().await?;
    Ok(())
}
