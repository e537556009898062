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

//! Defines common type aliases for handlers and futures used within `weft-core`.
//!
//! This module centralizes the callback signatures shared by the delivery
//! tracker, the feeder loop, and instance input dispatch.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::common::DeliveryError;
use crate::feeder::FeederEmitter;
use crate::io::IncomingMessage;
use crate::message::MessageId;

/// Pinned, boxed, dynamically dispatched future with `Output = ()`.
/// This is the erased return type for asynchronous handlers.
pub type FutureBox = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Callback invoked when a tracked message is acknowledged.
pub type AckHandler = Arc<dyn Fn(&MessageId) + Send + Sync>;

/// Callback invoked when a tracked message fails or times out, with the
/// terminal cause.
pub type FailHandler = Arc<dyn Fn(&MessageId, &DeliveryError) + Send + Sync>;

/// Handler invoked for each data message arriving on an input port.
pub type InputHandler = Arc<dyn Fn(IncomingMessage) -> FutureBox + Send + Sync>;

/// Production callback driven by the feeder loop.
pub type FeedHandler = Arc<dyn Fn(FeederEmitter) -> FutureBox + Send + Sync>;
