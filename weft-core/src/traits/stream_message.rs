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

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Contract for payload types carried on Weft streams.
///
/// The type tag must be stable across builds and nodes: it travels in the wire
/// envelope and selects the matching deserialization strategy on the receiving
/// side, so no shared global type registry is required.
pub trait StreamMessage: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Stable wire identifier for this message type.
    const TYPE_TAG: &'static str;
}
