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

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::context::Address;
use crate::network::SelectionPolicy;

/// Resolved, instance-level binding of a connection: concrete source
/// instance, candidate target instances, and the selection policy applied
/// per message.
///
/// A fan-out connection resolves to one context per (source, target) pair,
/// each carrying exactly one target. Round-robin and key-based connections
/// resolve to one context per source instance carrying the full candidate
/// set; the target is chosen at send time, not at resolve time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionContext {
    id: String,
    source: Address,
    source_component: String,
    source_port: String,
    target_component: String,
    target_port: String,
    targets: Vec<Address>,
    policy: SelectionPolicy,
    #[serde(default)]
    hooks: Vec<String>,
}

impl ConnectionContext {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: String,
        source: Address,
        source_component: String,
        source_port: String,
        target_component: String,
        target_port: String,
        targets: Vec<Address>,
        policy: SelectionPolicy,
        hooks: Vec<String>,
    ) -> Self {
        ConnectionContext {
            id,
            source,
            source_component,
            source_port,
            target_component,
            target_port,
            targets,
            policy,
            hooks,
        }
    }

    /// Returns the deterministic connection id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the source instance address.
    pub fn source(&self) -> &Address {
        &self.source
    }

    /// Returns the source component name.
    pub fn source_component(&self) -> &str {
        &self.source_component
    }

    /// Returns the source output port name.
    pub fn source_port(&self) -> &str {
        &self.source_port
    }

    /// Returns the target component name.
    pub fn target_component(&self) -> &str {
        &self.target_component
    }

    /// Returns the target input port name.
    pub fn target_port(&self) -> &str {
        &self.target_port
    }

    /// Returns the candidate target addresses.
    pub fn targets(&self) -> &[Address] {
        &self.targets
    }

    /// Returns the selection policy.
    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Returns the referenced hook names.
    pub fn hooks(&self) -> &[String] {
        &self.hooks
    }

    /// Selects the target for the given emission sequence.
    ///
    /// Fan-out contexts carry exactly one target; rotating policies index the
    /// candidate set by the cursor.
    pub fn select_target(&self, cursor: u64) -> &Address {
        match self.policy {
            SelectionPolicy::FanOut => &self.targets[0],
            _ => &self.targets[(cursor as usize) % self.targets.len()],
        }
    }

    /// Selects the target for a keyed message.
    ///
    /// Uses a hasher with fixed keys so the same key maps to the same target
    /// on every node.
    pub fn target_for_key(&self, key: &str) -> &Address {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.targets[(hasher.finish() as usize) % self.targets.len()]
    }
}
