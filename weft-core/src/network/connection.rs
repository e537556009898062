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

use derive_new::new;
use serde::{Deserialize, Serialize};

/// Governs how messages from multiple source instances are distributed
/// across multiple target instances.
///
/// The policy is an explicit, required field of every connection; there is no
/// implicit default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionPolicy {
    /// Every message goes to every target instance.
    FanOut,
    /// Messages rotate across target instances, one per message.
    RoundRobin,
    /// A stable hash of the message key picks the target instance.
    KeyBased,
}

/// One end of a connection: a component and one of its ports.
#[derive(new, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Component name the endpoint references.
    pub component: String,
    /// Port name the endpoint references.
    pub port: String,
}

/// A directed edge from one (component, output port) pair to one
/// (component, input port) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDef {
    source: Endpoint,
    target: Endpoint,
    policy: SelectionPolicy,
    #[serde(default)]
    hooks: Vec<String>,
}

impl ConnectionDef {
    /// Creates a connection between two declared ports.
    pub fn between(
        source_component: impl Into<String>,
        source_port: impl Into<String>,
        target_component: impl Into<String>,
        target_port: impl Into<String>,
        policy: SelectionPolicy,
    ) -> Self {
        ConnectionDef {
            source: Endpoint::new(source_component.into(), source_port.into()),
            target: Endpoint::new(target_component.into(), target_port.into()),
            policy,
            hooks: Vec::new(),
        }
    }

    /// References a named hook to invoke on message receipt. The hook
    /// implementation is resolved from a [`HookRegistry`](crate::traits::HookRegistry)
    /// when the receiving instance is bound.
    pub fn with_hook(mut self, name: impl Into<String>) -> Self {
        self.hooks.push(name.into());
        self
    }

    /// Returns the source endpoint.
    pub fn source(&self) -> &Endpoint {
        &self.source
    }

    /// Returns the target endpoint.
    pub fn target(&self) -> &Endpoint {
        &self.target
    }

    /// Returns the selection policy.
    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Returns the referenced hook names.
    pub fn hooks(&self) -> &[String] {
        &self.hooks
    }
}
