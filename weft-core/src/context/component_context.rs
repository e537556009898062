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

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::{ConnectionContext, InstanceContext};

/// Resolved view of one component inside a network context: its instances
/// and its output connections, keyed by target component name.
///
/// The parent network is a non-owning, name-based back-reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentContext {
    name: String,
    main: String,
    #[serde(default)]
    config: Value,
    network: String,
    instances: Vec<InstanceContext>,
    #[serde(default)]
    connections: BTreeMap<String, Vec<ConnectionContext>>,
}

impl ComponentContext {
    pub(crate) fn new(
        name: String,
        main: String,
        config: Value,
        network: String,
        instances: Vec<InstanceContext>,
    ) -> Self {
        ComponentContext {
            name,
            main,
            config,
            network,
            instances,
            connections: BTreeMap::new(),
        }
    }

    pub(crate) fn add_connections(&mut self, target: String, mut contexts: Vec<ConnectionContext>) {
        self.connections.entry(target).or_default().append(&mut contexts);
    }

    /// Returns the component name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the implementation reference.
    pub fn main(&self) -> &str {
        &self.main
    }

    /// Returns the per-instance configuration value.
    pub fn config(&self) -> &Value {
        &self.config
    }

    /// Returns the owning network's name.
    pub fn network_name(&self) -> &str {
        &self.network
    }

    /// Returns the resolved instances of this component.
    pub fn instances(&self) -> &[InstanceContext] {
        &self.instances
    }

    /// Returns every output connection of this component.
    pub fn connections(&self) -> impl Iterator<Item = &ConnectionContext> + '_ {
        self.connections.values().flatten()
    }

    /// Returns this component's output connections toward one target component.
    pub fn connections_to(&self, target: &str) -> &[ConnectionContext] {
        self.connections.get(target).map(Vec::as_slice).unwrap_or(&[])
    }
}
