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

use crate::context::{Address, ComponentContext, ConnectionContext, InstanceContext};

/// Runtime-resolved snapshot of a network: concrete instance addresses and
/// instance-level connection bindings for every component.
///
/// Created at deploy time, immutable thereafter, discarded at undeploy. The
/// context serializes to a portable JSON form and reconstructs with full
/// fidelity, because every participating cluster node rebuilds the same
/// context independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkContext {
    name: String,
    components: BTreeMap<String, ComponentContext>,
}

impl NetworkContext {
    pub(crate) fn new(name: String, components: BTreeMap<String, ComponentContext>) -> Self {
        NetworkContext { name, components }
    }

    /// Returns the network name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets a component context by name.
    pub fn component(&self, name: &str) -> Option<&ComponentContext> {
        self.components.get(name)
    }

    /// Returns every component context, ordered by component name.
    pub fn components(&self) -> impl Iterator<Item = &ComponentContext> + '_ {
        self.components.values()
    }

    /// Returns the number of components in the network.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Returns every instance context, grouped by component.
    pub fn instances(&self) -> impl Iterator<Item = &InstanceContext> + '_ {
        self.components.values().flat_map(|component| component.instances().iter())
    }

    /// Gets an instance context by address.
    pub fn instance(&self, address: &Address) -> Option<&InstanceContext> {
        self.instances().find(|instance| instance.address() == address)
    }

    /// Returns every resolved connection context in the network.
    pub fn connections(&self) -> impl Iterator<Item = &ConnectionContext> + '_ {
        self.components.values().flat_map(|component| component.connections())
    }

    /// Gets a connection context by id.
    pub fn connection(&self, id: &str) -> Option<&ConnectionContext> {
        self.connections().find(|connection| connection.id() == id)
    }

    /// Returns the output connections originating at one instance address.
    pub fn outputs_for(&self, address: &Address) -> Vec<&ConnectionContext> {
        self.connections().filter(|connection| connection.source() == address).collect()
    }

    /// Returns the input connections targeting one instance address.
    pub fn inputs_for(&self, address: &Address) -> Vec<&ConnectionContext> {
        self.connections()
            .filter(|connection| connection.targets().contains(address))
            .collect()
    }

    /// Serializes the context to its portable wire form.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Reconstructs a context from its portable wire form.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}
