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

use serde::{Deserialize, Serialize};

use crate::context::{Address, ComponentContext, ConnectionContext, NetworkContext};

/// One running instance's address and parent reference.
///
/// The parent is a non-owning, name-based back-reference; resolved
/// input/output connection views are lookups into the owning
/// [`NetworkContext`], so reconstructing contexts from serialized form never
/// creates ownership cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceContext {
    address: Address,
    ordinal: u32,
    component: String,
}

impl InstanceContext {
    pub(crate) fn new(address: Address, ordinal: u32, component: String) -> Self {
        InstanceContext {
            address,
            ordinal,
            component,
        }
    }

    /// Returns the instance address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Returns the instance ordinal within its component.
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    /// Returns the parent component name.
    pub fn component_name(&self) -> &str {
        &self.component
    }

    /// Looks up the parent component context in the owning network context.
    pub fn component_context<'a>(&self, network: &'a NetworkContext) -> Option<&'a ComponentContext> {
        network.component(&self.component)
    }

    /// Returns this instance's resolved output connections.
    pub fn outputs<'a>(&self, network: &'a NetworkContext) -> Vec<&'a ConnectionContext> {
        network.outputs_for(&self.address)
    }

    /// Returns this instance's resolved input connections.
    pub fn inputs<'a>(&self, network: &'a NetworkContext) -> Vec<&'a ConnectionContext> {
        network.inputs_for(&self.address)
    }
}
