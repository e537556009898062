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

use crate::network::{ComponentDef, ConnectionDef};

/// Declarative network configuration.
///
/// A network defines a collection of components that can be connected
/// together in a meaningful way. It is pure data: building one performs no
/// validation beyond what the fluent methods enforce; validation happens at
/// [`resolve`](crate::context::resolve) time.
///
/// The network's name should be unique within a given cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    name: String,
    #[serde(default)]
    components: Vec<ComponentDef>,
    #[serde(default)]
    connections: Vec<ConnectionDef>,
}

impl Network {
    /// Creates an empty network with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Network {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns the network name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a component to the network.
    pub fn add_component(mut self, component: ComponentDef) -> Self {
        self.components.push(component);
        self
    }

    /// Removes a component and every connection touching it.
    pub fn remove_component(mut self, name: &str) -> Self {
        self.components.retain(|component| component.name() != name);
        self.connections.retain(|connection| {
            connection.source().component != name && connection.target().component != name
        });
        self
    }

    /// Returns a boolean indicating whether the network has a component.
    pub fn has_component(&self, name: &str) -> bool {
        self.components.iter().any(|component| component.name() == name)
    }

    /// Gets a component by name.
    pub fn component(&self, name: &str) -> Option<&ComponentDef> {
        self.components.iter().find(|component| component.name() == name)
    }

    /// Returns the declared components.
    pub fn components(&self) -> &[ComponentDef] {
        &self.components
    }

    /// Creates a connection between two components.
    pub fn connect(mut self, connection: ConnectionDef) -> Self {
        self.connections.push(connection);
        self
    }

    /// Destroys a connection between two components.
    pub fn disconnect(mut self, connection: &ConnectionDef) -> Self {
        self.connections.retain(|existing| existing != connection);
        self
    }

    /// Returns the declared connections.
    pub fn connections(&self) -> &[ConnectionDef] {
        &self.connections
    }
}
