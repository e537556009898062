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
use serde_json::Value;

/// A named, typed attachment point on a component for one stream.
///
/// Direction is carried by which list (`inputs`/`outputs`) declares the port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDef {
    name: String,
    message_type: String,
}

impl PortDef {
    /// Creates a port carrying messages of the given type tag.
    pub fn new(name: impl Into<String>, message_type: impl Into<String>) -> Self {
        PortDef {
            name: name.into(),
            message_type: message_type.into(),
        }
    }

    /// Returns the port name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the type tag of messages this port carries.
    pub fn message_type(&self) -> &str {
        &self.message_type
    }
}

/// A named processing unit: an implementation reference, a parallelism
/// degree, and its declared input/output ports.
///
/// Immutable once the owning network is resolved for deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDef {
    name: String,
    main: String,
    #[serde(default = "default_instances")]
    instances: usize,
    #[serde(default)]
    config: Value,
    #[serde(default)]
    inputs: Vec<PortDef>,
    #[serde(default)]
    outputs: Vec<PortDef>,
}

fn default_instances() -> usize {
    1
}

impl ComponentDef {
    /// Creates a component with a single instance and no ports.
    ///
    /// `main` is the implementation reference handed to the deployment
    /// mechanism; the core does not interpret it.
    pub fn new(name: impl Into<String>, main: impl Into<String>) -> Self {
        ComponentDef {
            name: name.into(),
            main: main.into(),
            instances: 1,
            config: Value::Null,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Sets the parallelism degree. Counts below 1 are clamped to 1: a
    /// declared component always materializes at least one instance.
    pub fn with_instances(mut self, instances: usize) -> Self {
        self.instances = instances.max(1);
        self
    }

    /// Sets the configuration value handed to each deployed instance.
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    /// Declares an input port.
    pub fn with_input(mut self, name: impl Into<String>, message_type: impl Into<String>) -> Self {
        self.inputs.push(PortDef::new(name, message_type));
        self
    }

    /// Declares an output port.
    pub fn with_output(mut self, name: impl Into<String>, message_type: impl Into<String>) -> Self {
        self.outputs.push(PortDef::new(name, message_type));
        self
    }

    /// Returns the component name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the implementation reference.
    pub fn main(&self) -> &str {
        &self.main
    }

    /// Returns the declared instance count.
    pub fn instance_count(&self) -> usize {
        self.instances
    }

    /// Returns the per-instance configuration value.
    pub fn config(&self) -> &Value {
        &self.config
    }

    /// Returns the declared input ports.
    pub fn inputs(&self) -> &[PortDef] {
        &self.inputs
    }

    /// Returns the declared output ports.
    pub fn outputs(&self) -> &[PortDef] {
        &self.outputs
    }

    /// True when the component declares an input port with this name.
    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.iter().any(|port| port.name() == name)
    }

    /// True when the component declares an output port with this name.
    pub fn has_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|port| port.name() == name)
    }
}
