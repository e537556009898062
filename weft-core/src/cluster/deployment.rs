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

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use crate::context::Address;

/// Boundary trait for the mechanism that physically starts and stops
/// component instances.
///
/// The core does not know how deployment is carried out; it only requires
/// that each call reports success or failure.
#[async_trait]
pub trait DeploymentMechanism: Send + Sync {
    /// Starts the implementation `main` as the instance at `address`, with
    /// the instance's configuration value.
    async fn deploy(&self, address: &Address, main: &str, config: &Value) -> anyhow::Result<()>;

    /// Stops the instance at `address`.
    async fn undeploy(&self, address: &Address) -> anyhow::Result<()>;
}

/// Single-node deployment: records instances in a process-local registry.
///
/// Useful for development and tests, where "deploying" an instance means
/// nothing more than making it visible to the rest of the process.
#[derive(Debug, Default)]
pub struct LocalDeployment {
    instances: DashMap<Address, (String, Value)>,
}

impl LocalDeployment {
    /// Creates an empty local deployment registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when an instance is recorded at `address`.
    pub fn is_deployed(&self, address: &Address) -> bool {
        self.instances.contains_key(address)
    }

    /// Number of deployed instances.
    pub fn deployed_count(&self) -> usize {
        self.instances.len()
    }
}

#[async_trait]
impl DeploymentMechanism for LocalDeployment {
    async fn deploy(&self, address: &Address, main: &str, config: &Value) -> anyhow::Result<()> {
        debug!(%address, main, "deploying instance locally");
        self.instances.insert(address.clone(), (main.to_string(), config.clone()));
        Ok(())
    }

    async fn undeploy(&self, address: &Address) -> anyhow::Result<()> {
        debug!(%address, "undeploying local instance");
        self.instances.remove(address);
        Ok(())
    }
}
