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

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info, instrument};

use crate::cluster::DeploymentMechanism;
use crate::common::{DeploymentError, StoreError, CONFIG};
use crate::context::{resolve, Address, NetworkContext};
use crate::network::Network;
use crate::store::{AsyncMap, DataStore};

/// Orchestrates deployment and undeployment of networks.
///
/// Deploying resolves the network, deploys every instance through the
/// external deployment mechanism, and records the serialized context in a
/// data-store map so any node can later answer an undeploy by name. Success
/// is reported only when every instance deploys; partial failure triggers a
/// best-effort rollback of whatever succeeded.
pub struct ClusterManager {
    deployer: Arc<dyn DeploymentMechanism>,
    deployed: Arc<dyn AsyncMap>,
}

impl ClusterManager {
    /// Creates a manager deploying through `deployer`, with the deployed
    /// network registry held in `store`.
    pub fn new(deployer: Arc<dyn DeploymentMechanism>, store: Arc<dyn DataStore>) -> Self {
        let deployed = store.map(&CONFIG.cluster.deployed_map);
        ClusterManager { deployer, deployed }
    }

    /// Resolves and deploys every instance of `network`.
    ///
    /// On the first instance failure, every already-deployed instance is
    /// undeployed (best effort; stranded instances are logged and carried in
    /// the returned error) and the causing error is reported.
    #[instrument(skip(self, network), fields(network = network.name()))]
    pub async fn deploy_network(&self, network: &Network) -> Result<NetworkContext, DeploymentError> {
        let context = resolve(network)?;
        let mut deployed: Vec<Address> = Vec::new();
        for component in context.components() {
            for instance in component.instances() {
                match self
                    .deployer
                    .deploy(instance.address(), component.main(), component.config())
                    .await
                {
                    Ok(()) => deployed.push(instance.address().clone()),
                    Err(source) => {
                        let cause = DeploymentError::Instance {
                            address: instance.address().clone(),
                            source: source.into(),
                        };
                        return Err(self.roll_back(network.name(), deployed, cause).await);
                    }
                }
            }
        }
        self.deployed
            .put(
                context.name().to_string(),
                serde_json::to_value(&context).map_err(StoreError::from)?,
            )
            .await?;
        info!(instances = deployed.len(), "network deployed");
        Ok(context)
    }

    async fn roll_back(
        &self,
        network: &str,
        deployed: Vec<Address>,
        cause: DeploymentError,
    ) -> DeploymentError {
        let mut stranded = Vec::new();
        for address in deployed.into_iter().rev() {
            if let Err(error) = self.deployer.undeploy(&address).await {
                error!(%address, %error, "rollback undeploy failed; instance is stranded");
                stranded.push(address);
            }
        }
        if stranded.is_empty() {
            cause
        } else {
            DeploymentError::RollbackIncomplete {
                network: network.to_string(),
                stranded,
                source: Box::new(cause),
            }
        }
    }

    /// Undeploys a previously deployed network.
    ///
    /// Undeploying a network that is already stopped or was never deployed
    /// reports success, so callers can retry blindly.
    #[instrument(skip(self))]
    pub async fn undeploy_network(&self, name: &str) -> Result<(), DeploymentError> {
        let Some(value) = self.deployed.get(name).await? else {
            info!("network not deployed; undeploy is a no-op");
            return Ok(());
        };
        let context: NetworkContext = serde_json::from_value(value).map_err(StoreError::from)?;
        let undeploys = context.instances().map(|instance| {
            let address = instance.address().clone();
            async move {
                self.deployer
                    .undeploy(&address)
                    .await
                    .map_err(|error| (address, error))
            }
        });
        let mut stranded = Vec::new();
        for result in join_all(undeploys).await {
            if let Err((address, error)) = result {
                error!(%address, %error, "undeploy failed; instance is stranded");
                stranded.push(address);
            }
        }
        self.deployed.remove(name).await?;
        if stranded.is_empty() {
            info!("network undeployed");
            Ok(())
        } else {
            Err(DeploymentError::UndeployIncomplete {
                network: name.to_string(),
                stranded,
            })
        }
    }

    /// True when `name` is recorded as deployed.
    pub async fn is_deployed(&self, name: &str) -> Result<bool, DeploymentError> {
        Ok(self.deployed.contains(name).await?)
    }
}

impl fmt::Debug for ClusterManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterManager").finish_non_exhaustive()
    }
}
