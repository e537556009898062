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

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, instrument};

use crate::common::ResolutionError;
use crate::context::{Address, ComponentContext, ConnectionContext, InstanceContext, NetworkContext};
use crate::network::{ConnectionDef, Network, SelectionPolicy};

/// Expands a declarative [`Network`] into a concrete [`NetworkContext`].
///
/// Every component becomes `instance_count` instance contexts with
/// deterministic addresses, and every connection becomes its instance-level
/// bindings according to its selection policy: fan-out yields one binding per
/// (source instance, target instance) pair; round-robin and key-based yield
/// one binding per source instance, with the target chosen per message at
/// send time.
#[instrument(skip(network), fields(network = network.name()))]
pub fn resolve(network: &Network) -> Result<NetworkContext, ResolutionError> {
    if network.components().is_empty() {
        return Err(ResolutionError::EmptyNetwork(network.name().to_string()));
    }

    let mut names = HashSet::new();
    for component in network.components() {
        if !names.insert(component.name()) {
            return Err(ResolutionError::DuplicateComponent(component.name().to_string()));
        }
    }

    for connection in network.connections() {
        let source = network.component(&connection.source().component).ok_or_else(|| {
            ResolutionError::UnknownComponent {
                component: connection.source().component.clone(),
            }
        })?;
        if !source.has_output(&connection.source().port) {
            return Err(ResolutionError::UnknownPort {
                component: source.name().to_string(),
                port: connection.source().port.clone(),
                direction: "output",
            });
        }
        let target = network.component(&connection.target().component).ok_or_else(|| {
            ResolutionError::UnknownComponent {
                component: connection.target().component.clone(),
            }
        })?;
        if !target.has_input(&connection.target().port) {
            return Err(ResolutionError::UnknownPort {
                component: target.name().to_string(),
                port: connection.target().port.clone(),
                direction: "input",
            });
        }
    }

    let mut components = BTreeMap::new();
    for definition in network.components() {
        let instances = (0..definition.instance_count() as u32)
            .map(|ordinal| {
                InstanceContext::new(
                    Address::instance(network.name(), definition.name(), ordinal),
                    ordinal,
                    definition.name().to_string(),
                )
            })
            .collect();
        components.insert(
            definition.name().to_string(),
            ComponentContext::new(
                definition.name().to_string(),
                definition.main().to_string(),
                definition.config().clone(),
                network.name().to_string(),
                instances,
            ),
        );
    }

    for connection in network.connections() {
        let contexts = expand(network, connection);
        debug!(
            source = %connection.source().component,
            target = %connection.target().component,
            bindings = contexts.len(),
            "connection expanded"
        );
        if let Some(component) = components.get_mut(&connection.source().component) {
            component.add_connections(connection.target().component.clone(), contexts);
        }
    }

    Ok(NetworkContext::new(network.name().to_string(), components))
}

/// Expands one connection definition into its instance-level bindings.
fn expand(network: &Network, connection: &ConnectionDef) -> Vec<ConnectionContext> {
    let name = network.name();
    let source = &connection.source().component;
    let source_port = &connection.source().port;
    let target = &connection.target().component;
    let target_port = &connection.target().port;
    let source_count = network.component(source).map(|c| c.instance_count()).unwrap_or(0) as u32;
    let target_count = network.component(target).map(|c| c.instance_count()).unwrap_or(0) as u32;
    let base = format!("{name}.{source}:{source_port}->{target}:{target_port}");

    let mut contexts = Vec::new();
    match connection.policy() {
        SelectionPolicy::FanOut => {
            for source_ordinal in 0..source_count {
                for target_ordinal in 0..target_count {
                    contexts.push(ConnectionContext::new(
                        format!("{base}#{source_ordinal}-{target_ordinal}"),
                        Address::instance(name, source, source_ordinal),
                        source.clone(),
                        source_port.clone(),
                        target.clone(),
                        target_port.clone(),
                        vec![Address::instance(name, target, target_ordinal)],
                        connection.policy(),
                        connection.hooks().to_vec(),
                    ));
                }
            }
        }
        SelectionPolicy::RoundRobin | SelectionPolicy::KeyBased => {
            let targets: Vec<Address> = (0..target_count)
                .map(|target_ordinal| Address::instance(name, target, target_ordinal))
                .collect();
            for source_ordinal in 0..source_count {
                contexts.push(ConnectionContext::new(
                    format!("{base}#{source_ordinal}"),
                    Address::instance(name, source, source_ordinal),
                    source.clone(),
                    source_port.clone(),
                    target.clone(),
                    target_port.clone(),
                    targets.clone(),
                    connection.policy(),
                    connection.hooks().to_vec(),
                ));
            }
        }
    }
    contexts
}

#[cfg(test)]
mod tests {
    use crate::network::{ComponentDef, ConnectionDef, Network, SelectionPolicy};

    use super::*;

    fn pair(policy: SelectionPolicy) -> Network {
        Network::new("pair")
            .add_component(
                ComponentDef::new("left", "left::main")
                    .with_instances(2)
                    .with_output("out", "record"),
            )
            .add_component(
                ComponentDef::new("right", "right::main")
                    .with_instances(3)
                    .with_input("in", "record"),
            )
            .connect(ConnectionDef::between("left", "out", "right", "in", policy))
    }

    #[test]
    fn fan_out_expands_per_pair() {
        let context = resolve(&pair(SelectionPolicy::FanOut)).expect("resolvable network");
        let bindings = context.component("left").unwrap().connections_to("right");
        assert_eq!(bindings.len(), 6);
        assert!(bindings.iter().all(|binding| binding.targets().len() == 1));
    }

    #[test]
    fn round_robin_expands_per_source_instance() {
        let context = resolve(&pair(SelectionPolicy::RoundRobin)).expect("resolvable network");
        let bindings = context.component("left").unwrap().connections_to("right");
        assert_eq!(bindings.len(), 2);
        assert!(bindings.iter().all(|binding| binding.targets().len() == 3));
    }

    #[test]
    fn addresses_are_deterministic() {
        let first = resolve(&pair(SelectionPolicy::FanOut)).expect("resolvable network");
        let second = resolve(&pair(SelectionPolicy::FanOut)).expect("resolvable network");
        assert_eq!(first, second);
        assert_eq!(
            first.component("left").unwrap().instances()[1].address().as_str(),
            "pair.left-1"
        );
    }
}
