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

use std::time::Duration;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::store::StoreKind;

/// Configuration for the Weft framework
///
/// This struct contains all configurable values for the Weft runtime,
/// loaded from TOML files in XDG-compliant directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct WeftConfig {
    /// Timeout configuration
    pub timeouts: TimeoutConfig,
    /// Feeder loop configuration
    pub feeder: FeederConfig,
    /// Limits and capacity configuration
    pub limits: LimitsConfig,
    /// Cluster and data store configuration
    pub cluster: ClusterConfig,
}

/// Timeout-related configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// How long an emitted message may stay pending before it fails with a
    /// timeout, in milliseconds
    pub ack_timeout_ms: u64,
    /// Default wait when acquiring a cluster lock, in milliseconds
    pub lock_acquire_timeout_ms: u64,
    /// Instance shutdown timeout in milliseconds
    pub shutdown_timeout_ms: u64,
}

/// Feeder loop configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeederConfig {
    /// Delay before an idle or saturated feeder re-arms, in milliseconds
    pub feed_delay_ms: u64,
    /// Pending-message capacity of one output connection
    pub max_queue_size: usize,
}

/// Limits and capacity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// MPSC channel size for an instance's transport inbox
    pub instance_inbox_capacity: usize,
}

/// Cluster and data store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Data store backend used for cluster coordination
    pub store: StoreKind,
    /// Name of the store map recording deployed networks
    pub deployed_map: String,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            ack_timeout_ms: 30_000,
            lock_acquire_timeout_ms: 10_000,
            shutdown_timeout_ms: 10_000,
        }
    }
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            feed_delay_ms: 10,
            max_queue_size: 1_000,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            instance_inbox_capacity: 255,
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            store: StoreKind::InProcess,
            deployed_map: "weft.networks".to_string(),
        }
    }
}

impl WeftConfig {
    /// Convert the ack timeout to a Duration
    pub const fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.ack_timeout_ms)
    }

    /// Convert the feed delay to a Duration
    pub const fn feed_delay(&self) -> Duration {
        Duration::from_millis(self.feeder.feed_delay_ms)
    }

    /// Convert the lock acquire timeout to a Duration
    pub const fn lock_acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.lock_acquire_timeout_ms)
    }

    /// Convert the shutdown timeout to a Duration
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.shutdown_timeout_ms)
    }

    /// Load configuration from XDG-compliant locations
    ///
    /// Attempts to load `config.toml` from the `weft` prefix of the XDG base
    /// directories. If no configuration file is found, returns the default
    /// configuration. If a configuration file exists but is malformed, logs an
    /// error and uses defaults.
    pub fn load() -> Self {
        use tracing::{error, info};

        let xdg_dirs = match xdg::BaseDirectories::with_prefix("weft") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        let config_path = xdg_dirs.find_config_file("config.toml");

        if let Some(path) = config_path {
            info!("Loading configuration from: {}", path.display());
            match std::fs::read_to_string(&path) {
                Ok(config_str) => match toml::from_str::<Self>(&config_str) {
                    Ok(config) => config,
                    Err(e) => {
                        error!("Failed to parse configuration file {}: {}", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    error!("Failed to read configuration file {}: {}", path.display(), e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }
}

lazy_static! {
    /// Global configuration instance loaded from XDG-compliant locations
    pub static ref CONFIG: WeftConfig = WeftConfig::load();
}
