// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration module.
//!
//! Handles loading and saving relay settings.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default read buffer capacity in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Largest accepted read buffer.
pub const MAX_BUFFER_SIZE: usize = 64 * 1024;

const APP_DIR: &str = "bluzone-relay";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Relay settings.
    #[serde(default)]
    pub relay: RelayConfig,

    /// Where to connect.
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Capacity of the read buffer. Each inbound event carries at most this
    /// many bytes.
    pub buffer_size: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 || self.buffer_size > MAX_BUFFER_SIZE {
            bail!(
                "buffer_size must be between 1 and {}, got {}",
                MAX_BUFFER_SIZE,
                self.buffer_size
            );
        }
        Ok(())
    }
}

/// Transport endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EndpointConfig {
    /// TCP `host:port`.
    Tcp { address: String },
    /// Bluetooth RFCOMM to an already paired device.
    Rfcomm { address: String, channel: u8 },
}

impl Default for EndpointConfig {
    fn default() -> Self {
        EndpointConfig::Tcp {
            address: "127.0.0.1:7001".to_string(),
        }
    }
}

impl EndpointConfig {
    pub fn validate(&self) -> Result<()> {
        match self {
            EndpointConfig::Tcp { address } if address.trim().is_empty() => {
                bail!("tcp endpoint address is empty")
            }
            EndpointConfig::Rfcomm { address, .. } if address.trim().is_empty() => {
                bail!("rfcomm endpoint address is empty")
            }
            EndpointConfig::Rfcomm { channel, .. } if !(1..=30).contains(channel) => {
                bail!("rfcomm channel must be between 1 and 30, got {}", channel)
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "bluzone_relay=info".to_string(),
        }
    }
}

impl Config {
    /// Default location: `<config_dir>/bluzone-relay/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Load configuration from the default location or create it.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load configuration from `path`, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            let config = Self::default();
            config.save_to(path)?;
            config
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.relay.validate()?;
        self.endpoint.validate()?;
        Ok(())
    }
}
