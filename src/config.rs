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
//! Handles loading application settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bluetooth settings.
    pub bluetooth: BluetoothConfig,

    /// Relay worker settings.
    pub relay: RelayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BluetoothConfig {
    /// Adapter name such as `hci0`; the default adapter when unset.
    pub adapter: Option<String>,

    /// Device to use when none is given on the command line.
    pub default_device: Option<String>,

    /// Fixed RFCOMM channel. When unset the channel is resolved from the
    /// SPP service record.
    pub channel: Option<u8>,

    /// Give up on a connect attempt after this many seconds.
    pub connect_timeout_secs: u64,
}

impl Default for BluetoothConfig {
    fn default() -> Self {
        Self {
            adapter: None,
            default_device: None,
            channel: None,
            connect_timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Requests that may wait for the worker before callers block.
    pub queue_depth: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self { queue_depth: 32 }
    }
}

impl Config {
    /// Default config file location.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rgb-relay")
            .join("config.toml")
    }

    /// Load configuration from file or create default.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("reading {}", config_path.display()))?;
            let config = toml::from_str(&content)
                .with_context(|| format!("parsing {}", config_path.display()))?;
            info!("Configuration loaded from {:?}", config_path);
            Ok(config)
        } else {
            let config = Self::default();
            config.save(&config_path)?;
            info!("Default configuration written to {:?}", config_path);
            Ok(config)
        }
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_creates_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load(Some(path.as_path())).unwrap();
        assert!(path.exists());
        assert_eq!(config.relay.queue_depth, 32);
        assert_eq!(config.bluetooth.connect_timeout_secs, 20);
        assert!(config.bluetooth.default_device.is_none());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[bluetooth]\ndefault_device = \"HC-06\"\nchannel = 1\n",
        )
        .unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.bluetooth.default_device.as_deref(), Some("HC-06"));
        assert_eq!(config.bluetooth.channel, Some(1));
        assert_eq!(config.bluetooth.connect_timeout_secs, 20);
        assert_eq!(config.relay.queue_depth, 32);
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[bluetooth\n").unwrap();
        assert!(Config::load(Some(path.as_path())).is_err());
    }
}
