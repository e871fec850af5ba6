// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Static configuration consumed at startup.
//!
//! The platform configuration is a JSON document with a `devices` array:
//!
//! ```json
//! {
//!   "devices": [
//!     { "name": "Lamp", "host": "10.0.0.5", "refreshInterval": 5 }
//!   ]
//! }
//! ```
//!
//! Entries are kept raw ([`DeviceEntry`]) until the platform validates them,
//! so that one broken entry only skips that device.

mod device_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub use device_config::{DeviceConfig, DeviceEntry, DeviceIdentity};

/// Top-level platform configuration.
///
/// # Examples
///
/// ```
/// use tasmota_outlet::config::PlatformConfig;
///
/// let config = PlatformConfig::from_json_str(
///     r#"{"devices": [{"name": "Lamp", "host": "10.0.0.5"}]}"#,
/// ).unwrap();
/// assert_eq!(config.devices().map(<[_]>::len), Some(1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default)]
    devices: Option<Vec<DeviceEntry>>,
}

impl PlatformConfig {
    /// Creates a configuration from already-built entries.
    #[must_use]
    pub fn new(devices: Vec<DeviceEntry>) -> Self {
        Self {
            devices: Some(devices),
        }
    }

    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` if the document is not valid.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(ConfigError::from)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read, or
    /// `ConfigError::Json` if its content is not valid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&contents)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Returns the device entries, or `None` when the document has no
    /// `devices` array.
    #[must_use]
    pub fn devices(&self) -> Option<&[DeviceEntry]> {
        self.devices.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_devices_array() {
        let config = PlatformConfig::from_json_str(r#"{"platform": "tasmotaOutlet"}"#).unwrap();
        assert!(config.devices().is_none());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config = PlatformConfig::from_json_str(
            r#"{"platform": "tasmotaOutlet", "devices": [{"name": "Lamp", "extra": 1}]}"#,
        )
        .unwrap();
        let devices = config.devices().unwrap();
        assert_eq!(devices[0].name.as_deref(), Some("Lamp"));
    }

    #[test]
    fn malformed_document() {
        let result = PlatformConfig::from_json_str(r#"{"devices": "#);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn missing_file() {
        let result = PlatformConfig::from_file("/nonexistent/tasmota-outlet.json");
        assert!(matches!(result, Err(ConfigError::Read(_))));
    }
}
