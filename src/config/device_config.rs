// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::protocol::HttpConfig;

/// One device entry as it appears in the configuration document.
///
/// Every field is optional here; [`DeviceConfig::try_from`] applies the
/// defaults and rejects entries without a name. Empty strings and a zero
/// interval count as "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceEntry {
    /// Accessory name, required and unique.
    #[serde(default)]
    pub name: Option<String>,
    /// Device host or IP address, optionally with a port.
    #[serde(default)]
    pub host: Option<String>,
    /// Web user.
    #[serde(default)]
    pub user: Option<String>,
    /// Web password.
    #[serde(default)]
    pub passwd: Option<String>,
    /// Poll interval in seconds.
    #[serde(default)]
    pub refresh_interval: Option<u64>,
    /// HTTP request timeout in seconds.
    #[serde(default)]
    pub request_timeout: Option<u64>,
    /// Manufacturer shown by the host.
    #[serde(default)]
    pub manufacturer: Option<String>,
    /// Model shown by the host.
    #[serde(default)]
    pub model_name: Option<String>,
    /// Serial number shown by the host.
    #[serde(default)]
    pub serial_number: Option<String>,
    /// Firmware revision shown by the host.
    #[serde(default)]
    pub firmware_revision: Option<String>,
    /// Silences the info-level get/set logs.
    #[serde(default)]
    pub disable_log_info: bool,
}

/// Static identity metadata published with the accessory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Manufacturer name.
    pub manufacturer: String,
    /// Model name.
    pub model: String,
    /// Serial number.
    pub serial_number: String,
    /// Firmware revision.
    pub firmware_revision: String,
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self {
            manufacturer: DeviceConfig::DEFAULT_MANUFACTURER.to_string(),
            model: DeviceConfig::DEFAULT_MODEL.to_string(),
            serial_number: DeviceConfig::DEFAULT_SERIAL_NUMBER.to_string(),
            firmware_revision: DeviceConfig::DEFAULT_FIRMWARE_REVISION.to_string(),
        }
    }
}

/// Validated configuration for one outlet. Immutable once built.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tasmota_outlet::config::DeviceConfig;
///
/// let config = DeviceConfig::new("Lamp", "10.0.0.5")
///     .with_credentials("admin", "secret")
///     .with_refresh_interval(Duration::from_secs(5));
///
/// assert_eq!(config.name(), "Lamp");
/// assert_eq!(config.identity().manufacturer, "Gosund");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    name: String,
    host: String,
    user: String,
    passwd: String,
    refresh_interval: Duration,
    request_timeout: Duration,
    identity: DeviceIdentity,
    disable_log_info: bool,
}

impl DeviceConfig {
    /// Default poll interval.
    pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);
    /// Default manufacturer.
    pub const DEFAULT_MANUFACTURER: &'static str = "Gosund";
    /// Default model name.
    pub const DEFAULT_MODEL: &'static str = "SP111";
    /// Default serial number.
    pub const DEFAULT_SERIAL_NUMBER: &'static str = "Serial Number";
    /// Default firmware revision.
    pub const DEFAULT_FIRMWARE_REVISION: &'static str = "Firmware Revision";

    /// Creates a configuration with default interval, timeout and identity.
    #[must_use]
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            user: String::new(),
            passwd: String::new(),
            refresh_interval: Self::DEFAULT_REFRESH_INTERVAL,
            request_timeout: HttpConfig::DEFAULT_TIMEOUT,
            identity: DeviceIdentity::default(),
            disable_log_info: false,
        }
    }

    /// Sets the device web credentials.
    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, passwd: impl Into<String>) -> Self {
        self.user = user.into();
        self.passwd = passwd.into();
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the identity metadata.
    #[must_use]
    pub fn with_identity(mut self, identity: DeviceIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Silences the info-level get/set logs.
    #[must_use]
    pub fn with_log_info_disabled(mut self, disabled: bool) -> Self {
        self.disable_log_info = disabled;
        self
    }

    /// Checks the invariants a poller relies on.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the name is blank or a duration is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingName);
        }
        if self.refresh_interval.is_zero() {
            return Err(ConfigError::InvalidRefreshInterval);
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidRequestTimeout);
        }
        Ok(())
    }

    /// Returns the accessory name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the device host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the poll interval.
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the identity metadata.
    #[must_use]
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Returns true if info-level get/set logs are silenced.
    #[must_use]
    pub fn log_info_disabled(&self) -> bool {
        self.disable_log_info
    }

    /// Returns the HTTP connection parameters for this device.
    ///
    /// Credentials are always sent, empty if not configured.
    #[must_use]
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig::new(self.host.clone())
            .with_credentials(self.user.clone(), self.passwd.clone())
            .with_timeout(self.request_timeout)
    }
}

impl TryFrom<DeviceEntry> for DeviceConfig {
    type Error = ConfigError;

    fn try_from(entry: DeviceEntry) -> Result<Self, Self::Error> {
        let name = non_empty(entry.name).ok_or(ConfigError::MissingName)?;

        let identity = DeviceIdentity {
            manufacturer: non_empty(entry.manufacturer)
                .unwrap_or_else(|| Self::DEFAULT_MANUFACTURER.to_string()),
            model: non_empty(entry.model_name).unwrap_or_else(|| Self::DEFAULT_MODEL.to_string()),
            serial_number: non_empty(entry.serial_number)
                .unwrap_or_else(|| Self::DEFAULT_SERIAL_NUMBER.to_string()),
            firmware_revision: non_empty(entry.firmware_revision)
                .unwrap_or_else(|| Self::DEFAULT_FIRMWARE_REVISION.to_string()),
        };

        let refresh_interval = entry
            .refresh_interval
            .filter(|secs| *secs > 0)
            .map_or(Self::DEFAULT_REFRESH_INTERVAL, Duration::from_secs);
        let request_timeout = entry
            .request_timeout
            .filter(|secs| *secs > 0)
            .map_or(HttpConfig::DEFAULT_TIMEOUT, Duration::from_secs);

        let config = Self {
            name,
            host: entry.host.unwrap_or_default(),
            user: entry.user.unwrap_or_default(),
            passwd: entry.passwd.unwrap_or_default(),
            refresh_interval,
            request_timeout,
            identity,
            disable_log_info: entry.disable_log_info,
        };
        config.validate()?;
        Ok(config)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(json: &str) -> DeviceEntry {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn entry_with_defaults() {
        let config =
            DeviceConfig::try_from(entry(r#"{"name": "Lamp", "host": "10.0.0.5"}"#)).unwrap();

        assert_eq!(config.name(), "Lamp");
        assert_eq!(config.host(), "10.0.0.5");
        assert_eq!(config.refresh_interval(), Duration::from_secs(5));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.identity(), &DeviceIdentity::default());
        assert!(!config.log_info_disabled());
    }

    #[test]
    fn entry_with_all_fields() {
        let config = DeviceConfig::try_from(entry(
            r#"{
                "name": "Heater",
                "host": "10.0.0.9",
                "user": "admin",
                "passwd": "secret",
                "refreshInterval": 30,
                "requestTimeout": 3,
                "manufacturer": "Nous",
                "modelName": "A1T",
                "serialNumber": "0042",
                "firmwareRevision": "13.2.0",
                "disableLogInfo": true
            }"#,
        ))
        .unwrap();

        assert_eq!(config.refresh_interval(), Duration::from_secs(30));
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.identity().manufacturer, "Nous");
        assert_eq!(config.identity().model, "A1T");
        assert_eq!(config.identity().serial_number, "0042");
        assert_eq!(config.identity().firmware_revision, "13.2.0");
        assert!(config.log_info_disabled());
        assert_eq!(config.http_config().timeout(), Duration::from_secs(3));
    }

    #[test]
    fn missing_name_is_rejected() {
        let result = DeviceConfig::try_from(entry(r#"{"host": "10.0.0.5"}"#));
        assert!(matches!(result, Err(ConfigError::MissingName)));

        let result = DeviceConfig::try_from(entry(r#"{"name": "  "}"#));
        assert!(matches!(result, Err(ConfigError::MissingName)));
    }

    #[test]
    fn zero_and_empty_values_fall_back_to_defaults() {
        let config = DeviceConfig::try_from(entry(
            r#"{"name": "Lamp", "refreshInterval": 0, "manufacturer": ""}"#,
        ))
        .unwrap();

        assert_eq!(config.refresh_interval(), DeviceConfig::DEFAULT_REFRESH_INTERVAL);
        assert_eq!(config.identity().manufacturer, "Gosund");
    }

    #[test]
    fn validate_rejects_zero_durations() {
        let config = DeviceConfig::new("Lamp", "10.0.0.5").with_refresh_interval(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRefreshInterval)
        ));

        let config = DeviceConfig::new("Lamp", "10.0.0.5").with_request_timeout(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRequestTimeout)
        ));
    }
}
