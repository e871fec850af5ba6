// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform owning one poller per configured outlet.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::accessory::AccessoryHost;
use crate::config::{DeviceConfig, PlatformConfig};
use crate::error::{ConfigError, Error};
use crate::poller::DevicePoller;

/// Starts and tracks the pollers for every configured outlet.
///
/// Broken entries never stop the platform: an entry without a name, a
/// repeated name or an unusable host is logged and skipped.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use tasmota_outlet::accessory::AccessoryHost;
/// use tasmota_outlet::config::PlatformConfig;
/// use tasmota_outlet::Platform;
///
/// # async fn example(host: Arc<dyn AccessoryHost>) -> tasmota_outlet::Result<()> {
/// let config = PlatformConfig::from_file("/etc/tasmota-outlet.json")?;
/// let platform = Platform::new(config, host);
/// platform.launch().await;
///
/// // Later, on shutdown
/// platform.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct Platform {
    config: PlatformConfig,
    host: Arc<dyn AccessoryHost>,
    devices: RwLock<HashMap<String, Arc<DevicePoller>>>,
}

impl Platform {
    /// Creates a platform. Nothing is started until [`launch`](Self::launch).
    #[must_use]
    pub fn new(config: PlatformConfig, host: Arc<dyn AccessoryHost>) -> Self {
        Self {
            config,
            host,
            devices: RwLock::new(HashMap::new()),
        }
    }

    /// Starts a poller for every valid device entry.
    ///
    /// Returns the number of pollers started by this call.
    pub async fn launch(&self) -> usize {
        let Some(entries) = self.config.devices() else {
            tracing::info!("No configuration found, no devices started");
            return 0;
        };

        let mut devices = self.devices.write().await;
        let mut started = 0;

        for entry in entries {
            let config = match DeviceConfig::try_from(entry.clone()) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(host = ?entry.host, error = %e, "Skipping device");
                    continue;
                }
            };

            let name = config.name().to_string();
            if devices.contains_key(&name) {
                let e = ConfigError::DuplicateName(name.clone());
                tracing::warn!(device = %name, error = %e, "Skipping device");
                continue;
            }

            match DevicePoller::start(config, Arc::clone(&self.host)) {
                Ok(poller) => {
                    devices.insert(name, Arc::new(poller));
                    started += 1;
                }
                Err(e) => {
                    tracing::warn!(device = %name, error = %e, "Skipping device");
                }
            }
        }

        tracing::debug!(started, total = devices.len(), "Platform launched");
        started
    }

    /// Returns the poller for a device.
    pub async fn device(&self, name: &str) -> Option<Arc<DevicePoller>> {
        self.devices.read().await.get(name).cloned()
    }

    /// Returns the names of all running devices, sorted.
    pub async fn device_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.devices.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of running devices.
    pub async fn device_count(&self) -> usize {
        self.devices.read().await.len()
    }

    /// Stops a device's poller and removes its accessory from the host.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` if no device has that name, or
    /// `Error::Host` if the host fails to unregister the accessory.
    pub async fn remove_device(&self, name: &str) -> Result<(), Error> {
        let poller = self
            .devices
            .write()
            .await
            .remove(name)
            .ok_or_else(|| Error::DeviceNotFound(name.to_string()))?;

        poller.stop().await;
        poller.binding().unpublish()?;

        tracing::info!(device = name, "Device removed");
        Ok(())
    }

    /// Stops every poller. Accessories stay registered with the host.
    pub async fn shutdown(&self) {
        let pollers: Vec<Arc<DevicePoller>> =
            self.devices.write().await.drain().map(|(_, p)| p).collect();

        for poller in &pollers {
            poller.stop().await;
        }

        tracing::debug!(stopped = pollers.len(), "Platform shut down");
    }
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessory::{Accessory, AccessoryId, Characteristic};
    use crate::config::DeviceEntry;
    use crate::error::HostError;

    struct NullHost;

    impl AccessoryHost for NullHost {
        fn publish_accessory(&self, _accessory: Accessory) -> Result<(), HostError> {
            Ok(())
        }

        fn unregister_accessory(&self, _id: AccessoryId) -> Result<(), HostError> {
            Ok(())
        }

        fn update_characteristic(&self, _id: AccessoryId, _c: Characteristic, _value: bool) {}
    }

    fn entry(name: Option<&str>) -> DeviceEntry {
        DeviceEntry {
            name: name.map(str::to_string),
            // Unroutable documentation address; nothing answers.
            host: Some("192.0.2.1".to_string()),
            refresh_interval: Some(3600),
            request_timeout: Some(1),
            ..DeviceEntry::default()
        }
    }

    #[tokio::test]
    async fn launch_without_devices_array() {
        let platform = Platform::new(PlatformConfig::default(), Arc::new(NullHost));
        assert_eq!(platform.launch().await, 0);
        assert_eq!(platform.device_count().await, 0);
    }

    #[tokio::test]
    async fn launch_skips_missing_and_duplicate_names() {
        let config = PlatformConfig::new(vec![
            entry(Some("Lamp")),
            entry(None),
            entry(Some("Heater")),
            entry(Some("Lamp")),
        ]);
        let platform = Platform::new(config, Arc::new(NullHost));

        assert_eq!(platform.launch().await, 2);
        assert_eq!(platform.device_names().await, vec!["Heater", "Lamp"]);
        assert!(platform.device("Lamp").await.is_some());
        assert!(platform.device("Nope").await.is_none());

        platform.shutdown().await;
        assert_eq!(platform.device_count().await, 0);
    }

    #[tokio::test]
    async fn remove_unknown_device() {
        let platform = Platform::new(PlatformConfig::new(vec![]), Arc::new(NullHost));
        let result = platform.remove_device("Lamp").await;
        assert!(matches!(result, Err(Error::DeviceNotFound(name)) if name == "Lamp"));
    }
}
