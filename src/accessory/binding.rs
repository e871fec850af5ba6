// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Adapter between a poller and the host's accessory.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crate::accessory::{Accessory, AccessoryHost, AccessoryId, Characteristic, OutletController};
use crate::config::{DeviceConfig, DeviceIdentity};
use crate::error::HostError;
use crate::poller::PollerShared;

/// Relays host reads and writes to a poller and poller updates to the host.
///
/// The binding is owned by its poller and handed to the host as the
/// accessory's [`OutletController`]. It only holds a weak link back to the
/// poller; once the poller is gone reads answer `false` and writes are
/// dropped.
pub struct AccessoryBinding {
    id: AccessoryId,
    name: String,
    identity: DeviceIdentity,
    log_info: bool,
    host: Arc<dyn AccessoryHost>,
    poller: Weak<PollerShared>,
    published: AtomicBool,
}

impl AccessoryBinding {
    pub(crate) fn new(
        config: &DeviceConfig,
        host: Arc<dyn AccessoryHost>,
        poller: Weak<PollerShared>,
    ) -> Self {
        Self {
            id: AccessoryId::from_name(config.name()),
            name: config.name().to_string(),
            identity: config.identity().clone(),
            log_info: !config.log_info_disabled(),
            host,
            poller,
            published: AtomicBool::new(false),
        }
    }

    /// Returns the accessory identifier.
    #[must_use]
    pub fn id(&self) -> AccessoryId {
        self.id
    }

    /// Returns true once the accessory is registered with the host, or while
    /// its registration is in progress.
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.published.load(Ordering::Acquire)
    }

    /// Registers the accessory with the host, once.
    ///
    /// Returns `Ok(true)` if this call registered it and `Ok(false)` if it
    /// was already registered.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if the host refuses the accessory. The binding
    /// stays unpublished so a later call can retry.
    pub fn publish(self: &Arc<Self>, initial_on: bool) -> Result<bool, HostError> {
        if self
            .published
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(false);
        }

        tracing::debug!(device = %self.name, id = %self.id, "Publishing accessory");

        let controller: Arc<dyn OutletController> = Arc::clone(self) as Arc<dyn OutletController>;
        let accessory = Accessory::outlet(&self.name, self.identity.clone(), initial_on, controller);
        if let Err(e) = self.host.publish_accessory(accessory) {
            self.published.store(false, Ordering::Release);
            return Err(e);
        }

        tracing::info!(device = %self.name, id = %self.id, "Accessory published");
        Ok(true)
    }

    /// Unregisters the accessory if it was published.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if the host cannot remove it.
    pub fn unpublish(&self) -> Result<(), HostError> {
        if !self.published.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        tracing::debug!(device = %self.name, id = %self.id, "Unregistering accessory");
        self.host.unregister_accessory(self.id)
    }

    /// Host read of `On`: the poller's cached power.
    #[must_use]
    pub fn on_get_power(&self) -> bool {
        let state = self.cached_power();
        if self.log_info {
            tracing::info!(
                device = %self.name,
                state = if state { "ON" } else { "OFF" },
                "Get state"
            );
        }
        state
    }

    /// Host read of `OutletInUse`: the same cached value.
    #[must_use]
    pub fn on_get_in_use(&self) -> bool {
        let in_use = self.cached_power();
        if self.log_info {
            tracing::info!(
                device = %self.name,
                in_use = if in_use { "YES" } else { "NO" },
                "Get in use"
            );
        }
        in_use
    }

    /// Host write of `On`: dispatches the command and returns immediately.
    pub fn on_set_power(&self, desired: bool) {
        let Some(poller) = self.poller.upgrade() else {
            tracing::debug!(device = %self.name, "Poller gone, dropping set request");
            return;
        };
        poller.set_power(desired);
        if self.log_info {
            tracing::info!(
                device = %self.name,
                state = if desired { "ON" } else { "OFF" },
                "Set state"
            );
        }
    }

    /// Pushes a new `OutletInUse` value to the host.
    ///
    /// Does nothing until the accessory is published.
    pub fn push_power_update(&self, value: bool) {
        if !self.is_published() {
            return;
        }
        self.host
            .update_characteristic(self.id, Characteristic::OutletInUse, value);
    }

    fn cached_power(&self) -> bool {
        self.poller
            .upgrade()
            .is_some_and(|poller| poller.cached_power())
    }
}

impl OutletController for AccessoryBinding {
    fn get_on(&self) -> bool {
        self.on_get_power()
    }

    fn set_on(&self, on: bool) {
        self.on_set_power(on);
    }

    fn get_in_use(&self) -> bool {
        self.on_get_in_use()
    }
}

impl fmt::Debug for AccessoryBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessoryBinding")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("published", &self.is_published())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingHost {
        published: Mutex<Vec<Accessory>>,
        unregistered: Mutex<Vec<AccessoryId>>,
        updates: Mutex<Vec<(Characteristic, bool)>>,
        reject: AtomicBool,
        publish_delay: Duration,
    }

    impl AccessoryHost for RecordingHost {
        fn publish_accessory(&self, accessory: Accessory) -> Result<(), HostError> {
            if !self.publish_delay.is_zero() {
                std::thread::sleep(self.publish_delay);
            }
            if self.reject.load(Ordering::SeqCst) {
                return Err(HostError::new("rejected"));
            }
            self.published.lock().push(accessory);
            Ok(())
        }

        fn unregister_accessory(&self, id: AccessoryId) -> Result<(), HostError> {
            self.unregistered.lock().push(id);
            Ok(())
        }

        fn update_characteristic(&self, _id: AccessoryId, c: Characteristic, value: bool) {
            self.updates.lock().push((c, value));
        }
    }

    fn detached_binding(host: &Arc<RecordingHost>) -> Arc<AccessoryBinding> {
        let config = DeviceConfig::new("Lamp", "10.0.0.5");
        Arc::new(AccessoryBinding::new(
            &config,
            Arc::clone(host) as Arc<dyn AccessoryHost>,
            Weak::new(),
        ))
    }

    #[test]
    fn publish_is_idempotent() {
        let host = Arc::new(RecordingHost::default());
        let binding = detached_binding(&host);

        assert!(binding.publish(true).unwrap());
        assert!(!binding.publish(false).unwrap());

        let published = host.published.lock();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].id(), AccessoryId::from_name("Lamp"));
        assert!(published[0].initial_on());
    }

    #[test]
    fn concurrent_publish_registers_once() {
        let host = Arc::new(RecordingHost {
            publish_delay: Duration::from_millis(100),
            ..RecordingHost::default()
        });
        let binding = detached_binding(&host);

        let results: Vec<bool> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| scope.spawn(|| binding.publish(true).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|registered| **registered).count(), 1);
        assert_eq!(host.published.lock().len(), 1);
        assert!(binding.is_published());
    }

    #[test]
    fn rejected_publish_can_be_retried() {
        let host = Arc::new(RecordingHost::default());
        host.reject.store(true, Ordering::SeqCst);
        let binding = detached_binding(&host);

        assert!(binding.publish(false).is_err());
        assert!(!binding.is_published());

        host.reject.store(false, Ordering::SeqCst);
        assert!(binding.publish(false).unwrap());
        assert!(binding.is_published());
    }

    #[test]
    fn push_requires_publication() {
        let host = Arc::new(RecordingHost::default());
        let binding = detached_binding(&host);

        binding.push_power_update(true);
        assert!(host.updates.lock().is_empty());

        binding.publish(true).unwrap();
        binding.push_power_update(false);
        assert_eq!(
            host.updates.lock().as_slice(),
            &[(Characteristic::OutletInUse, false)]
        );
    }

    #[test]
    fn unpublish_only_after_publish() {
        let host = Arc::new(RecordingHost::default());
        let binding = detached_binding(&host);

        binding.unpublish().unwrap();
        assert!(host.unregistered.lock().is_empty());

        binding.publish(true).unwrap();
        binding.unpublish().unwrap();
        binding.unpublish().unwrap();
        assert_eq!(host.unregistered.lock().as_slice(), &[binding.id()]);
    }

    #[test]
    fn detached_binding_reads_off() {
        let host = Arc::new(RecordingHost::default());
        let binding = detached_binding(&host);

        assert!(!binding.on_get_power());
        assert!(!binding.get_in_use());
        binding.on_set_power(true);
    }
}
