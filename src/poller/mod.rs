// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic polling and state reconciliation for one outlet.
//!
//! A [`DevicePoller`] runs one background task that ticks at the configured
//! refresh interval. Each tick is one poll cycle:
//!
//! - in [`PollPhase::Unknown`] the cycle runs discovery
//!   ([`DevicePoller::fetch_device_info`]), which chains into a state read
//!   on success;
//! - otherwise the cycle only reads state ([`DevicePoller::refresh_state`]).
//!
//! Any transport failure sends the device back to `Unknown`, so the next
//! tick starts with discovery again. Retry cadence is the poll interval.
//!
//! Cycles never overlap: manual calls wait for the timer's cycle to finish
//! and vice versa.
//!
//! The accessory is published on the first successful state read, never
//! before, so the host never shows a placeholder value.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use tasmota_outlet::accessory::AccessoryHost;
//! use tasmota_outlet::config::DeviceConfig;
//! use tasmota_outlet::poller::DevicePoller;
//!
//! # async fn example(host: Arc<dyn AccessoryHost>) -> tasmota_outlet::Result<()> {
//! let poller = DevicePoller::start(DeviceConfig::new("Lamp", "10.0.0.5"), host)?;
//!
//! let mut state = poller.watch();
//! state.changed().await.ok();
//! println!("Lamp is on: {}", poller.cached_power());
//!
//! poller.stop().await;
//! # Ok(())
//! # }
//! ```

mod state;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{Mutex as AsyncMutex, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use crate::accessory::{AccessoryBinding, AccessoryHost};
use crate::command::PowerCommand;
use crate::config::DeviceConfig;
use crate::error::{ProtocolError, Result};
use crate::protocol::HttpClient;
use crate::response::PowerResponse;
use crate::types::PowerState;

pub use state::{PollEvent, PollPhase, PollState};

/// Polls one outlet and keeps its accessory in sync.
pub struct DevicePoller {
    shared: Arc<PollerShared>,
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// State shared between the poll task, the binding and the poller handle.
pub(crate) struct PollerShared {
    config: DeviceConfig,
    client: HttpClient,
    state_tx: watch::Sender<PollState>,
    binding: Arc<AccessoryBinding>,
    cycle: AsyncMutex<()>,
    writes: Mutex<JoinSet<()>>,
    runtime: Handle,
    stopped: AtomicBool,
}

impl DevicePoller {
    /// Creates a poller without starting its timer.
    ///
    /// Cycles can then be driven manually with [`poll_once`](Self::poll_once).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid,
    /// `ProtocolError::InvalidAddress` if the host is empty, or
    /// `Error::Runtime` if called outside a tokio runtime.
    pub fn new(config: DeviceConfig, host: Arc<dyn AccessoryHost>) -> Result<Self> {
        if let Err(e) = config.validate() {
            tracing::warn!(device = config.name(), error = %e, "Invalid device configuration");
            return Err(e.into());
        }

        let runtime = Handle::try_current()?;
        let client = config.http_config().into_client()?;
        let (state_tx, _) = watch::channel(PollState::default());

        let shared = Arc::new_cyclic(|weak| PollerShared {
            binding: Arc::new(AccessoryBinding::new(&config, host, weak.clone())),
            config,
            client,
            state_tx,
            cycle: AsyncMutex::new(()),
            writes: Mutex::new(JoinSet::new()),
            runtime,
            stopped: AtomicBool::new(false),
        });

        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            shared,
            shutdown,
            task: Mutex::new(None),
        })
    }

    /// Creates a poller and starts its timer.
    ///
    /// The first tick fires immediately and runs discovery.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn start(config: DeviceConfig, host: Arc<dyn AccessoryHost>) -> Result<Self> {
        let poller = Self::new(config, host)?;
        poller.spawn_timer();
        Ok(poller)
    }

    fn spawn_timer(&self) {
        let shared = Arc::clone(&self.shared);
        let shutdown = self.shutdown.subscribe();

        tracing::debug!(
            device = shared.config.name(),
            host = shared.config.host(),
            interval_ms = u64::try_from(shared.config.refresh_interval().as_millis())
                .unwrap_or(u64::MAX),
            "Starting poll timer"
        );

        let handle = self.shared.runtime.spawn(run_timer(shared, shutdown));
        *self.task.lock() = Some(handle);
    }

    /// Returns the device configuration.
    #[must_use]
    pub fn config(&self) -> &DeviceConfig {
        &self.shared.config
    }

    /// Returns the device name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.shared.config.name()
    }

    /// Returns the accessory binding.
    #[must_use]
    pub fn binding(&self) -> &Arc<AccessoryBinding> {
        &self.shared.binding
    }

    /// Returns a snapshot of the poll state.
    #[must_use]
    pub fn state(&self) -> PollState {
        self.shared.state_tx.borrow().clone()
    }

    /// Returns a receiver notified after every state transition.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<PollState> {
        self.shared.state_tx.subscribe()
    }

    /// Returns the last known power value, `false` if never known.
    #[must_use]
    pub fn cached_power(&self) -> bool {
        self.shared.cached_power()
    }

    /// Returns true while the timer task is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Runs one poll cycle and returns the resulting phase.
    pub async fn poll_once(&self) -> PollPhase {
        self.shared.poll_once().await
    }

    /// Discovery phase. Chains into [`refresh_state`](Self::refresh_state)
    /// on success.
    pub async fn fetch_device_info(&self) -> PollPhase {
        self.shared.fetch_device_info().await
    }

    /// State phase: reads the relay state and updates the accessory.
    pub async fn refresh_state(&self) -> PollPhase {
        self.shared.refresh_state().await
    }

    /// Dispatches a power command without waiting for the device.
    ///
    /// The cached state is not touched; the next successful
    /// [`refresh_state`](Self::refresh_state) reports the outcome.
    pub fn set_power(&self, on: bool) {
        self.shared.set_power(on);
    }

    /// Stops the timer and waits for the running cycle and all in-flight
    /// power commands to finish. Safe to call more than once.
    pub async fn stop(&self) {
        {
            let _writes = self.shared.writes.lock();
            self.shared.stopped.store(true, Ordering::Release);
        }
        self.shutdown.send_replace(true);

        let task = self.task.lock().take();
        if let Some(task) = task
            && let Err(e) = task.await
            && e.is_panic()
        {
            tracing::error!(device = self.name(), "Poll task panicked");
        }

        let mut writes = std::mem::take(&mut *self.shared.writes.lock());
        while writes.join_next().await.is_some() {}

        tracing::debug!(device = self.name(), "Poller stopped");
    }
}

impl Drop for DevicePoller {
    fn drop(&mut self) {
        self.shared.stopped.store(true, Ordering::Release);
        self.shutdown.send_replace(true);
    }
}

impl fmt::Debug for DevicePoller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DevicePoller")
            .field("name", &self.name())
            .field("host", &self.shared.config.host())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

async fn run_timer(shared: Arc<PollerShared>, mut shutdown: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(shared.config.refresh_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = interval.tick() => {
                shared.poll_once().await;
            }
        }
    }

    tracing::debug!(device = shared.config.name(), "Poll timer stopped");
}

impl PollerShared {
    pub(crate) fn cached_power(&self) -> bool {
        self.state_tx.borrow().power_on()
    }

    async fn poll_once(&self) -> PollPhase {
        let _cycle = self.cycle.lock().await;
        let phase = self.state_tx.borrow().phase();
        match phase {
            PollPhase::Unknown => self.discover().await,
            PollPhase::InfoKnown | PollPhase::StateKnown => self.read_state().await,
        }
    }

    async fn fetch_device_info(&self) -> PollPhase {
        let _cycle = self.cycle.lock().await;
        self.discover().await
    }

    async fn refresh_state(&self) -> PollPhase {
        let _cycle = self.cycle.lock().await;
        self.read_state().await
    }

    // Callers hold `cycle`.
    async fn discover(&self) -> PollPhase {
        let name = self.config.name();
        let host = self.config.host();
        tracing::debug!(device = name, host, "Requesting device info");

        match self.query_power().await {
            Ok(on) => {
                self.transition(PollEvent::InfoFetched);

                let identity = self.config.identity();
                tracing::info!(
                    device = name,
                    host,
                    manufacturer = %identity.manufacturer,
                    model = %identity.model,
                    serial_number = %identity.serial_number,
                    firmware = %identity.firmware_revision,
                    state = PowerState::from(on).as_str(),
                    "Device online"
                );

                self.read_state().await
            }
            Err(e) => {
                self.transition(PollEvent::RequestFailed);
                tracing::error!(
                    device = name,
                    host,
                    error = %e,
                    "Device info request failed, device offline, retrying on next poll"
                );
                PollPhase::Unknown
            }
        }
    }

    async fn read_state(&self) -> PollPhase {
        let name = self.config.name();
        let host = self.config.host();
        tracing::debug!(device = name, host, "Requesting device state");

        match self.query_power().await {
            Ok(on) => {
                self.state_tx.send_modify(|state| state.record_power(on));
                self.publish_if_needed(on);
                self.binding.push_power_update(on);
                PollPhase::StateKnown
            }
            Err(e) => {
                self.transition(PollEvent::RequestFailed);
                tracing::error!(
                    device = name,
                    host,
                    error = %e,
                    "Device state request failed, device offline"
                );
                PollPhase::Unknown
            }
        }
    }

    /// Reads the relay. An unparseable body counts as off.
    async fn query_power(&self) -> std::result::Result<bool, ProtocolError> {
        let response = self.client.send_command(&PowerCommand::Query).await?;

        match response.parse::<PowerResponse>() {
            Ok(power) => Ok(power.is_on()),
            Err(e) => {
                tracing::debug!(
                    device = self.config.name(),
                    error = %e,
                    "Unexpected power response, treating as off"
                );
                Ok(false)
            }
        }
    }

    fn publish_if_needed(&self, on: bool) {
        if self.state_tx.borrow().accessory_published() {
            return;
        }
        match self.binding.publish(on) {
            Ok(_) => {
                self.state_tx.send_if_modified(PollState::mark_published);
            }
            Err(e) => tracing::error!(
                device = self.config.name(),
                error = %e,
                "Host rejected accessory, retrying on next poll"
            ),
        }
    }

    pub(crate) fn set_power(&self, on: bool) {
        let name = self.config.name().to_string();
        let mut writes = self.writes.lock();
        if self.stopped.load(Ordering::Acquire) {
            tracing::debug!(device = %name, "Poller stopped, dropping set request");
            return;
        }

        let client = self.client.clone();
        let command = PowerCommand::from(on);

        while writes.try_join_next().is_some() {}
        writes.spawn_on(
            async move {
                match client.send_command(&command).await {
                    Ok(_) => tracing::debug!(device = %name, on, "Power command dispatched"),
                    Err(e) => tracing::warn!(device = %name, on, error = %e, "Power command failed"),
                }
            },
            &self.runtime,
        );
    }

    fn transition(&self, event: PollEvent) {
        self.state_tx.send_modify(|state| state.apply(event));
    }
}
