// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tasmota Outlet - bridge Tasmota Wi-Fi outlets to a smart-home host.
//!
//! Each configured outlet gets a [`DevicePoller`] that polls the device's
//! HTTP console at a fixed interval and keeps a cached power state. Once
//! the first state read succeeds, the poller publishes an outlet accessory
//! through the host's [`AccessoryHost`] implementation and from then on
//! pushes every observed state to it. Host writes are dispatched to the
//! device without waiting; the next poll confirms them.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tasmota_outlet::accessory::{Accessory, AccessoryHost, AccessoryId, Characteristic};
//! use tasmota_outlet::config::PlatformConfig;
//! use tasmota_outlet::error::HostError;
//! use tasmota_outlet::Platform;
//!
//! struct MyHost;
//!
//! impl AccessoryHost for MyHost {
//!     fn publish_accessory(&self, accessory: Accessory) -> Result<(), HostError> {
//!         println!("new outlet: {}", accessory.name());
//!         Ok(())
//!     }
//!
//!     fn unregister_accessory(&self, _id: AccessoryId) -> Result<(), HostError> {
//!         Ok(())
//!     }
//!
//!     fn update_characteristic(&self, id: AccessoryId, c: Characteristic, value: bool) {
//!         println!("{id}: {c} = {value}");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> tasmota_outlet::Result<()> {
//!     let config = PlatformConfig::from_json_str(
//!         r#"{"devices": [{"name": "Lamp", "host": "10.0.0.5", "refreshInterval": 5}]}"#,
//!     )?;
//!
//!     let platform = Platform::new(config, Arc::new(MyHost));
//!     platform.launch().await;
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//!     platform.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod accessory;
pub mod command;
pub mod config;
pub mod error;
mod platform;
pub mod poller;
pub mod protocol;
pub mod response;
pub mod types;

pub use accessory::{
    Accessory, AccessoryBinding, AccessoryHost, AccessoryId, Characteristic, OutletController,
};
pub use command::{Command, PowerCommand};
pub use config::{DeviceConfig, DeviceEntry, DeviceIdentity, PlatformConfig};
pub use error::{ConfigError, Error, HostError, ParseError, ProtocolError, Result, ValueError};
pub use platform::Platform;
pub use poller::{DevicePoller, PollPhase, PollState};
pub use protocol::{HttpClient, HttpConfig};
pub use response::PowerResponse;
pub use types::PowerState;
