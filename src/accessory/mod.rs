// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host-side accessory model.
//!
//! The automation host owns the real accessory objects. This module only
//! describes what an outlet looks like to it ([`Accessory`]) and the
//! operations the host must offer ([`AccessoryHost`]). The host receives an
//! [`OutletController`] with each accessory and calls it to serve reads and
//! writes of the `On` and `OutletInUse` characteristics.
//!
//! # Implementing a host
//!
//! ```
//! use std::sync::Arc;
//! use tasmota_outlet::accessory::{Accessory, AccessoryHost, AccessoryId, Characteristic};
//! use tasmota_outlet::error::HostError;
//!
//! struct LoggingHost;
//!
//! impl AccessoryHost for LoggingHost {
//!     fn publish_accessory(&self, accessory: Accessory) -> Result<(), HostError> {
//!         println!("publish {} ({})", accessory.name(), accessory.id());
//!         Ok(())
//!     }
//!
//!     fn unregister_accessory(&self, id: AccessoryId) -> Result<(), HostError> {
//!         println!("unregister {id}");
//!         Ok(())
//!     }
//!
//!     fn update_characteristic(&self, id: AccessoryId, characteristic: Characteristic, value: bool) {
//!         println!("{id}: {characteristic} = {value}");
//!     }
//! }
//!
//! let host: Arc<dyn AccessoryHost> = Arc::new(LoggingHost);
//! ```

mod binding;

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::config::DeviceIdentity;
use crate::error::HostError;

pub use binding::AccessoryBinding;

/// Namespace for name-derived accessory identifiers.
const ACCESSORY_NAMESPACE: Uuid = Uuid::from_u128(0x6b1e_2f0a_8c4d_5e3f_9a7b_1c2d_3e4f_5a6b);

/// Stable identifier of an accessory.
///
/// Derived from the device name with UUID v5, so the same name always maps
/// to the same accessory across restarts.
///
/// # Examples
///
/// ```
/// use tasmota_outlet::accessory::AccessoryId;
///
/// assert_eq!(AccessoryId::from_name("Lamp"), AccessoryId::from_name("Lamp"));
/// assert_ne!(AccessoryId::from_name("Lamp"), AccessoryId::from_name("Heater"));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessoryId(Uuid);

impl AccessoryId {
    /// Derives the identifier for a device name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self(Uuid::new_v5(&ACCESSORY_NAMESPACE, name.as_bytes()))
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Debug for AccessoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = &self.0.to_string()[..8];
        write!(f, "AccessoryId({short}...)")
    }
}

impl fmt::Display for AccessoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host category the accessory is filed under.
///
/// Outlets are filed as generic accessories; the host picks the outlet
/// presentation from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessoryCategory {
    /// Generic accessory.
    #[default]
    Other,
}

/// Boolean characteristics exposed by the outlet service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Characteristic {
    /// Relay state, readable and writable.
    On,
    /// Whether the outlet is in use, read-only and push-updated.
    OutletInUse,
}

/// Access rights of a characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permissions {
    /// The host may read the value.
    pub read: bool,
    /// The host may write the value.
    pub write: bool,
    /// The value is pushed to subscribers when it changes.
    pub notify: bool,
}

impl Characteristic {
    /// Returns the access rights of this characteristic.
    #[must_use]
    pub const fn permissions(self) -> Permissions {
        match self {
            Self::On => Permissions {
                read: true,
                write: true,
                notify: true,
            },
            Self::OutletInUse => Permissions {
                read: true,
                write: false,
                notify: true,
            },
        }
    }

    /// Returns the characteristic name as the host knows it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "On",
            Self::OutletInUse => "OutletInUse",
        }
    }
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static information service of an accessory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessoryInformation {
    /// Display name.
    pub name: String,
    /// Manufacturer, model, serial and firmware.
    pub identity: DeviceIdentity,
}

/// The outlet service with its characteristics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutletService {
    /// Service display name.
    pub name: String,
    /// Subtype distinguishing this service within the accessory.
    pub subtype: String,
    /// Characteristics in declaration order.
    pub characteristics: Vec<Characteristic>,
}

/// Read and write handlers the host calls for an outlet.
///
/// Implementations must return without waiting on the device.
pub trait OutletController: Send + Sync {
    /// Serves a read of `On`.
    fn get_on(&self) -> bool;

    /// Serves a write of `On`.
    fn set_on(&self, on: bool);

    /// Serves a read of `OutletInUse`.
    fn get_in_use(&self) -> bool;
}

/// An outlet accessory ready to be registered with the host.
#[derive(Clone)]
pub struct Accessory {
    id: AccessoryId,
    category: AccessoryCategory,
    information: AccessoryInformation,
    outlet: OutletService,
    initial_on: bool,
    controller: Arc<dyn OutletController>,
}

impl Accessory {
    /// Subtype of the outlet service.
    pub const OUTLET_SUBTYPE: &'static str = "tasmotaService";

    /// Describes an outlet accessory for `name`.
    #[must_use]
    pub fn outlet(
        name: &str,
        identity: DeviceIdentity,
        initial_on: bool,
        controller: Arc<dyn OutletController>,
    ) -> Self {
        Self {
            id: AccessoryId::from_name(name),
            category: AccessoryCategory::Other,
            information: AccessoryInformation {
                name: name.to_string(),
                identity,
            },
            outlet: OutletService {
                name: name.to_string(),
                subtype: Self::OUTLET_SUBTYPE.to_string(),
                characteristics: vec![Characteristic::On, Characteristic::OutletInUse],
            },
            initial_on,
            controller,
        }
    }

    /// Returns the stable identifier.
    #[must_use]
    pub fn id(&self) -> AccessoryId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.information.name
    }

    /// Returns the host category.
    #[must_use]
    pub fn category(&self) -> AccessoryCategory {
        self.category
    }

    /// Returns the information service.
    #[must_use]
    pub fn information(&self) -> &AccessoryInformation {
        &self.information
    }

    /// Returns the outlet service.
    #[must_use]
    pub fn outlet_service(&self) -> &OutletService {
        &self.outlet
    }

    /// Returns the power state observed when the accessory was published.
    #[must_use]
    pub fn initial_on(&self) -> bool {
        self.initial_on
    }

    /// Returns the handlers for characteristic reads and writes.
    #[must_use]
    pub fn controller(&self) -> &Arc<dyn OutletController> {
        &self.controller
    }
}

impl fmt::Debug for Accessory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessory")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("information", &self.information)
            .field("outlet", &self.outlet)
            .field("initial_on", &self.initial_on)
            .finish_non_exhaustive()
    }
}

/// Accessory registration facility provided by the automation host.
///
/// Implementations are injected into every poller; nothing in this crate
/// reaches for a process-wide host.
pub trait AccessoryHost: Send + Sync {
    /// Registers an accessory. Called at most once per device.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if the host refuses the accessory; the poller
    /// retries after its next successful state read.
    fn publish_accessory(&self, accessory: Accessory) -> Result<(), HostError>;

    /// Removes a previously published accessory.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if the host cannot remove it.
    fn unregister_accessory(&self, id: AccessoryId) -> Result<(), HostError>;

    /// Pushes a new characteristic value to subscribed observers.
    fn update_characteristic(&self, id: AccessoryId, characteristic: Characteristic, value: bool);
}
