// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power response parsing.

use serde::Deserialize;

use crate::types::PowerState;

/// Response from a `Power` command.
///
/// Tasmota answers `{"POWER": "ON"}` for single-relay devices. Every other
/// field is ignored.
///
/// # Examples
///
/// ```
/// use tasmota_outlet::response::PowerResponse;
///
/// let response: PowerResponse = serde_json::from_str(r#"{"POWER": "ON"}"#).unwrap();
/// assert!(response.is_on());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PowerResponse {
    #[serde(rename = "POWER", default)]
    power: Option<String>,
}

impl PowerResponse {
    /// Returns the reported power state, or `None` if the field is absent or
    /// holds something other than an on/off value.
    #[must_use]
    pub fn power_state(&self) -> Option<PowerState> {
        self.power.as_deref().and_then(|s| s.parse().ok())
    }

    /// Returns true only if the device reported `"ON"`.
    ///
    /// An absent or unrecognised `POWER` field counts as off.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.power_state().is_some_and(|state| state.is_on())
    }
}
