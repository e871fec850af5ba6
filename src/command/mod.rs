// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tasmota command definitions.
//!
//! A Tasmota command is a name (`Power`) and an optional payload (`1`). Over
//! HTTP both travel in the `cmnd` query parameter, separated by a space.

mod power;

pub use power::PowerCommand;

/// A command that can be sent to a Tasmota device.
pub trait Command {
    /// Returns the command name, e.g. `"Power"`.
    fn name(&self) -> String;

    /// Returns the command payload, if any.
    fn payload(&self) -> Option<String>;

    /// Returns the full command string for HTTP requests.
    ///
    /// Format: `<name> <payload>` or just `<name>` if no payload.
    fn to_http_command(&self) -> String {
        match self.payload() {
            Some(p) => format!("{} {}", self.name(), p),
            None => self.name(),
        }
    }
}
