// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power commands.

use crate::command::Command;
use crate::types::PowerState;

/// Command to query or switch the outlet relay.
///
/// Single-relay outlets are addressed with the bare `Power` command, and the
/// set payload is the numeric form (`Power 1` / `Power 0`).
///
/// # Examples
///
/// ```
/// use tasmota_outlet::command::{Command, PowerCommand};
///
/// assert_eq!(PowerCommand::Query.to_http_command(), "Power");
/// assert_eq!(PowerCommand::on().to_http_command(), "Power 1");
/// assert_eq!(PowerCommand::off().to_http_command(), "Power 0");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerCommand {
    /// Query the current power state.
    Query,
    /// Set the power state.
    Set(PowerState),
}

impl PowerCommand {
    /// Creates a command to turn the outlet on.
    #[must_use]
    pub const fn on() -> Self {
        Self::Set(PowerState::On)
    }

    /// Creates a command to turn the outlet off.
    #[must_use]
    pub const fn off() -> Self {
        Self::Set(PowerState::Off)
    }
}

impl From<bool> for PowerCommand {
    fn from(on: bool) -> Self {
        Self::Set(PowerState::from(on))
    }
}

impl Command for PowerCommand {
    fn name(&self) -> String {
        "Power".to_string()
    }

    fn payload(&self) -> Option<String> {
        match self {
            Self::Query => None,
            Self::Set(state) => Some(state.as_num().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_command_query() {
        let cmd = PowerCommand::Query;
        assert_eq!(cmd.name(), "Power");
        assert_eq!(cmd.payload(), None);
    }

    #[test]
    fn power_command_from_bool() {
        assert_eq!(PowerCommand::from(true), PowerCommand::on());
        assert_eq!(PowerCommand::from(false).payload(), Some("0".to_string()));
    }
}
