// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Poll phase state machine and the cached device state.

use chrono::{DateTime, Utc};

/// Reachability phase of a polled device.
///
/// ```text
///            InfoFetched          StateFetched
/// Unknown ───────────────► InfoKnown ───────────► StateKnown ──┐
///    ▲                        │                       ▲        │ StateFetched
///    └──── RequestFailed ─────┴───────────────────────┴────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PollPhase {
    /// Nothing confirmed; the next cycle runs discovery.
    #[default]
    Unknown,
    /// Discovery succeeded; state has not been read yet.
    InfoKnown,
    /// State was read by the last cycle.
    StateKnown,
}

/// Outcome of one poll phase, fed into [`PollPhase::transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollEvent {
    /// The discovery request succeeded.
    InfoFetched,
    /// The state request succeeded.
    StateFetched,
    /// A request failed at the transport level.
    RequestFailed,
}

impl PollPhase {
    /// Returns the phase that follows `event`.
    ///
    /// A successful discovery never downgrades a device whose state is
    /// already known. A successful state read proves reachability on its
    /// own, so it lands in `StateKnown` from any phase.
    #[must_use]
    pub const fn transition(self, event: PollEvent) -> Self {
        match (self, event) {
            (_, PollEvent::RequestFailed) => Self::Unknown,
            (Self::StateKnown, PollEvent::InfoFetched) => Self::StateKnown,
            (_, PollEvent::InfoFetched) => Self::InfoKnown,
            (_, PollEvent::StateFetched) => Self::StateKnown,
        }
    }

    /// Returns true once discovery has succeeded.
    #[must_use]
    pub const fn info_known(self) -> bool {
        matches!(self, Self::InfoKnown | Self::StateKnown)
    }

    /// Returns true if the last state read succeeded.
    #[must_use]
    pub const fn state_known(self) -> bool {
        matches!(self, Self::StateKnown)
    }
}

/// Snapshot of what the poller knows about its device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollState {
    phase: PollPhase,
    power_on: bool,
    published: bool,
    last_update: Option<DateTime<Utc>>,
}

impl PollState {
    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    /// Returns true once discovery has succeeded.
    #[must_use]
    pub fn info_known(&self) -> bool {
        self.phase.info_known()
    }

    /// Returns true if the last state read succeeded.
    #[must_use]
    pub fn state_known(&self) -> bool {
        self.phase.state_known()
    }

    /// Returns the last observed power value, `false` if never read.
    ///
    /// The value survives failures so the host keeps showing it.
    #[must_use]
    pub fn power_on(&self) -> bool {
        self.power_on
    }

    /// Returns the power value only while it is confirmed by the last cycle.
    #[must_use]
    pub fn known_power(&self) -> Option<bool> {
        self.state_known().then_some(self.power_on)
    }

    /// Returns true once the accessory has been registered with the host.
    #[must_use]
    pub fn accessory_published(&self) -> bool {
        self.published
    }

    /// Returns the time of the last successful state read.
    #[must_use]
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub(crate) fn apply(&mut self, event: PollEvent) {
        self.phase = self.phase.transition(event);
    }

    pub(crate) fn record_power(&mut self, on: bool) {
        self.apply(PollEvent::StateFetched);
        self.power_on = on;
        self.last_update = Some(Utc::now());
    }

    /// Returns true if the flag changed.
    pub(crate) fn mark_published(&mut self) -> bool {
        !std::mem::replace(&mut self.published, true)
    }
}
