// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tasmota_outlet::accessory::{Accessory, AccessoryHost, AccessoryId, Characteristic};
use tasmota_outlet::error::HostError;
use wiremock::MockServer;

/// Host double that records every call.
#[derive(Default)]
pub struct RecordingHost {
    published: Mutex<Vec<Accessory>>,
    unregistered: Mutex<Vec<AccessoryId>>,
    updates: Mutex<Vec<(AccessoryId, Characteristic, bool)>>,
    publish_delay: Duration,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Host whose registration blocks the calling thread for `delay`.
    pub fn with_publish_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            publish_delay: delay,
            ..Self::default()
        })
    }

    pub fn published(&self) -> Vec<Accessory> {
        self.published.lock().clone()
    }

    pub fn unregistered(&self) -> Vec<AccessoryId> {
        self.unregistered.lock().clone()
    }

    /// Values pushed for `OutletInUse`, in order.
    pub fn in_use_updates(&self) -> Vec<bool> {
        self.updates
            .lock()
            .iter()
            .filter(|(_, c, _)| *c == Characteristic::OutletInUse)
            .map(|(_, _, v)| *v)
            .collect()
    }
}

impl AccessoryHost for RecordingHost {
    fn publish_accessory(&self, accessory: Accessory) -> Result<(), HostError> {
        if !self.publish_delay.is_zero() {
            std::thread::sleep(self.publish_delay);
        }
        self.published.lock().push(accessory);
        Ok(())
    }

    fn unregister_accessory(&self, id: AccessoryId) -> Result<(), HostError> {
        self.unregistered.lock().push(id);
        Ok(())
    }

    fn update_characteristic(&self, id: AccessoryId, characteristic: Characteristic, value: bool) {
        self.updates.lock().push((id, characteristic, value));
    }
}

/// Host part of the mock server URI, e.g. `127.0.0.1:41234`.
pub fn mock_host(server: &MockServer) -> String {
    server.uri().replace("http://", "")
}

/// `cmnd` values of every request the server received, in order.
pub async fn received_commands(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|request| {
            request
                .url
                .query_pairs()
                .find(|(key, _)| key == "cmnd")
                .map(|(_, value)| value.into_owned())
        })
        .collect()
}
