// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the outlet bridge.
//!
//! Errors are split by concern: configuration, device communication,
//! response parsing, value validation and the host accessory protocol.
//! Inside the poll loop none of them is fatal; they are logged and turned
//! into state transitions. Parse and value errors stay local to the calls
//! that produce them.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred while loading or validating configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Error occurred during protocol communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A poller was created outside a tokio runtime.
    #[error("no tokio runtime: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),

    /// The host rejected an accessory operation.
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// Device was not found in the platform.
    #[error("device not found: {0}")]
    DeviceNotFound(String),
}

/// Errors related to device configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The device entry has no name, or the name is blank.
    #[error("device name missing")]
    MissingName,

    /// Another device with the same name is already configured.
    #[error("duplicate device name: {0}")]
    DuplicateName(String),

    /// The refresh interval must be greater than zero.
    #[error("refresh interval must be greater than zero")]
    InvalidRefreshInterval,

    /// The request timeout must be greater than zero.
    #[error("request timeout must be greater than zero")]
    InvalidRequestTimeout,

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Read(#[from] std::io::Error),

    /// The configuration document is not valid JSON for the expected shape.
    #[error("invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors related to HTTP communication with the device.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The device answered with a non-success status.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,
}

/// Errors related to parsing device responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors related to value validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// An invalid power state string was provided.
    #[error("invalid power state: {0}")]
    InvalidPowerState(String),
}

/// Error reported by the host when it refuses an accessory operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    /// Creates a host error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        assert_eq!(ConfigError::MissingName.to_string(), "device name missing");
        assert_eq!(
            ConfigError::DuplicateName("Lamp".to_string()).to_string(),
            "duplicate device name: Lamp"
        );
    }

    #[test]
    fn error_from_config_error() {
        let err: Error = ConfigError::MissingName.into();
        assert!(matches!(err, Error::Config(ConfigError::MissingName)));
        assert_eq!(err.to_string(), "config error: device name missing");
    }

    #[test]
    fn protocol_error_display() {
        let err = ProtocolError::ConnectionFailed("HTTP 500 - Internal Server Error".into());
        assert_eq!(
            err.to_string(),
            "connection failed: HTTP 500 - Internal Server Error"
        );
        assert_eq!(
            ProtocolError::Timeout(10_000).to_string(),
            "request timed out after 10000 ms"
        );
    }

    #[test]
    fn runtime_error_from_missing_runtime() {
        let err: Error = tokio::runtime::Handle::try_current().unwrap_err().into();
        assert!(matches!(err, Error::Runtime(_)));
        assert!(err.to_string().starts_with("no tokio runtime"));
    }

    #[test]
    fn host_error_display() {
        let err: Error = HostError::new("bridge offline").into();
        assert_eq!(err.to_string(), "host error: bridge offline");
    }
}
