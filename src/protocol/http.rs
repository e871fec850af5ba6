// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP client for the Tasmota `/cm` endpoint.

use std::time::Duration;

use reqwest::Client;

use crate::command::Command;
use crate::error::ProtocolError;
use crate::protocol::CommandResponse;

/// Connection parameters for one outlet.
///
/// # Examples
///
/// ```
/// use tasmota_outlet::protocol::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::new("10.0.0.5")
///     .with_credentials("admin", "secret")
///     .with_timeout(Duration::from_secs(3));
/// assert_eq!(config.base_url(), "http://10.0.0.5");
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    host: String,
    credentials: Option<Credentials>,
    timeout: Duration,
}

impl HttpConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a new HTTP configuration for the specified host.
    ///
    /// The host may carry a port (`10.0.0.5:8080`) or a scheme
    /// (`http://10.0.0.5`); plain hosts are reached over `http`.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            credentials: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{host}")
        }
    }

    /// Creates an `HttpClient` from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the HTTP client cannot be created.
    pub fn into_client(self) -> Result<HttpClient, ProtocolError> {
        if self.host.trim().is_empty() {
            return Err(ProtocolError::InvalidAddress("host is required".to_string()));
        }

        let base_url = self.base_url();

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(HttpClient {
            base_url,
            client,
            credentials: self.credentials,
            timeout: self.timeout,
        })
    }
}

/// HTTP authentication credentials.
#[derive(Clone)]
pub struct Credentials {
    /// Username for authentication.
    pub username: String,
    /// Password for authentication.
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// HTTP client for one Tasmota device.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    client: Client,
    credentials: Option<Credentials>,
    timeout: Duration,
}

impl HttpClient {
    /// Returns the base URL of the device.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the URL for a command.
    pub(crate) fn build_url(&self, command: &str) -> String {
        let encoded_command = urlencoding::encode(command);

        match &self.credentials {
            Some(creds) => {
                format!(
                    "{}/cm?user={}&password={}&cmnd={}",
                    self.base_url,
                    urlencoding::encode(&creds.username),
                    urlencoding::encode(&creds.password),
                    encoded_command
                )
            }
            None => {
                format!("{}/cm?cmnd={}", self.base_url, encoded_command)
            }
        }
    }

    /// Sends a typed command to the device.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails, times out, or the device
    /// answers with a non-success status.
    pub async fn send_command<C: Command + Sync>(
        &self,
        command: &C,
    ) -> Result<CommandResponse, ProtocolError> {
        self.send_raw(&command.to_http_command()).await
    }

    /// Sends a raw command string to the device.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails, times out, or the device
    /// answers with a non-success status.
    pub async fn send_raw(&self, command: &str) -> Result<CommandResponse, ProtocolError> {
        let url = self.build_url(command);

        tracing::debug!(base_url = %self.base_url, command, "Sending HTTP command");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProtocolError::AuthenticationFailed);
        }

        if !response.status().is_success() {
            return Err(ProtocolError::ConnectionFailed(format!(
                "HTTP {} - {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        tracing::debug!(body = %body, "Received HTTP response");

        Ok(CommandResponse::new(body))
    }

    fn map_transport_error(&self, error: reqwest::Error) -> ProtocolError {
        if error.is_timeout() {
            let millis = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
            ProtocolError::Timeout(millis)
        } else {
            ProtocolError::Http(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::PowerCommand;

    #[test]
    fn build_url_without_auth() {
        let client = HttpConfig::new("192.168.1.100").into_client().unwrap();
        let url = client.build_url("Power");
        assert_eq!(url, "http://192.168.1.100/cm?cmnd=Power");
    }

    #[test]
    fn build_url_with_auth() {
        let client = HttpConfig::new("10.0.0.5")
            .with_credentials("admin", "pass")
            .into_client()
            .unwrap();
        let url = client.build_url(&PowerCommand::on().to_http_command());
        assert_eq!(
            url,
            "http://10.0.0.5/cm?user=admin&password=pass&cmnd=Power%201"
        );
    }

    #[test]
    fn build_url_encodes_credentials() {
        let client = HttpConfig::new("10.0.0.5")
            .with_credentials("admin", "p&ss word")
            .into_client()
            .unwrap();
        let url = client.build_url("Power 0");
        assert_eq!(
            url,
            "http://10.0.0.5/cm?user=admin&password=p%26ss%20word&cmnd=Power%200"
        );
    }

    #[test]
    fn base_url_keeps_scheme_and_port() {
        assert_eq!(
            HttpConfig::new("https://outlet.local/").base_url(),
            "https://outlet.local"
        );
        assert_eq!(
            HttpConfig::new("10.0.0.5:8080").base_url(),
            "http://10.0.0.5:8080"
        );
    }

    #[test]
    fn into_client_rejects_empty_host() {
        let result = HttpConfig::new("  ").into_client();
        assert!(matches!(result, Err(ProtocolError::InvalidAddress(_))));
    }

    #[test]
    fn http_config_default_timeout() {
        let config = HttpConfig::new("10.0.0.5");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.host(), "10.0.0.5");
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials {
            username: "admin".to_string(),
            password: "secret".to_string(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("admin"));
        assert!(!debug.contains("secret"));
    }
}
