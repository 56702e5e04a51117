// SPDX-License-Identifier: MIT OR Apache-2.0

//! High-level AMT power-management client.

use secrecy::SecretString;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::Result;
use crate::runtime::RetryConfig;
use crate::wsman::{self, PowerState};

pub mod connection;
mod executor;
pub mod resolver;

pub use connection::ConnectionContext;
pub use executor::RequestExecutor;

#[cfg(test)]
mod tests;

/// Default WS-Management port for plain-HTTP AMT.
pub const DEFAULT_AMT_PORT: u16 = 16992;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default retry budget for transient network faults.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Transport scheme used to reach the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    /// Plain HTTP (AMT default, port 16992).
    #[default]
    Http,
    /// HTTPS (typically port 16993).
    Https,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Http => write!(f, "http"),
            Protocol::Https => write!(f, "https"),
        }
    }
}

impl FromStr for Protocol {
    type Err = crate::error::AmtError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            other => Err(crate::error::AmtError::Config(format!(
                "Unknown protocol {other:?}, expected \"http\" or \"https\""
            ))),
        }
    }
}

/// Connection settings for one AMT device.
///
/// Host and credentials are required; everything else defaults to the
/// values AMT deployments commonly run with. The configuration is immutable
/// once a client is constructed.
#[derive(Clone)]
pub struct AmtClientConfig {
    /// Device hostname or IP literal.
    pub host: String,
    /// WS-Management port.
    pub port: u16,
    /// Digest username.
    pub username: String,
    /// Digest password.
    pub password: SecretString,
    /// Transport scheme.
    pub protocol: Protocol,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry budget for transient network faults.
    pub max_retries: u32,
    /// Verify the device TLS certificate (off by default: AMT ships
    /// self-signed certificates).
    pub verify_certificates: bool,
    /// Restrict resolution and sockets to IPv4.
    pub force_ipv4: bool,
}

impl AmtClientConfig {
    /// Create a configuration with the standard AMT defaults.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_AMT_PORT,
            username: username.into(),
            password,
            protocol: Protocol::default(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            verify_certificates: false,
            force_ipv4: true,
        }
    }

    /// Set the WS-Management port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the transport scheme.
    #[must_use]
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry budget.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Enable or disable TLS certificate verification.
    #[must_use]
    pub fn with_verify_certificates(mut self, verify: bool) -> Self {
        self.verify_certificates = verify;
        self
    }

    /// Enable or disable forced IPv4 resolution.
    #[must_use]
    pub fn with_force_ipv4(mut self, force: bool) -> Self {
        self.force_ipv4 = force;
        self
    }
}

impl std::fmt::Debug for AmtClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmtClientConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("protocol", &self.protocol)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("verify_certificates", &self.verify_certificates)
            .field("force_ipv4", &self.force_ipv4)
            .finish()
    }
}

/// Client for Intel AMT out-of-band power management.
///
/// # Example
///
/// ```no_run
/// use amt_power_rs::{AmtClient, AmtClientConfig};
/// use secrecy::SecretString;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AmtClientConfig::new(
///     "amt-device.lab",
///     "admin",
///     SecretString::new("Passw0rd!".to_string()),
/// );
/// let client = AmtClient::new(config);
///
/// if client.power_on().await? {
///     println!("Device is powering on");
/// }
/// let state = client.get_power_state().await?;
/// println!("Power state code: {state}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AmtClient {
    executor: RequestExecutor,
}

impl AmtClient {
    /// Create a client with the protocol-default retry behavior
    /// (`2^attempt`-second backoff).
    #[must_use]
    pub fn new(config: AmtClientConfig) -> Self {
        let retry = RetryConfig::new(config.max_retries);
        Self::with_retry(config, retry)
    }

    /// Create a client with a custom retry configuration. The attempt
    /// budget comes from `retry`, overriding `config.max_retries`.
    #[must_use]
    pub fn with_retry(config: AmtClientConfig, retry: RetryConfig) -> Self {
        Self {
            executor: RequestExecutor::new(config, retry),
        }
    }

    /// Request a power-state transition.
    ///
    /// Returns `Ok(true)` iff the device answered with a zero `ReturnValue`.
    /// A well-formed rejection (non-zero return code) is `Ok(false)`; only
    /// network and HTTP-level faults surface as errors.
    pub async fn change_power_state(&self, state: PowerState) -> Result<bool> {
        info!(%state, "Requesting power state change");
        let request = wsman::envelope::power_state_change(state);
        let body = self.executor.send(&request).await?;
        let succeeded = wsman::change_succeeded(&body);
        info!(%state, succeeded, "Power state change completed");
        Ok(succeeded)
    }

    /// Power the device on.
    pub async fn power_on(&self) -> Result<bool> {
        self.change_power_state(PowerState::On).await
    }

    /// Power the device off.
    pub async fn power_off(&self) -> Result<bool> {
        self.change_power_state(PowerState::Off).await
    }

    /// Power-cycle the device.
    pub async fn reset(&self) -> Result<bool> {
        self.change_power_state(PowerState::Reset).await
    }

    /// Query the current power state.
    ///
    /// Returns the CIM power-state code, or [`wsman::POWER_STATE_UNKNOWN`]
    /// when the response carries no parseable `PowerState` element.
    pub async fn get_power_state(&self) -> Result<i32> {
        let request = wsman::envelope::get_power_state();
        let body = self.executor.send(&request).await?;
        Ok(wsman::parse_power_state(&body))
    }

    /// Exercise the full authentication and transport path.
    ///
    /// Runs a power-state query and reports plain success or failure;
    /// the underlying error is logged, never propagated.
    pub async fn test_connection(&self) -> bool {
        match self.get_power_state().await {
            Ok(state) => {
                info!(state, "Connection test succeeded");
                true
            }
            Err(err) => {
                warn!(%err, "Connection test failed");
                false
            }
        }
    }
}
