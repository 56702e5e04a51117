// SPDX-License-Identifier: MIT OR Apache-2.0

//! AMT device configuration file parser
//!
//! Parses the client config file (typically `~/.amt/config`), which holds
//! connection settings for one or more managed devices, and applies
//! environment-variable overrides on top.
//!
//! # Example
//!
//! ```no_run
//! use amt_power_rs::config::AmtConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client_config = AmtConfig::load_with_env()?;
//! println!("Target device: {}", client_config.host);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::client::{AmtClientConfig, Protocol};
use crate::error::{AmtError, Result};

/// Path to the config file (default: `~/.amt/config`).
pub const ENV_AMT_CONFIG: &str = "AMT_CONFIG";
/// Override the active device name.
pub const ENV_AMT_DEVICE: &str = "AMT_DEVICE";
/// Override (or supply without a file) the device host.
pub const ENV_AMT_HOST: &str = "AMT_HOST";
/// Override the device port.
pub const ENV_AMT_PORT: &str = "AMT_PORT";
/// Override the transport scheme (`http` or `https`).
pub const ENV_AMT_PROTOCOL: &str = "AMT_PROTOCOL";
/// Override the Digest username.
pub const ENV_AMT_USERNAME: &str = "AMT_USERNAME";
/// Override the Digest password.
pub const ENV_AMT_PASSWORD: &str = "AMT_PASSWORD";
/// Override certificate verification (`true`/`false`/`1`/`0`).
pub const ENV_AMT_VERIFY_CERTS: &str = "AMT_VERIFY_CERTS";
/// Override forced-IPv4 resolution (`true`/`false`/`1`/`0`).
pub const ENV_AMT_FORCE_IPV4: &str = "AMT_FORCE_IPV4";

/// Connection settings for a single device as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AmtDevice {
    /// Hostname or IP literal.
    pub host: String,

    /// Digest username.
    pub username: String,

    /// Digest password.
    pub password: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify_certificates: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_ipv4: Option<bool>,
}

/// The entire configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AmtConfig {
    /// The currently active device name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,

    /// Map of device names to their settings.
    pub devices: HashMap<String, AmtDevice>,
}

impl AmtConfig {
    /// Load configuration from the default location (`~/.amt/config`).
    pub fn load_default() -> Result<Self> {
        let config_path = Self::default_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            AmtError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| AmtError::Config(format!("Failed to parse config YAML: {e}")))
    }

    /// Get the default config file path (`~/.amt/config`).
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| AmtError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".amt").join("config"))
    }

    /// Get the config file path, respecting the `AMT_CONFIG` variable.
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(env_path) = std::env::var(ENV_AMT_CONFIG) {
            Ok(PathBuf::from(env_path))
        } else {
            Self::default_path()
        }
    }

    /// Get the currently active device entry.
    pub fn active_device(&self) -> Option<&AmtDevice> {
        self.device.as_ref().and_then(|name| self.devices.get(name))
    }

    /// Build an [`AmtClientConfig`] for a named device entry.
    pub fn client_config(&self, name: &str) -> Result<AmtClientConfig> {
        let device = self
            .devices
            .get(name)
            .ok_or_else(|| AmtError::Config(format!("Unknown device {name:?} in config")))?;
        device.to_client_config()
    }

    /// Build the effective client configuration: config file (if any)
    /// merged with `AMT_*` environment overrides.
    ///
    /// With `AMT_HOST`, `AMT_USERNAME`, and `AMT_PASSWORD` all set, no
    /// config file is required at all.
    pub fn load_with_env() -> Result<AmtClientConfig> {
        let env = EnvOverrides::capture()?;

        let base = match (&env.host, &env.username, &env.password) {
            (Some(host), Some(username), Some(password)) => AmtDevice {
                host: host.clone(),
                username: username.clone(),
                password: password.clone(),
                ..Default::default()
            },
            _ => {
                let config = Self::load_from_path(Self::config_path()?)?;
                let name = env
                    .device
                    .clone()
                    .or_else(|| config.device.clone())
                    .ok_or_else(|| {
                        AmtError::Config("No active device set in config or AMT_DEVICE".to_string())
                    })?;
                config
                    .devices
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| AmtError::Config(format!("Unknown device {name:?} in config")))?
            }
        };

        env.apply(base).to_client_config()
    }
}

impl AmtDevice {
    /// Convert a device entry into a client configuration, applying
    /// defaults for unset fields.
    pub fn to_client_config(&self) -> Result<AmtClientConfig> {
        let mut config = AmtClientConfig::new(
            self.host.clone(),
            self.username.clone(),
            secrecy::SecretString::new(self.password.clone()),
        );

        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        if let Some(protocol) = &self.protocol {
            config = config.with_protocol(protocol.parse::<Protocol>()?);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config = config.with_timeout(std::time::Duration::from_millis(timeout_ms));
        }
        if let Some(max_retries) = self.max_retries {
            config = config.with_max_retries(max_retries);
        }
        if let Some(verify) = self.verify_certificates {
            config = config.with_verify_certificates(verify);
        }
        if let Some(force) = self.force_ipv4 {
            config = config.with_force_ipv4(force);
        }

        Ok(config)
    }
}

struct EnvOverrides {
    device: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    protocol: Option<String>,
    username: Option<String>,
    password: Option<String>,
    verify_certificates: Option<bool>,
    force_ipv4: Option<bool>,
}

impl EnvOverrides {
    fn capture() -> Result<Self> {
        Ok(Self {
            device: std::env::var(ENV_AMT_DEVICE).ok(),
            host: std::env::var(ENV_AMT_HOST).ok(),
            port: match std::env::var(ENV_AMT_PORT) {
                Ok(raw) => Some(raw.parse::<u16>().map_err(|e| {
                    AmtError::Config(format!("Invalid {ENV_AMT_PORT} value {raw:?}: {e}"))
                })?),
                Err(_) => None,
            },
            protocol: std::env::var(ENV_AMT_PROTOCOL).ok(),
            username: std::env::var(ENV_AMT_USERNAME).ok(),
            password: std::env::var(ENV_AMT_PASSWORD).ok(),
            verify_certificates: parse_bool_env(ENV_AMT_VERIFY_CERTS)?,
            force_ipv4: parse_bool_env(ENV_AMT_FORCE_IPV4)?,
        })
    }

    fn apply(self, mut device: AmtDevice) -> AmtDevice {
        if let Some(host) = self.host {
            device.host = host;
        }
        if let Some(username) = self.username {
            device.username = username;
        }
        if let Some(password) = self.password {
            device.password = password;
        }
        if self.port.is_some() {
            device.port = self.port;
        }
        if self.protocol.is_some() {
            device.protocol = self.protocol;
        }
        if self.verify_certificates.is_some() {
            device.verify_certificates = self.verify_certificates;
        }
        if self.force_ipv4.is_some() {
            device.force_ipv4 = self.force_ipv4;
        }
        device
    }
}

fn parse_bool_env(name: &str) -> Result<Option<bool>> {
    match std::env::var(name) {
        Ok(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(Some(true)),
            "0" | "false" | "no" => Ok(Some(false)),
            other => Err(AmtError::Config(format!(
                "Invalid {name} value {other:?}, expected a boolean"
            ))),
        },
        Err(_) => Ok(None),
    }
}
