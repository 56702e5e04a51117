// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection context: the resolved endpoint plus its configured HTTP agent.
//!
//! A context is an immutable value tied to one resolved address. Whenever
//! the host is re-resolved (first use, or before a retry) the executor
//! builds a whole new context instead of mutating the old one; requests
//! already in flight on a previous agent are unaffected.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::client::{AmtClientConfig, Protocol};
use crate::error::{AmtError, Result};

/// Path all WS-Management exchanges are addressed to.
pub const WSMAN_PATH: &str = "/wsman";

/// One resolved device endpoint with a reusable keep-alive HTTP agent.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    /// Address the session is pinned to.
    pub ip: IpAddr,
    /// Fully-qualified base URL, `{scheme}://{ip}:{port}/wsman`.
    pub base_url: Url,
    /// Keep-alive HTTP agent bound to the configured timeout and TLS policy.
    pub agent: reqwest::Client,
}

impl ConnectionContext {
    /// Build a context for `ip` from the session configuration.
    pub fn establish(ip: IpAddr, config: &AmtClientConfig) -> Result<Self> {
        let host_part = match ip {
            IpAddr::V4(v4) => v4.to_string(),
            IpAddr::V6(v6) => format!("[{v6}]"),
        };
        let base_url = Url::parse(&format!(
            "{}://{}:{}{}",
            config.protocol, host_part, config.port, WSMAN_PATH
        ))
        .map_err(|e| AmtError::Config(format!("Invalid endpoint URL: {e}")))?;

        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .tcp_keepalive(Duration::from_secs(60))
            .pool_idle_timeout(config.timeout);

        if config.force_ipv4 {
            // Binding the local side to 0.0.0.0 keeps the socket family IPv4.
            builder = builder.local_address(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        }

        if config.protocol == Protocol::Https {
            // AMT firmware negotiates TLS 1.2; pin to that single version.
            builder = builder
                .min_tls_version(reqwest::tls::Version::TLS_1_2)
                .max_tls_version(reqwest::tls::Version::TLS_1_2)
                .danger_accept_invalid_certs(!config.verify_certificates);
        }

        let agent = builder
            .build()
            .map_err(|e| AmtError::Config(format!("Failed to build HTTP agent: {e}")))?;

        debug!(%base_url, "Established connection context");
        Ok(Self {
            ip,
            base_url,
            agent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config() -> AmtClientConfig {
        AmtClientConfig::new("amt-device", "admin", SecretString::new("pw".to_string()))
    }

    #[tokio::test]
    async fn test_base_url_shape() {
        let context =
            ConnectionContext::establish(IpAddr::from([192, 168, 1, 50]), &config()).unwrap();
        assert_eq!(
            context.base_url.as_str(),
            "http://192.168.1.50:16992/wsman"
        );
    }

    #[tokio::test]
    async fn test_https_base_url() {
        let cfg = config().with_protocol(Protocol::Https).with_port(16993);
        let context = ConnectionContext::establish(IpAddr::from([10, 0, 0, 7]), &cfg).unwrap();
        assert_eq!(context.base_url.as_str(), "https://10.0.0.7:16993/wsman");
    }

    #[tokio::test]
    async fn test_ipv6_address_is_bracketed() {
        let cfg = config().with_force_ipv4(false);
        let ip: IpAddr = "fe80::1".parse().unwrap();
        let context = ConnectionContext::establish(ip, &cfg).unwrap();
        assert_eq!(context.base_url.as_str(), "http://[fe80::1]:16992/wsman");
    }

    #[tokio::test]
    async fn test_rebuild_is_idempotent() {
        let cfg = config();
        let ip = IpAddr::from([192, 168, 1, 50]);
        let first = ConnectionContext::establish(ip, &cfg).unwrap();
        let second = ConnectionContext::establish(ip, &cfg).unwrap();
        assert_eq!(first.base_url, second.base_url);
        assert_eq!(first.ip, second.ip);
    }
}
