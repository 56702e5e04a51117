// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hostname resolution for the session target.
//!
//! The client pins each session to one resolved address so that Digest
//! challenges, keep-alive connections, and retries all talk to the same
//! device. Resolution runs again before every retry, picking up DNS changes
//! between attempts.

use std::net::IpAddr;
use tracing::debug;

use crate::error::{AmtError, Result};

/// Resolve `host` to a single IP address.
///
/// With `force_ipv4` set, only A records are considered; an AAAA-only name
/// fails with [`AmtError::Resolution`]. Otherwise the system-preferred
/// address family wins. No result is cached here.
pub async fn resolve(host: &str, port: u16, force_ipv4: bool) -> Result<IpAddr> {
    let addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| AmtError::Resolution {
            host: host.to_string(),
            reason: e.to_string(),
        })?;

    let ip = addrs
        .map(|addr| addr.ip())
        .find(|ip| !force_ipv4 || ip.is_ipv4())
        .ok_or_else(|| AmtError::Resolution {
            host: host.to_string(),
            reason: if force_ipv4 {
                "no IPv4 address found".to_string()
            } else {
                "no address found".to_string()
            },
        })?;

    debug!(host, %ip, "Resolved device address");
    Ok(ip)
}
