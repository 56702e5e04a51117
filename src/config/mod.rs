// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration management for AMT clients
//!
//! This module loads client configuration from the on-disk config file
//! (typically `~/.amt/config`) and from `AMT_*` environment variables.
//!
//! # Environment Variables
//!
//! - `AMT_CONFIG` - Path to the config file (default: `~/.amt/config`)
//! - `AMT_DEVICE` - Override the active device name
//! - `AMT_HOST`, `AMT_PORT`, `AMT_PROTOCOL` - Override the endpoint
//! - `AMT_USERNAME`, `AMT_PASSWORD` - Override the Digest credentials
//! - `AMT_VERIFY_CERTS`, `AMT_FORCE_IPV4` - Override transport flags

mod amtconfig;

pub use amtconfig::{
    AmtConfig, AmtDevice, ENV_AMT_CONFIG, ENV_AMT_DEVICE, ENV_AMT_FORCE_IPV4, ENV_AMT_HOST,
    ENV_AMT_PASSWORD, ENV_AMT_PORT, ENV_AMT_PROTOCOL, ENV_AMT_USERNAME, ENV_AMT_VERIFY_CERTS,
};
