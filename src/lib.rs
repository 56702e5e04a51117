// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod client;
pub mod config;
pub mod error;
pub mod runtime;
pub mod wsman;

pub use client::{AmtClient, AmtClientConfig, Protocol};
pub use error::AmtError;
pub use wsman::{PowerState, POWER_STATE_UNKNOWN};
