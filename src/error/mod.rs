// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AmtError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to resolve host {host}: {reason}")]
    Resolution { host: String, reason: String },

    #[error("Digest challenge error: {0}")]
    AuthChallenge(String),

    #[error("Device rejected request with HTTP {status}: {body}")]
    Protocol { status: u16, body: String },

    #[error("Connection to {endpoint} failed after {attempts} attempts: {source}")]
    ConnectionExhausted {
        attempts: u32,
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, AmtError>;
