// SPDX-License-Identifier: MIT OR Apache-2.0

//! WS-Management protocol layer: Digest authentication, SOAP envelope
//! rendering, and CIM power-state vocabulary.

pub mod digest;
pub mod envelope;
pub mod power;

pub use digest::{authorization_header, generate_cnonce, DigestAuthenticator, DigestChallenge};
pub use envelope::{WsmanRequest, ACTION_ENUMERATE, ACTION_POWER_STATE_CHANGE};
pub use power::{change_succeeded, parse_power_state, PowerState, POWER_STATE_UNKNOWN};
