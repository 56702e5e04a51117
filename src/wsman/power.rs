// SPDX-License-Identifier: MIT OR Apache-2.0

//! CIM power-state vocabulary and response-body evaluation.
//!
//! The state codes follow the `CIM_PowerManagementService.RequestPowerStateChange`
//! vocabulary (DMTF DSP1027). Responses are evaluated as raw text: AMT
//! firmware emits small, fixed-shape envelopes and the client deliberately
//! checks the literal `ReturnValue` / `PowerState` elements instead of
//! running a full XML parser.

use regex::Regex;
use std::sync::OnceLock;

/// Sentinel returned when a status response carries no parseable
/// `PowerState` element.
pub const POWER_STATE_UNKNOWN: i32 = -1;

/// Power state requested from `CIM_PowerManagementService`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Power the system on.
    On,
    /// Power the system off (hard off).
    Off,
    /// Power-cycle / reset the system.
    Reset,
}

impl PowerState {
    /// The numeric code sent on the wire.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            PowerState::On => 2,
            PowerState::Off => 8,
            PowerState::Reset => 10,
        }
    }
}

impl From<PowerState> for i32 {
    fn from(state: PowerState) -> Self {
        state.code()
    }
}

impl std::fmt::Display for PowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PowerState::On => write!(f, "power-on"),
            PowerState::Off => write!(f, "power-off"),
            PowerState::Reset => write!(f, "reset"),
        }
    }
}

/// Literal marker for a zero `ReturnValue` in a state-change response.
const RETURN_VALUE_SUCCESS: &str = "ReturnValue>0</";

/// Whether a `RequestPowerStateChange` response body reports success.
///
/// Success is exactly a `ReturnValue` element equal to zero. Any other
/// body content, including a non-zero return code, is a plain `false`;
/// only transport and HTTP-level faults are errors.
#[must_use]
pub fn change_succeeded(body: &str) -> bool {
    body.contains(RETURN_VALUE_SUCCESS)
}

fn power_state_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<(?:[A-Za-z0-9]+:)?PowerState>(-?\d+)<").expect("power state regex")
    })
}

/// Extract the first `PowerState` element from a status response body.
///
/// Returns [`POWER_STATE_UNKNOWN`] when no such element is present or its
/// content is not an integer. The caller interprets that as "unknown",
/// not as a failure.
#[must_use]
pub fn parse_power_state(body: &str) -> i32 {
    power_state_re()
        .captures(body)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .unwrap_or(POWER_STATE_UNKNOWN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_state_codes() {
        assert_eq!(PowerState::On.code(), 2);
        assert_eq!(PowerState::Off.code(), 8);
        assert_eq!(PowerState::Reset.code(), 10);
    }

    #[test]
    fn test_change_succeeded_on_zero_return_value() {
        let body = "<g:RequestPowerStateChange_OUTPUT><g:ReturnValue>0</g:ReturnValue></g:RequestPowerStateChange_OUTPUT>";
        assert!(change_succeeded(body));
    }

    #[test]
    fn test_change_rejected_on_nonzero_return_value() {
        let body = "<g:ReturnValue>2</g:ReturnValue>";
        assert!(!change_succeeded(body));
        assert!(!change_succeeded("<SoapFault/>"));
        assert!(!change_succeeded(""));
    }

    #[test]
    fn test_parse_power_state() {
        assert_eq!(parse_power_state("<r:PowerState>8</r:PowerState>"), 8);
        assert_eq!(parse_power_state("<h:PowerState>2</h:PowerState>"), 2);
    }

    #[test]
    fn test_parse_power_state_takes_first_element() {
        let body = "<h:PowerState>2</h:PowerState><h:PowerState>8</h:PowerState>";
        assert_eq!(parse_power_state(body), 2);
    }

    #[test]
    fn test_parse_power_state_ignores_requested_power_state() {
        let body = "<h:RequestedPowerState>10</h:RequestedPowerState><h:PowerState>8</h:PowerState>";
        assert_eq!(parse_power_state(body), 8);
    }

    #[test]
    fn test_parse_power_state_missing_is_unknown() {
        assert_eq!(parse_power_state("<s:Envelope/>"), POWER_STATE_UNKNOWN);
        assert_eq!(parse_power_state(""), POWER_STATE_UNKNOWN);
    }
}
