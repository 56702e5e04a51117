// SPDX-License-Identifier: MIT OR Apache-2.0

//! SOAP 1.2 envelope rendering for the two WS-Management exchanges the
//! client performs.
//!
//! Envelope rendering is pure string templating: the schemas involved are
//! fixed, AMT is strict about element order, and a templating approach keeps
//! the wire bytes auditable. Each envelope carries a fresh `MessageID` so
//! repeated requests remain distinguishable on the device side.

use uuid::Uuid;

use super::power::PowerState;

const SOAP_ENV_NS: &str = "http://www.w3.org/2003/05/soap-envelope";
const WSA_NS: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing";
const WSMAN_NS: &str = "http://schemas.dmtf.org/wbem/wsman/1/wsman.xsd";
const WSEN_NS: &str = "http://schemas.xmlsoap.org/ws/2004/09/enumeration";

const WSA_ANONYMOUS: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing/role/anonymous";

const POWER_MGMT_SERVICE_URI: &str =
    "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/CIM_PowerManagementService";
const COMPUTER_SYSTEM_URI: &str =
    "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/CIM_ComputerSystem";
const ASSOCIATED_POWER_MGMT_URI: &str =
    "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/CIM_AssociatedPowerManagementService";

/// WS-Management action URI for `RequestPowerStateChange`.
pub const ACTION_POWER_STATE_CHANGE: &str = "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/CIM_PowerManagementService/RequestPowerStateChange";
/// WS-Enumeration action URI used for the power-state query.
pub const ACTION_ENUMERATE: &str = "http://schemas.xmlsoap.org/ws/2004/09/enumeration/Enumerate";

/// A rendered WS-Management request: SOAP body plus the action URI that
/// goes into the `SOAPAction` header.
#[derive(Debug, Clone)]
pub struct WsmanRequest {
    /// Action URI for the `SOAPAction` header.
    pub action: &'static str,
    /// Rendered SOAP 1.2 envelope.
    pub body: String,
}

/// Render the `RequestPowerStateChange` envelope for `state`.
///
/// The managed element selector addresses the `CIM_ComputerSystem` instance
/// named `ManagedSystem`, which is how AMT exposes the host platform.
#[must_use]
pub fn power_state_change(state: PowerState) -> WsmanRequest {
    let message_id = Uuid::new_v4();
    let body = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="{SOAP_ENV_NS}" xmlns:a="{WSA_NS}" xmlns:w="{WSMAN_NS}" xmlns:p="{POWER_MGMT_SERVICE_URI}">
  <s:Header>
    <a:To>/wsman</a:To>
    <w:ResourceURI s:mustUnderstand="true">{POWER_MGMT_SERVICE_URI}</w:ResourceURI>
    <a:ReplyTo>
      <a:Address s:mustUnderstand="true">{WSA_ANONYMOUS}</a:Address>
    </a:ReplyTo>
    <a:Action s:mustUnderstand="true">{ACTION_POWER_STATE_CHANGE}</a:Action>
    <a:MessageID>uuid:{message_id}</a:MessageID>
  </s:Header>
  <s:Body>
    <p:RequestPowerStateChange_INPUT>
      <p:PowerState>{code}</p:PowerState>
      <p:ManagedElement>
        <a:Address>{WSA_ANONYMOUS}</a:Address>
        <a:ReferenceParameters>
          <w:ResourceURI>{COMPUTER_SYSTEM_URI}</w:ResourceURI>
          <w:SelectorSet>
            <w:Selector Name="Name">ManagedSystem</w:Selector>
          </w:SelectorSet>
        </a:ReferenceParameters>
      </p:ManagedElement>
    </p:RequestPowerStateChange_INPUT>
  </s:Body>
</s:Envelope>"#,
        code = state.code(),
    );

    WsmanRequest {
        action: ACTION_POWER_STATE_CHANGE,
        body,
    }
}

/// Render the power-state query envelope.
///
/// Enumerates `CIM_AssociatedPowerManagementService` with optimized
/// enumeration so the single association instance comes back inline in the
/// Enumerate response.
#[must_use]
pub fn get_power_state() -> WsmanRequest {
    let message_id = Uuid::new_v4();
    let body = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="{SOAP_ENV_NS}" xmlns:a="{WSA_NS}" xmlns:w="{WSMAN_NS}" xmlns:e="{WSEN_NS}">
  <s:Header>
    <a:To>/wsman</a:To>
    <w:ResourceURI s:mustUnderstand="true">{ASSOCIATED_POWER_MGMT_URI}</w:ResourceURI>
    <a:ReplyTo>
      <a:Address s:mustUnderstand="true">{WSA_ANONYMOUS}</a:Address>
    </a:ReplyTo>
    <a:Action s:mustUnderstand="true">{ACTION_ENUMERATE}</a:Action>
    <a:MessageID>uuid:{message_id}</a:MessageID>
  </s:Header>
  <s:Body>
    <e:Enumerate>
      <w:OptimizeEnumeration/>
      <w:MaxElements>1</w:MaxElements>
    </e:Enumerate>
  </s:Body>
</s:Envelope>"#
    );

    WsmanRequest {
        action: ACTION_ENUMERATE,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_on_embeds_state_code() {
        let request = power_state_change(PowerState::On);
        assert!(request.body.contains("RequestPowerStateChange_INPUT"));
        assert!(request.body.contains("<p:PowerState>2</p:PowerState>"));
        assert_eq!(request.action, ACTION_POWER_STATE_CHANGE);
    }

    #[test]
    fn test_power_off_and_reset_codes() {
        assert!(power_state_change(PowerState::Off)
            .body
            .contains("<p:PowerState>8</p:PowerState>"));
        assert!(power_state_change(PowerState::Reset)
            .body
            .contains("<p:PowerState>10</p:PowerState>"));
    }

    #[test]
    fn test_change_envelope_addresses_managed_system() {
        let request = power_state_change(PowerState::On);
        assert!(request.body.contains("CIM_ComputerSystem"));
        assert!(request
            .body
            .contains(r#"<w:Selector Name="Name">ManagedSystem</w:Selector>"#));
    }

    #[test]
    fn test_query_envelope_targets_association_class() {
        let request = get_power_state();
        assert!(request.body.contains("CIM_AssociatedPowerManagementService"));
        assert_eq!(request.action, ACTION_ENUMERATE);
    }

    #[test]
    fn test_message_ids_are_distinct_per_call() {
        let first = get_power_state();
        let second = get_power_state();
        let id = |body: &str| {
            let start = body.find("uuid:").unwrap();
            body[start..start + 41].to_string()
        };
        assert_ne!(id(&first.body), id(&second.body));
    }
}
