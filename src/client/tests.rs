// SPDX-License-Identifier: MIT OR Apache-2.0

use super::*;
use secrecy::SecretString;

fn config() -> AmtClientConfig {
    AmtClientConfig::new("amt-device", "admin", SecretString::new("pw".to_string()))
}

#[test]
fn test_default_config() {
    let config = config();
    assert_eq!(config.host, "amt-device");
    assert_eq!(config.port, 16992);
    assert_eq!(config.protocol, Protocol::Http);
    assert_eq!(config.timeout, Duration::from_millis(5000));
    assert_eq!(config.max_retries, 3);
    assert!(!config.verify_certificates);
    assert!(config.force_ipv4);
}

#[test]
fn test_config_builders() {
    let config = config()
        .with_port(16993)
        .with_protocol(Protocol::Https)
        .with_timeout(Duration::from_secs(10))
        .with_max_retries(5)
        .with_verify_certificates(true)
        .with_force_ipv4(false);

    assert_eq!(config.port, 16993);
    assert_eq!(config.protocol, Protocol::Https);
    assert_eq!(config.timeout, Duration::from_secs(10));
    assert_eq!(config.max_retries, 5);
    assert!(config.verify_certificates);
    assert!(!config.force_ipv4);
}

#[test]
fn test_protocol_from_str() {
    assert_eq!("http".parse::<Protocol>().unwrap(), Protocol::Http);
    assert_eq!("HTTPS".parse::<Protocol>().unwrap(), Protocol::Https);
    assert!("ftp".parse::<Protocol>().is_err());
}

#[test]
fn test_protocol_display() {
    assert_eq!(Protocol::Http.to_string(), "http");
    assert_eq!(Protocol::Https.to_string(), "https");
}

#[test]
fn test_config_debug_redacts_password() {
    let rendered = format!("{:?}", config());
    assert!(rendered.contains("<redacted>"));
    assert!(!rendered.contains("pw"));
}

#[tokio::test]
async fn test_unresolvable_host_surfaces_resolution_error() {
    let config = AmtClientConfig::new(
        "definitely-not-a-real-host.invalid",
        "admin",
        SecretString::new("pw".to_string()),
    );
    let client = AmtClient::new(config);

    let err = client.get_power_state().await.unwrap_err();
    assert!(matches!(err, crate::error::AmtError::Resolution { .. }));
}

#[tokio::test]
async fn test_test_connection_swallows_failures() {
    let config = AmtClientConfig::new(
        "definitely-not-a-real-host.invalid",
        "admin",
        SecretString::new("pw".to_string()),
    );
    let client = AmtClient::new(config);

    assert!(!client.test_connection().await);
}
