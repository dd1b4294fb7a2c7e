//! Token lifecycle through the public API.

use std::time::Duration;

use identra_csrf::{CsrfConfig, TokenManager};

#[test]
fn issue_validate_once_then_reject_replay() {
    let manager = TokenManager::new(b"integration-signing-key", Duration::from_secs(600)).unwrap();

    let token = manager.create_token().unwrap();
    assert!(manager.is_valid(&token));
    assert!(!manager.is_valid(&token));
}

#[test]
fn carrier_names_flow_through_configuration() {
    let manager = TokenManager::with_config(
        b"integration-signing-key",
        CsrfConfig::default()
            .with_field_name("_csrf")
            .with_ttl(Duration::from_secs(600)),
    )
    .unwrap();

    assert_eq!(manager.config().field_name, "_csrf");
    let token = manager.create_token().unwrap();
    assert!(manager.is_valid(&token));
}
