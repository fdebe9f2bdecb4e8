//! Tests for the auth module

use super::*;
use base64::Engine;
use std::collections::HashMap;

#[test]
fn test_no_auth() {
    let auth = Authenticator::new(AuthConfig::None);
    let headers = auth.headers().unwrap();
    assert!(headers.is_empty());
}

#[test]
fn test_basic_auth() {
    let auth = Authenticator::new(AuthConfig::basic("user", "pass"));
    let headers = auth.headers().unwrap();

    let value = headers.get("Authorization").unwrap().to_str().unwrap();
    assert!(value.starts_with("Basic "));

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(value.trim_start_matches("Basic "))
        .unwrap();
    assert_eq!(String::from_utf8(decoded).unwrap(), "user:pass");
}

#[test]
fn test_bearer_auth() {
    let auth = Authenticator::new(AuthConfig::bearer("test_token"));
    let headers = auth.headers().unwrap();

    assert_eq!(headers.get("Authorization").unwrap(), "Bearer test_token");
    assert!(headers.get("Authorization").unwrap().is_sensitive());
}

#[test]
fn test_bearer_auth_empty_token() {
    let auth = Authenticator::new(AuthConfig::bearer(""));
    let err = auth.headers().unwrap_err();
    assert!(matches!(err, crate::error::Error::InvalidSession { .. }));
}

#[test]
fn test_bearer_auth_invalid_header_value() {
    let auth = Authenticator::new(AuthConfig::bearer("bad\ntoken"));
    let err = auth.headers().unwrap_err();
    assert!(matches!(err, crate::error::Error::InvalidSession { .. }));
}

#[test]
fn test_custom_headers() {
    let mut custom = HashMap::new();
    custom.insert("X-Tenant".to_string(), "contoso".to_string());
    custom.insert("Ocp-Apim-Subscription-Key".to_string(), "k-1".to_string());

    let auth = Authenticator::new(AuthConfig::CustomHeaders { headers: custom });
    let headers = auth.headers().unwrap();

    assert_eq!(headers.len(), 2);
    assert_eq!(headers.get("X-Tenant").unwrap(), "contoso");
    assert_eq!(headers.get("Ocp-Apim-Subscription-Key").unwrap(), "k-1");
}

#[test]
fn test_custom_headers_invalid_name() {
    let mut custom = HashMap::new();
    custom.insert("bad header".to_string(), "v".to_string());

    let auth = Authenticator::new(AuthConfig::CustomHeaders { headers: custom });
    assert!(auth.headers().is_err());
}

#[test]
fn test_authenticator_config() {
    let auth = Authenticator::new(AuthConfig::bearer("abc"));
    assert_eq!(auth.config(), &AuthConfig::bearer("abc"));
    assert_eq!(auth.config().kind(), "bearer");
}
