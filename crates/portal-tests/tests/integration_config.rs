// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Configuration Integration Tests
//!
//! Integration tests for portal-config:
//!
//! - Parsing the same document in YAML, TOML and JSON
//! - Validation of the SSO, AI and security sections
//! - Placeholder resolution in files
//! - Building application state from a loaded file
//!
//! ## Test Categories
//!
//! - `test_config_parse_*`: Parsing tests
//! - `test_config_validation_*`: Validation tests
//! - `test_config_env_*`: Environment tests
//! - `test_config_state_*`: Wiring into the API state

use std::io::Write;

use portal_api::AppState;
use portal_config::{
    ConfigError, ConfigFormat, ConfigLoader, Environment, LogFormat, LogLevel, PortalConfig,
};
use portal_tests::prelude::*;

// =============================================================================
// Test Helpers
// =============================================================================

fn loader() -> ConfigLoader {
    ConfigLoader::new().with_env_vars(false)
}

fn write_config(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("create config file");
    file.write_all(content.as_bytes()).expect("write config file");
    path
}

// =============================================================================
// Parsing Tests
// =============================================================================

#[test]
fn test_config_parse_full_yaml() {
    let config = loader()
        .load_from_str(&ConfigFixtures::full_yaml(), ConfigFormat::Yaml)
        .unwrap();

    assert_eq!(config.server.port, 9090);
    assert_eq!(config.server.environment, Environment::Development);
    assert!(config.server.cors.allow_credentials);
    assert_eq!(config.security.jwt.issuer, "portal-test");
    assert_eq!(config.security.jwt.expiration_secs, 600);
    assert_eq!(config.security.rate_limit.max_requests, 5);
    assert_eq!(config.security.rate_limit.window_secs, 10);
    assert!(config.sso.enabled);
    assert_eq!(config.sso.algorithms, vec!["RS256".to_string()]);
    assert_eq!(config.sso.role_claim, "role");
    assert!(config.sso.jwks_cache_ttl().is_none());
    assert_eq!(
        config.ai.endpoint(),
        "https://ai.sekolah.test/v1beta/models/gemini-1.5-flash:generateContent"
    );
    assert_eq!(config.ai.api_key.as_ref().map(|k| k.expose()), Some("ai-key"));
    assert_eq!(config.logging.level, LogLevel::Debug);
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_config_parse_defaults() {
    let config = loader()
        .load_from_str(&ConfigFixtures::minimal_yaml(), ConfigFormat::Yaml)
        .unwrap();

    assert_eq!(config.server.environment, Environment::Production);
    assert!(config.security.rate_limit.enabled);
    assert_eq!(config.security.rate_limit.max_requests, 30);
    assert_eq!(config.security.rate_limit.window_secs, 60);
    assert_eq!(config.matching.student_min_length, 10);
    assert_eq!(config.matching.staff_min_length, 8);
    assert!(!config.sso.enabled);
    assert!(!config.ai.enabled);
    assert!(config.warnings().is_empty());
}

#[test]
fn test_config_parse_formats_agree() {
    let dir = temp_test_dir("portal-config");
    let secret = TEST_SESSION_SECRET;

    let yaml = write_config(
        &dir,
        "portal.yaml",
        &format!("server:\n  port: 8181\nsecurity:\n  jwt:\n    secret: \"{}\"\n", secret),
    );
    let toml = write_config(
        &dir,
        "portal.toml",
        &format!("[server]\nport = 8181\n\n[security.jwt]\nsecret = \"{}\"\n", secret),
    );
    let json = write_config(
        &dir,
        "portal.json",
        &format!(
            r#"{{"server": {{"port": 8181}}, "security": {{"jwt": {{"secret": "{}"}}}}}}"#,
            secret
        ),
    );

    for path in [yaml, toml, json] {
        let config = loader().load(&path).unwrap();
        assert_eq!(config.server.port, 8181, "{}", path.display());
        assert_eq!(
            config.security.jwt.secret.as_ref().map(|s| s.expose()),
            Some(secret)
        );
    }
}

#[test]
fn test_config_parse_str_helper() {
    let json = format!(
        r#"{{"server": {{"port": 7070}}, "security": {{"jwt": {{"secret": "{}"}}}}}}"#,
        TEST_SESSION_SECRET
    );
    let config = portal_config::load_config_str(&json, ConfigFormat::Json).unwrap();
    assert_eq!(config.security.jwt.issuer, PortalConfig::default().security.jwt.issuer);
    assert!(config.security.jwt.secret.is_some());
}

#[test]
fn test_config_parse_rejects_unknown_sections() {
    let content = format!("{}\nsessions:\n  ttl: 5\n", ConfigFixtures::minimal_yaml());
    let result = loader().load_from_str(&content, ConfigFormat::Yaml);
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_config_validation_sso_requires_issuer_and_audience() {
    let mut config = ConfigFixtures::production();
    config.sso.enabled = true;
    config.sso.jwks_url = "https://idp.sekolah.test/jwks".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::MissingField { .. })));

    config.sso.issuer = "https://idp.sekolah.test".to_string();
    config.sso.audience = "portal".to_string();
    assert!(config.validate().is_ok());

    config.sso.algorithms = vec!["HS256".to_string()];
    assert!(matches!(config.validate(), Err(ConfigError::Validation { .. })));
}

#[test]
fn test_config_validation_ai_upstream_must_be_http() {
    let mut config = ConfigFixtures::production();
    config.ai.enabled = true;
    config.ai.upstream_url = "ftp://ai.sekolah.test".to_string();
    assert!(config.validate().is_err());

    config.ai.upstream_url = "http://127.0.0.1:9999".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation_missing_secret() {
    let config = PortalConfig::default();
    assert!(matches!(config.validate(), Err(ConfigError::MissingField { .. })));
}

#[test]
fn test_config_validation_warnings() {
    let mut config = ConfigFixtures::development();
    config.security.rate_limit.enabled = false;

    let warnings = config.warnings();
    assert!(warnings.iter().any(|w| w.contains("rate_limit")));
    assert!(warnings.iter().any(|w| w.contains("development")));
}

// =============================================================================
// Environment Tests
// =============================================================================

#[test]
fn test_config_env_placeholder_default_in_file() {
    let dir = temp_test_dir("portal-config-env");
    let path = write_config(
        &dir,
        "portal.yaml",
        &format!(
            "security:\n  jwt:\n    secret: \"${{PORTALIT_UNSET_SECRET:{}}}\"\n",
            TEST_SESSION_SECRET
        ),
    );

    let config = ConfigLoader::new()
        .with_env_prefix("PORTALIT_UNUSED_PREFIX")
        .load(&path)
        .unwrap();
    assert_eq!(
        config.security.jwt.secret.as_ref().map(|s| s.expose()),
        Some(TEST_SESSION_SECRET)
    );
}

#[test]
fn test_config_env_missing_file() {
    let dir = temp_test_dir("portal-config-missing");
    let result = loader().load(dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
}

// =============================================================================
// State Wiring Tests
// =============================================================================

#[tokio::test]
async fn test_config_state_builds_from_loaded_file() {
    let config = loader()
        .load_from_str(&ConfigFixtures::full_yaml(), ConfigFormat::Yaml)
        .unwrap();

    let state = AppState::builder().config(config).build().unwrap();
    assert!(state.sso.is_some());
    assert!(!state.is_production());
    assert_eq!(state.rate_limiter.window_secs(), 10);
    assert_eq!(state.jwt().issuer(), "portal-test");
    assert_eq!(state.jwt().expiration_secs(), 600);
}

#[tokio::test]
async fn test_config_state_requires_secret() {
    let result = AppState::builder().config(PortalConfig::default()).build();
    assert!(result.is_err());
}
