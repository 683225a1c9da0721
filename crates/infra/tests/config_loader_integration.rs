//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files.

use std::io::Write;

use gqlink_infra::config;
use gqlink_infra::GraphqlClient;
use tempfile::{Builder, NamedTempFile};

fn config_file(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).expect("Failed to write to temp file");
    file
}

#[test]
fn test_load_config_from_json_file() {
    let file = config_file(
        ".json",
        r#"{
            "endpoint": "https://api.example.com/graphql",
            "batch": { "max_batch_size": 20, "interval_ms": 15 },
            "auth": { "login_path": "/account/login", "expiry_leeway_secs": 30 },
            "timeout_secs": 10,
            "user_agent": "gqlink-tests"
        }"#,
    );

    let config = config::load_from_file(Some(file.path().to_path_buf()))
        .expect("Failed to load config from JSON file");

    assert_eq!(config.endpoint, "https://api.example.com/graphql");
    assert_eq!(config.batch.max_batch_size, 20);
    assert_eq!(config.batch.interval_ms, 15);
    assert_eq!(config.auth.login_path, "/account/login");
    assert_eq!(config.auth.expiry_leeway_secs, 30);
    assert_eq!(config.auth.invalid_credential_code, "invalid-jwt");
    assert_eq!(config.timeout_secs, 10);
    assert_eq!(config.user_agent.as_deref(), Some("gqlink-tests"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_config_from_toml_file() {
    let file = config_file(
        ".toml",
        r#"
endpoint = "http://localhost:8080/graphql"

[batch]
max_batch_size = 5

[auth]
invalid_credential_code = "token-expired"
"#,
    );

    let config = config::load_from_file(Some(file.path().to_path_buf()))
        .expect("Failed to load config from TOML file");

    assert_eq!(config.endpoint, "http://localhost:8080/graphql");
    assert_eq!(config.batch.max_batch_size, 5);
    assert_eq!(config.batch.interval_ms, 10);
    assert_eq!(config.auth.invalid_credential_code, "token-expired");
}

#[test]
fn test_invalid_file_is_config_error() {
    let file = config_file(".json", r#"{ "endpoint": "#);

    let result = config::load_from_file(Some(file.path().to_path_buf()));

    assert!(matches!(result, Err(gqlink_domain::GqlinkError::Config(_))));
}

#[test]
fn test_client_builds_from_file_config_with_possible_types() {
    let types = config_file(".json", r#"{ "Node": ["User", "Post"] }"#);
    let file = config_file(
        ".json",
        &format!(
            r#"{{ "endpoint": "http://localhost/graphql", "possible_types_path": "{}" }}"#,
            types.path().display()
        ),
    );

    let config = config::load_from_file(Some(file.path().to_path_buf())).expect("config");
    let client = GraphqlClient::builder().config(config).build().expect("client");

    assert!(client.cache().possible_types().matches("Node", "Post"));
}
