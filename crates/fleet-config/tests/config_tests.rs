// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the fleet configuration system.

use fleet_config::diagnostic::ConfigError;
use fleet_config::model::FleetConfig;
use fleet_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use serial_test::serial;

/// Valid TOML with all known sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_fleet_config() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 9000

[auth]
api_token = "dash-secret"
driver_token = "drv-secret"

[hub]
mailbox_capacity = 32
op_buffer = 64
max_frame_bytes = 4096
liveness_timeout_secs = 30
keepalive_interval_secs = 20
write_timeout_secs = 5
monotonic_timestamps = false

[persistence]
queue_capacity = 16
workers = 2

[storage]
database_path = "/tmp/fleet-test.db"
wal_mode = false

[log]
level = "debug"

[prometheus]
enabled = true
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.auth.api_token.as_deref(), Some("dash-secret"));
    assert_eq!(config.auth.driver_token.as_deref(), Some("drv-secret"));
    assert_eq!(config.hub.mailbox_capacity, 32);
    assert_eq!(config.hub.op_buffer, 64);
    assert_eq!(config.hub.max_frame_bytes, 4096);
    assert_eq!(config.hub.liveness_timeout().as_secs(), 30);
    assert_eq!(config.hub.keepalive_interval().as_secs(), 20);
    assert_eq!(config.hub.write_timeout().as_secs(), 5);
    assert!(!config.hub.monotonic_timestamps);
    assert_eq!(config.persistence.queue_capacity, 16);
    assert_eq!(config.persistence.workers, 2);
    assert_eq!(config.storage.database_path, "/tmp/fleet-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.log.level, "debug");
    assert!(config.prometheus.enabled);
}

/// Empty input yields the compiled defaults.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty config should load");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert!(config.auth.api_token.is_none());
    assert!(config.auth.driver_token.is_none());
    assert_eq!(config.hub.mailbox_capacity, 256);
    assert_eq!(config.hub.op_buffer, 1024);
    assert_eq!(config.hub.max_frame_bytes, 512 * 1024);
    assert_eq!(config.hub.liveness_timeout_secs, 60);
    assert_eq!(config.hub.keepalive_interval_secs, 50);
    assert_eq!(config.hub.write_timeout_secs, 10);
    assert!(config.hub.monotonic_timestamps);
    assert_eq!(config.persistence.queue_capacity, 1024);
    assert_eq!(config.persistence.workers, 4);
    assert!(config.storage.database_path.ends_with("fleet.db"));
    assert!(config.storage.wal_mode);
    assert_eq!(config.log.level, "info");
    assert!(!config.prometheus.enabled);
}

/// Tuple overrides emulate the env provider's dotted keys.
#[test]
fn dotted_override_replaces_file_value() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let config: FleetConfig = Figment::new()
        .merge(Serialized::defaults(FleetConfig::default()))
        .merge(Toml::string("[hub]\nmailbox_capacity = 8\n"))
        .merge(("hub.mailbox_capacity", 99))
        .extract()
        .expect("should merge override");
    assert_eq!(config.hub.mailbox_capacity, 99);
}

#[test]
#[serial]
fn env_var_overrides_file_value() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fleet.toml");
    std::fs::write(&path, "[persistence]\nworkers = 2\n[auth]\napi_token = \"file\"\n").unwrap();

    // SAFETY: serialized with every other env-touching test.
    unsafe {
        std::env::set_var("FLEET_PERSISTENCE_WORKERS", "7");
        std::env::set_var("FLEET_AUTH_API_TOKEN", "from-env");
    }
    let result = load_and_validate_path(&path);
    unsafe {
        std::env::remove_var("FLEET_PERSISTENCE_WORKERS");
        std::env::remove_var("FLEET_AUTH_API_TOKEN");
    }

    let config = result.expect("config should load");
    assert_eq!(config.persistence.workers, 7);
    assert_eq!(config.auth.api_token.as_deref(), Some("from-env"));
}

#[test]
#[serial]
fn missing_config_file_is_skipped() {
    let config = load_and_validate_path(std::path::Path::new("/nonexistent/fleet.toml"))
        .expect("missing file should fall back to defaults");
    assert_eq!(config.server.port, 8080);
}

#[test]
fn unknown_top_level_section_is_rejected() {
    let err = load_config_from_str("[telemetry]\nenabled = true\n")
        .expect_err("unknown section should fail");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("telemetry"),
        "got: {err_str}"
    );
}

#[test]
fn diagnostic_suggests_port_for_prot() {
    let errors = load_and_validate_str("[server]\nprot = 9000\n").expect_err("typo should fail");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            valid_keys,
            ..
        } => {
            assert_eq!(key, "prot");
            assert_eq!(suggestion.as_deref(), Some("port"));
            assert!(valid_keys.contains("host"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn diagnostic_invalid_type_names_key() {
    let errors = load_and_validate_str("[hub]\nmailbox_capacity = \"lots\"\n")
        .expect_err("wrong type should fail");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::InvalidType { key, .. } if key.contains("mailbox_capacity")
    )));
}

#[test]
fn validation_errors_surface_through_load() {
    let errors = load_and_validate_str(
        "[hub]\nliveness_timeout_secs = 10\nkeepalive_interval_secs = 10\n",
    )
    .expect_err("keepalive >= liveness should fail");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::Validation { message, .. } if message.contains("keepalive_interval_secs")
    )));
}

#[test]
fn keepalive_bound_points_at_the_file_line() {
    use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme};

    let toml = "[server]\nport = 9000\n\n[hub]\nliveness_timeout_secs = 60\nkeepalive_interval_secs = 54\n";
    let errors = load_and_validate_str(toml).expect_err("54s of 60s is on the bound");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].key(), Some("hub.keepalive_interval_secs"));
    assert!(errors[0].has_span());

    let mut out = String::new();
    let diagnostic: &dyn Diagnostic = &errors[0];
    GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor())
        .render_report(&mut out, diagnostic)
        .unwrap();
    assert!(out.contains("<inline>"));
    assert!(out.contains("keepalive_interval_secs = 54"));
}

#[test]
#[serial]
fn validation_error_from_env_has_no_span() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fleet.toml");
    std::fs::write(&path, "[server]\nport = 9000\n").unwrap();

    // SAFETY: serialized with every other env-touching test.
    unsafe { std::env::set_var("FLEET_PERSISTENCE_WORKERS", "0") };
    let result = load_and_validate_path(&path);
    unsafe { std::env::remove_var("FLEET_PERSISTENCE_WORKERS") };

    let errors = result.expect_err("zero workers is invalid");
    assert_eq!(errors[0].key(), Some("persistence.workers"));
    assert!(!errors[0].has_span());
}

#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let errors = load_and_validate_str("[persistence]\nworkerz = 2\n").unwrap_err();
    let handler = GraphicalReportHandler::new();
    let mut out = String::new();
    let diagnostic: &dyn Diagnostic = &errors[0];
    handler.render_report(&mut out, diagnostic).unwrap();
    assert!(out.contains("workerz"));
    assert!(out.contains("workers"));
}

#[test]
fn auth_debug_redacts_tokens() {
    let config = load_config_from_str("[auth]\napi_token = \"s3cret\"\n").unwrap();
    let rendered = format!("{:?}", config.auth);
    assert!(!rendered.contains("s3cret"));
    assert!(rendered.contains("[redacted]"));
}
