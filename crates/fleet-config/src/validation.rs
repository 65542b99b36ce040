// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid bind addresses, non-zero capacities, and timer ordering.

use crate::diagnostic::ConfigError;
use crate::model::FleetConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &FleetConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("server.host", "server.host must not be empty"));
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::validation(
                "server.host",
                format!("server.host `{host}` is not a valid IP address or hostname"),
            ));
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path",
            "storage.database_path must not be empty",
        ));
    }

    let hub = &config.hub;
    for (name, value) in [
        ("hub.mailbox_capacity", hub.mailbox_capacity as u64),
        ("hub.op_buffer", hub.op_buffer as u64),
        ("hub.max_frame_bytes", hub.max_frame_bytes as u64),
        ("hub.write_timeout_secs", hub.write_timeout_secs),
        ("hub.keepalive_interval_secs", hub.keepalive_interval_secs),
        ("persistence.queue_capacity", config.persistence.queue_capacity as u64),
        ("persistence.workers", config.persistence.workers as u64),
    ] {
        if value == 0 {
            errors.push(ConfigError::validation(name, format!("{name} must be at least 1")));
        }
    }

    // Pings must land well inside the peer's liveness window.
    if hub.keepalive_interval_secs.saturating_mul(10) >= hub.liveness_timeout_secs.saturating_mul(9) {
        errors.push(ConfigError::validation(
            "hub.keepalive_interval_secs",
            format!(
                "hub.keepalive_interval_secs ({}) must be less than 90% of hub.liveness_timeout_secs ({})",
                hub.keepalive_interval_secs, hub.liveness_timeout_secs
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
