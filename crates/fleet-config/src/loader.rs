// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./fleet.toml` > `~/.config/fleet/fleet.toml` > `/etc/fleet/fleet.toml`
//! with environment variable overrides via `FLEET_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::FleetConfig;

/// Top-level sections, used to map `FLEET_<SECTION>_<KEY>` onto `section.key`.
const SECTIONS: &[&str] = &[
    "server",
    "auth",
    "hub",
    "persistence",
    "storage",
    "log",
    "prometheus",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/fleet/fleet.toml` (system-wide)
/// 3. `~/.config/fleet/fleet.toml` (user XDG config)
/// 4. `./fleet.toml` (local directory)
/// 5. `FLEET_*` environment variables
pub fn load_config() -> Result<FleetConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<FleetConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FleetConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FleetConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FleetConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(FleetConfig::default()))
        .merge(Toml::file("/etc/fleet/fleet.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("fleet/fleet.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("fleet.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `FLEET_HUB_MAILBOX_CAPACITY` must map to `hub.mailbox_capacity`,
/// not `hub.mailbox.capacity`.
fn env_provider() -> Env {
    Env::prefixed("FLEET_").map(|key| map_env_key(&key.as_str().to_ascii_lowercase()).into())
}

/// Map a lowercased, prefix-stripped env key onto its dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
