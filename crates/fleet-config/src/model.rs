// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the fleet dispatch hub.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level fleet configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FleetConfig {
    /// HTTP/WebSocket listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Client credentials checked at upgrade and on the REST API.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Connection registry and client actor tuning.
    #[serde(default)]
    pub hub: HubConfig,

    /// Background persistence worker pool.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Prometheus metrics export.
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

/// HTTP/WebSocket listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the server to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Client credentials.
///
/// Token issuance lives elsewhere; the hub only compares presented tokens.
/// When a token is unset, the corresponding clients are rejected (fail-closed).
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Token accepted from dashboard clients and REST API callers.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Token accepted from driver mobile clients.
    #[serde(default)]
    pub driver_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "[redacted]"))
            .field(
                "driver_token",
                &self.driver_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Connection registry and client actor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HubConfig {
    /// Outbound messages a client may have pending before it is evicted.
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,

    /// Capacity of the registry's operation queue.
    #[serde(default = "default_op_buffer")]
    pub op_buffer: usize,

    /// Largest inbound frame accepted from a client, in bytes.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    /// A connection that sends nothing for this long is dropped.
    #[serde(default = "default_liveness_timeout_secs")]
    pub liveness_timeout_secs: u64,

    /// Idle interval after which the writer sends a ping.
    /// Must stay below 90% of `liveness_timeout_secs`.
    #[serde(default = "default_keepalive_interval_secs")]
    pub keepalive_interval_secs: u64,

    /// Upper bound for a single socket write.
    #[serde(default = "default_write_timeout_secs")]
    pub write_timeout_secs: u64,

    /// Drop location samples older than the cached sample for the same vehicle.
    /// `false` restores plain last-write-wins.
    #[serde(default = "default_monotonic_timestamps")]
    pub monotonic_timestamps: bool,
}

impl HubConfig {
    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_secs(self.liveness_timeout_secs)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: default_mailbox_capacity(),
            op_buffer: default_op_buffer(),
            max_frame_bytes: default_max_frame_bytes(),
            liveness_timeout_secs: default_liveness_timeout_secs(),
            keepalive_interval_secs: default_keepalive_interval_secs(),
            write_timeout_secs: default_write_timeout_secs(),
            monotonic_timestamps: default_monotonic_timestamps(),
        }
    }
}

fn default_mailbox_capacity() -> usize {
    256
}

fn default_op_buffer() -> usize {
    1024
}

fn default_max_frame_bytes() -> usize {
    512 * 1024
}

fn default_liveness_timeout_secs() -> u64 {
    60
}

fn default_keepalive_interval_secs() -> u64 {
    // under 0.9 x liveness
    50
}

fn default_write_timeout_secs() -> u64 {
    10
}

fn default_monotonic_timestamps() -> bool {
    true
}

/// Background persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PersistenceConfig {
    /// Jobs that may wait for a worker before new ones are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Number of concurrent persistence workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            workers: default_workers(),
        }
    }
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_workers() -> usize {
    4
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("fleet").join("fleet.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("fleet.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level for fleet crates (trace, debug, info, warn, error).
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Prometheus metrics configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusConfig {
    /// Install the Prometheus recorder and serve `/metrics`.
    #[serde(default)]
    pub enabled: bool,
}
