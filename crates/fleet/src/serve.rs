// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `fleet serve` command implementation.
//!
//! Opens the SQLite store, wires it into the hub as both collaborators,
//! optionally installs the Prometheus recorder, and serves HTTP and
//! WebSocket traffic until SIGINT or SIGTERM.

use std::sync::Arc;

use fleet_config::FleetConfig;
use fleet_core::{FleetError, PluginAdapter, TokenVerifier};
use fleet_hub::auth::ConfigTokenVerifier;
use fleet_hub::{server, FleetHub, HubDependencies};
use fleet_storage::SqliteStore;
use tracing::{info, warn};

use crate::shutdown;

type RenderFn = Arc<dyn Fn() -> String + Send + Sync>;

/// Runs the `fleet serve` command.
pub async fn run_serve(config: FleetConfig) -> Result<(), FleetError> {
    init_tracing(&config.log.level);
    info!(version = env!("CARGO_PKG_VERSION"), "starting fleet hub");

    let store = Arc::new(SqliteStore::new(config.storage.clone()));
    store.initialize().await?;
    info!(path = %config.storage.database_path, "storage initialized");

    let prometheus_render = init_prometheus(&config)?;

    if config.auth.api_token.is_none() {
        warn!("auth.api_token is not set; REST and dashboard connections will be rejected");
    }
    if config.auth.driver_token.is_none() {
        warn!("auth.driver_token is not set; driver connections will be rejected");
    }
    let verifier: Arc<dyn TokenVerifier> =
        Arc::new(ConfigTokenVerifier::new(config.auth.clone()));

    let storage: Arc<dyn PluginAdapter> = store.clone();
    let fleet = FleetHub::start(
        &config,
        HubDependencies {
            tracking: store.clone(),
            directory: store.clone(),
            verifier,
            storage: Some(storage),
            prometheus_render,
        },
    );

    let listener = server::bind(&config.server).await?;
    let cancel = shutdown::install_signal_handler();
    let served = fleet.serve(listener, cancel).await;

    if let Err(e) = store.shutdown().await {
        warn!(error = %e, "storage shutdown failed");
    }
    served?;
    info!("fleet serve shutdown complete");
    Ok(())
}

#[cfg(feature = "prometheus")]
fn init_prometheus(config: &FleetConfig) -> Result<Option<RenderFn>, FleetError> {
    if !config.prometheus.enabled {
        return Ok(None);
    }
    let adapter = fleet_prometheus::PrometheusAdapter::new()?;
    info!("prometheus metrics enabled at /metrics");
    Ok(Some(Arc::new(move || adapter.render())))
}

#[cfg(not(feature = "prometheus"))]
fn init_prometheus(config: &FleetConfig) -> Result<Option<RenderFn>, FleetError> {
    if config.prometheus.enabled {
        warn!("prometheus.enabled is set but this build has no prometheus support");
    }
    Ok(None)
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fleet={log_level},warn")));

    // A second install (tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}
