// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Real-time vehicle location hub.
//!
//! Drivers stream positions over `/ws/mobile`; dashboards watch the fleet over
//! `/ws/web`. A single registry task owns every live connection and fans
//! messages out to per-connection mailboxes, while a worker pool persists
//! samples in the background.

pub mod auth;
pub mod cache;
pub mod client;
pub mod handlers;
pub mod mailbox;
pub mod persistence;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod tracking;
pub mod ws;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use fleet_config::FleetConfig;
use fleet_core::{
    FleetError, PluginAdapter, TokenVerifier, TrackingSessionManager, VehicleDirectory,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use cache::{CacheUpdate, CachedLocation, LocationCache};
pub use persistence::{PersistenceBackends, PersistenceJob, PersistenceQueue};
pub use registry::{ClientHandle, ConnectionId, Hub, Target};
pub use server::{HealthState, HubState};
pub use tracking::TrackingService;

/// How long shutdown waits for the registry and persistence workers to drain.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Collaborators the hub is wired to.
#[derive(Clone)]
pub struct HubDependencies {
    pub tracking: Arc<dyn TrackingSessionManager>,
    pub directory: Arc<dyn VehicleDirectory>,
    pub verifier: Arc<dyn TokenVerifier>,
    /// Probed by `/health` when present.
    pub storage: Option<Arc<dyn PluginAdapter>>,
    /// Serves `/metrics` when present.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// A running hub: registry task, persistence pool, and shared handler state.
pub struct FleetHub {
    state: HubState,
    registry: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
}

impl FleetHub {
    /// Spawn the registry and the persistence workers.
    pub fn start(config: &FleetConfig, deps: HubDependencies) -> Self {
        let cache = Arc::new(LocationCache::new(config.hub.monotonic_timestamps));
        let (hub, registry) = Hub::spawn(config.hub.op_buffer, cache);
        let (persistence, workers) = persistence::spawn_workers(
            &config.persistence,
            PersistenceBackends {
                tracking: Arc::clone(&deps.tracking),
                directory: Arc::clone(&deps.directory),
            },
        );
        let state = HubState {
            hub,
            persistence,
            tracking: TrackingService::new(deps.tracking, Arc::clone(&deps.directory)),
            directory: deps.directory,
            verifier: deps.verifier,
            hub_config: config.hub.clone(),
            health: HealthState {
                start_time: std::time::Instant::now(),
                storage: deps.storage,
                prometheus_render: deps.prometheus_render,
            },
        };
        tracing::info!(
            workers = workers.len(),
            mailbox_capacity = config.hub.mailbox_capacity,
            monotonic_timestamps = config.hub.monotonic_timestamps,
            "hub started"
        );
        Self {
            state,
            registry,
            workers,
        }
    }

    pub fn state(&self) -> &HubState {
        &self.state
    }

    pub fn hub(&self) -> &Hub {
        &self.state.hub
    }

    pub fn router(&self) -> Router {
        server::build_router(self.state.clone())
    }

    /// Serve on `listener` until `shutdown` fires, then drain background work.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), FleetError> {
        let FleetHub {
            state,
            registry,
            workers,
        } = self;
        let result = server::serve(listener, state, shutdown).await;

        let drain = async {
            let _ = registry.await;
            for worker in workers {
                let _ = worker.await;
            }
        };
        if tokio::time::timeout(DRAIN_TIMEOUT, drain).await.is_err() {
            tracing::warn!("hub did not drain within {DRAIN_TIMEOUT:?}");
        } else {
            tracing::info!("hub drained");
        }
        result
    }
}
