// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hub HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the REST API and the
//! two WebSocket endpoints.

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use fleet_config::model::{HubConfig, ServerConfig};
use fleet_core::{FleetError, PluginAdapter, TokenVerifier, VehicleDirectory};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::auth_middleware;
use crate::client::{ConnectionContext, Timing};
use crate::handlers;
use crate::persistence::PersistenceQueue;
use crate::registry::Hub;
use crate::tracking::TrackingService;
use crate::ws;

/// State for the unauthenticated health and metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Storage adapter probed by `/health`.
    pub storage: Option<Arc<dyn PluginAdapter>>,
    /// Prometheus render function, when metrics are enabled.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct HubState {
    pub hub: Hub,
    pub persistence: PersistenceQueue,
    pub tracking: TrackingService,
    pub directory: Arc<dyn VehicleDirectory>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub hub_config: HubConfig,
    pub health: HealthState,
}

impl HubState {
    pub(crate) fn connection_context(&self) -> ConnectionContext {
        ConnectionContext {
            hub: self.hub.clone(),
            persistence: self.persistence.clone(),
            timing: Timing::from(&self.hub_config),
        }
    }
}

/// Build the full router.
///
/// - `GET /health`, `GET /metrics`: no auth
/// - `/v1/...`: bearer auth via middleware
/// - `GET /ws/mobile`, `GET /ws/web`: token in the query string, checked before upgrade
pub fn build_router(state: HubState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(
            "/v1/vehicles",
            get(handlers::list_vehicles).post(handlers::create_vehicle),
        )
        .route("/v1/vehicles/online", get(handlers::get_online_vehicles))
        .route("/v1/vehicles/{id}", get(handlers::get_vehicle))
        .route("/v1/vehicles/{id}/location", get(handlers::get_vehicle_location))
        .route(
            "/v1/vehicles/{id}/tracking/start",
            post(handlers::start_tracking),
        )
        .route("/v1/vehicles/{id}/tracking/stop", post(handlers::stop_tracking))
        .route(
            "/v1/vehicles/{id}/history/{session_id}",
            get(handlers::get_history),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            Arc::clone(&state.verifier),
            auth_middleware,
        ))
        .with_state(state.clone());

    let ws_routes = Router::new()
        .route("/ws/mobile", get(ws::mobile_ws_handler))
        .route("/ws/web", get(ws::web_ws_handler))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .merge(ws_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind the listener for `[server]`.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, FleetError> {
    let addr = format!("{}:{}", config.host, config.port);
    TcpListener::bind(&addr)
        .await
        .map_err(|e| FleetError::Transport {
            message: format!("failed to bind hub to {addr}: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Serve until `shutdown` is cancelled, then close every live connection.
pub async fn serve(
    listener: TcpListener,
    state: HubState,
    shutdown: CancellationToken,
) -> Result<(), FleetError> {
    let hub = state.hub.clone();
    let app = build_router(state);

    if let Ok(addr) = listener.local_addr() {
        tracing::info!("hub server listening on {addr}");
    }

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| FleetError::Transport {
            message: format!("hub server error: {e}"),
            source: Some(Box::new(e)),
        });

    // Upgraded sockets outlive the HTTP server; end them explicitly.
    if let Err(e) = hub.close_all().await {
        tracing::debug!(error = %e, "hub already stopped at shutdown");
    }
    result
}
