// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the hub REST API.

use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use fleet_core::{
    FleetError, HealthStatus, LocationSample, NewVehicle, SessionId, TrackingSession, Vehicle,
    VehicleId,
};
use serde::{Deserialize, Serialize};

use crate::cache::CachedLocation;
use crate::server::HubState;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A [`FleetError`] rendered as `{"error": "..."}` with a matching status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<FleetError> for ApiError {
    fn from(err: FleetError) -> Self {
        let status = match &err {
            FleetError::Protocol { .. } | FleetError::Config(_) => StatusCode::BAD_REQUEST,
            FleetError::Auth(_) => StatusCode::UNAUTHORIZED,
            FleetError::SessionNotFound { .. } | FleetError::VehicleNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            FleetError::SessionConflict { .. } => StatusCode::CONFLICT,
            FleetError::Timeout { .. } | FleetError::Capacity { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            FleetError::Storage { .. }
            | FleetError::Persistence { .. }
            | FleetError::Transport { .. }
            | FleetError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %err, "request failed");
            return Self::new(status, "internal error");
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, `degraded` or `unhealthy`.
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
}

/// GET /health
pub async fn get_health(State(state): State<HubState>) -> Response {
    let storage = match &state.health.storage {
        Some(adapter) => Some(
            adapter
                .health_check()
                .await
                .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string())),
        ),
        None => None,
    };
    let (status, code, detail) = match &storage {
        None => ("ok", StatusCode::OK, None),
        Some(HealthStatus::Healthy) => ("ok", StatusCode::OK, Some("healthy".to_string())),
        Some(HealthStatus::Degraded(msg)) => ("degraded", StatusCode::OK, Some(msg.clone())),
        Some(HealthStatus::Unhealthy(msg)) => {
            ("unhealthy", StatusCode::SERVICE_UNAVAILABLE, Some(msg.clone()))
        }
    };
    let body = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        storage: detail,
    };
    (code, Json(body)).into_response()
}

/// GET /metrics
pub async fn get_metrics(State(state): State<HubState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => ApiError::new(StatusCode::NOT_FOUND, "metrics are disabled").into_response(),
    }
}

/// Response body for GET /v1/vehicles/online.
#[derive(Debug, Serialize, Deserialize)]
pub struct OnlineVehiclesResponse {
    pub vehicle_ids: Vec<VehicleId>,
}

/// GET /v1/vehicles/online
pub async fn get_online_vehicles(
    State(state): State<HubState>,
) -> Result<Json<OnlineVehiclesResponse>, ApiError> {
    let vehicle_ids = state.hub.online_vehicle_ids().await?;
    Ok(Json(OnlineVehiclesResponse { vehicle_ids }))
}

/// GET /v1/vehicles/{id}/location
pub async fn get_vehicle_location(
    State(state): State<HubState>,
    Path(id): Path<String>,
) -> Result<Json<CachedLocation>, ApiError> {
    state
        .hub
        .current_location(&VehicleId::from(id.as_str()))
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, format!("no location for vehicle {id}")))
}

/// A directory vehicle joined with live hub state.
#[derive(Debug, Serialize)]
pub struct VehicleView {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub online: bool,
    pub live_location: Option<CachedLocation>,
}

fn view(state: &HubState, vehicle: Vehicle, online: &HashSet<VehicleId>) -> VehicleView {
    VehicleView {
        online: online.contains(&vehicle.id),
        live_location: state.hub.current_location(&vehicle.id),
        vehicle,
    }
}

/// POST /v1/vehicles
pub async fn create_vehicle(
    State(state): State<HubState>,
    Json(body): Json<NewVehicle>,
) -> Result<(StatusCode, Json<Vehicle>), ApiError> {
    if body.plate_number.trim().is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "plate_number must not be empty",
        ));
    }
    if body.id.as_ref().is_some_and(|id| id.as_str().trim().is_empty()) {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "id must not be empty"));
    }
    let vehicle = state.directory.create_vehicle(body).await?;
    tracing::info!(vehicle_id = %vehicle.id, plate = %vehicle.plate_number, "vehicle created");
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// GET /v1/vehicles
pub async fn list_vehicles(
    State(state): State<HubState>,
) -> Result<Json<Vec<VehicleView>>, ApiError> {
    let vehicles = state.directory.list_vehicles().await?;
    let online: HashSet<VehicleId> = state.hub.online_vehicle_ids().await?.into_iter().collect();
    Ok(Json(
        vehicles
            .into_iter()
            .map(|v| view(&state, v, &online))
            .collect(),
    ))
}

/// GET /v1/vehicles/{id}
pub async fn get_vehicle(
    State(state): State<HubState>,
    Path(id): Path<String>,
) -> Result<Json<VehicleView>, ApiError> {
    let vehicle_id = VehicleId::from(id);
    let vehicle = state
        .directory
        .get_vehicle(&vehicle_id)
        .await?
        .ok_or(FleetError::VehicleNotFound { vehicle_id })?;
    let online: HashSet<VehicleId> = state.hub.online_vehicle_ids().await?.into_iter().collect();
    Ok(Json(view(&state, vehicle, &online)))
}

/// POST /v1/vehicles/{id}/tracking/start
pub async fn start_tracking(
    State(state): State<HubState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<TrackingSession>), ApiError> {
    let session = state.tracking.start_tracking(&VehicleId::from(id)).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// POST /v1/vehicles/{id}/tracking/stop
pub async fn stop_tracking(
    State(state): State<HubState>,
    Path(id): Path<String>,
) -> Result<Json<TrackingSession>, ApiError> {
    let session = state.tracking.stop_tracking(&VehicleId::from(id)).await?;
    Ok(Json(session))
}

/// Response body for GET /v1/vehicles/{id}/history/{session_id}.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub vehicle_id: VehicleId,
    pub session_id: SessionId,
    pub samples: Vec<LocationSample>,
}

/// GET /v1/vehicles/{id}/history/{session_id}
pub async fn get_history(
    State(state): State<HubState>,
    Path((id, session_id)): Path<(String, String)>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let vehicle_id = VehicleId::from(id);
    let session_id = SessionId(session_id);
    let samples = state
        .tracking
        .fetch_history(&vehicle_id, &session_id)
        .await?;
    Ok(Json(HistoryResponse {
        vehicle_id,
        session_id,
        samples,
    }))
}
