// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket upgrade handlers.
//!
//! Drivers connect to `/ws/mobile?vehicle_id=<id>&token=<driver token>`,
//! dashboards to `/ws/web?token=<api token>`. Parameters and tokens are
//! checked before the upgrade: a missing parameter is a 400, a rejected
//! token a 401.

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fleet_core::{ClientKind, VehicleId};
use serde::Deserialize;

use crate::client::run_connection;
use crate::handlers::ApiError;
use crate::mailbox::mailbox;
use crate::registry::ClientHandle;
use crate::server::HubState;

/// Query string of `/ws/mobile`.
#[derive(Debug, Default, Deserialize)]
pub struct MobileQuery {
    #[serde(default)]
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

/// Query string of `/ws/web`.
#[derive(Debug, Default, Deserialize)]
pub struct WebQuery {
    #[serde(default)]
    pub token: Option<String>,
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, format!("missing {name}")))
}

async fn authorize(state: &HubState, kind: ClientKind, token: &str) -> Result<(), ApiError> {
    state.verifier.verify(kind, token).await.map_err(|e| {
        tracing::info!(%kind, "websocket upgrade rejected");
        ApiError::from(e)
    })
}

fn upgrade(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    state: &HubState,
) -> Result<WebSocketUpgrade, Response> {
    let ws = ws.map_err(IntoResponse::into_response)?;
    let limit = state.hub_config.max_frame_bytes;
    Ok(ws.max_message_size(limit).max_frame_size(limit))
}

/// GET /ws/mobile
pub async fn mobile_ws_handler(
    State(state): State<HubState>,
    Query(query): Query<MobileQuery>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let vehicle_id = match required(query.vehicle_id, "vehicle_id") {
        Ok(id) => VehicleId::from(id),
        Err(e) => return e.into_response(),
    };
    let token = match required(query.token, "token") {
        Ok(token) => token,
        Err(e) => return e.into_response(),
    };
    if let Err(e) = authorize(&state, ClientKind::Driver, &token).await {
        return e.into_response();
    }
    let ws = match upgrade(ws, &state) {
        Ok(ws) => ws,
        Err(response) => return response,
    };
    ws.on_upgrade(move |socket| async move {
        let (tx, rx) = mailbox(state.hub_config.mailbox_capacity);
        let client = ClientHandle::driver(vehicle_id, tx);
        handle_socket(socket, client, rx, state).await;
    })
}

/// GET /ws/web
pub async fn web_ws_handler(
    State(state): State<HubState>,
    Query(query): Query<WebQuery>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let token = match required(query.token, "token") {
        Ok(token) => token,
        Err(e) => return e.into_response(),
    };
    if let Err(e) = authorize(&state, ClientKind::Dashboard, &token).await {
        return e.into_response();
    }
    let ws = match upgrade(ws, &state) {
        Ok(ws) => ws,
        Err(response) => return response,
    };
    ws.on_upgrade(move |socket| async move {
        let (tx, rx) = mailbox(state.hub_config.mailbox_capacity);
        let client = ClientHandle::dashboard(tx);
        handle_socket(socket, client, rx, state).await;
    })
}

async fn handle_socket(
    socket: WebSocket,
    client: ClientHandle,
    rx: crate::mailbox::MailboxReceiver,
    state: HubState,
) {
    tracing::debug!(
        connection_id = %client.id,
        kind = %client.kind,
        vehicle_id = ?client.vehicle_id.as_ref().map(VehicleId::as_str),
        "websocket connected"
    );
    run_connection(socket, client, rx, state.connection_context()).await;
}
