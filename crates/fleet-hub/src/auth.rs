// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token verification for the REST API and WebSocket upgrades.
//!
//! REST routes use `Authorization: Bearer <api_token>`. Upgrades carry the
//! token in the query string and are checked by the ws handlers. With no
//! token configured for a kind, every request of that kind is rejected.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use fleet_config::model::AuthConfig;
use fleet_core::{ClientKind, FleetError, TokenVerifier};

/// Compares tokens against `[auth]` in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigTokenVerifier {
    auth: AuthConfig,
}

impl ConfigTokenVerifier {
    pub fn new(auth: AuthConfig) -> Self {
        Self { auth }
    }
}

#[async_trait]
impl TokenVerifier for ConfigTokenVerifier {
    async fn verify(&self, kind: ClientKind, token: &str) -> Result<(), FleetError> {
        let expected = match kind {
            ClientKind::Driver => self.auth.driver_token.as_deref(),
            ClientKind::Dashboard => self.auth.api_token.as_deref(),
        };
        match expected {
            None => {
                tracing::error!(%kind, "no token configured -- rejecting");
                Err(FleetError::Auth(format!("no {kind} token configured")))
            }
            Some(expected) if constant_time_eq(expected.as_bytes(), token.as_bytes()) => Ok(()),
            Some(_) => Err(FleetError::Auth(format!("invalid {kind} token"))),
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Middleware requiring a valid dashboard bearer token.
pub async fn auth_middleware(
    State(verifier): State<Arc<dyn TokenVerifier>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let Some(token) = token else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    match verifier.verify(ClientKind::Dashboard, token).await {
        Ok(()) => Ok(next.run(request).await),
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}
