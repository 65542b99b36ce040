// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token verification at connection upgrade and on the REST API.

use async_trait::async_trait;

use crate::error::FleetError;
use crate::types::ClientKind;

/// Verifies credentials presented by hub clients.
///
/// Token issuance lives outside the hub; implementations only decide whether
/// a presented token admits a client of the given kind.
#[async_trait]
pub trait TokenVerifier: Send + Sync + 'static {
    /// Returns `Ok(())` if `token` admits a client of `kind`, or
    /// [`FleetError::Auth`] otherwise.
    async fn verify(&self, kind: ClientKind, token: &str) -> Result<(), FleetError>;
}
