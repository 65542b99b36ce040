// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tracking session persistence collaborator.

use async_trait::async_trait;

use crate::error::FleetError;
use crate::types::{LocationSample, SessionId, TrackingSession, VehicleId};

/// Persists tracking session lifecycle and historical location samples.
///
/// Implementations must guarantee at most one active session per vehicle.
#[async_trait]
pub trait TrackingSessionManager: Send + Sync + 'static {
    /// Opens a new active session.
    ///
    /// Fails with [`FleetError::SessionConflict`] if one is already active.
    async fn start_session(&self, vehicle_id: &VehicleId) -> Result<TrackingSession, FleetError>;

    /// Ends the active session, recording its end time.
    ///
    /// Fails with [`FleetError::SessionNotFound`] if none is active.
    async fn end_session(&self, vehicle_id: &VehicleId) -> Result<TrackingSession, FleetError>;

    /// Returns the active session for the vehicle, if any.
    async fn active_session(
        &self,
        vehicle_id: &VehicleId,
    ) -> Result<Option<TrackingSession>, FleetError>;

    /// Appends a sample to a session's history.
    async fn record_sample(
        &self,
        session_id: &SessionId,
        sample: &LocationSample,
    ) -> Result<(), FleetError>;

    /// Returns the samples of one session ordered by recording time.
    async fn fetch_history(
        &self,
        vehicle_id: &VehicleId,
        session_id: &SessionId,
    ) -> Result<Vec<LocationSample>, FleetError>;
}
