// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tracking session lifecycle: `NoSession -> Active -> Ended`.

use std::sync::Arc;

use fleet_core::{
    FleetError, LocationSample, SessionId, TrackingSession, TrackingSessionManager,
    VehicleDirectory, VehicleId, VehicleStatus,
};
use tracing::{info, warn};

/// Starts and stops sessions and keeps the vehicle status in step.
#[derive(Clone)]
pub struct TrackingService {
    sessions: Arc<dyn TrackingSessionManager>,
    directory: Arc<dyn VehicleDirectory>,
}

impl TrackingService {
    pub fn new(
        sessions: Arc<dyn TrackingSessionManager>,
        directory: Arc<dyn VehicleDirectory>,
    ) -> Self {
        Self {
            sessions,
            directory,
        }
    }

    /// Open a session and mark the vehicle `on_duty`.
    ///
    /// Fails with [`FleetError::VehicleNotFound`] for a vehicle the directory
    /// does not know and [`FleetError::SessionConflict`] if one is already
    /// active.
    pub async fn start_tracking(&self, vehicle_id: &VehicleId) -> Result<TrackingSession, FleetError> {
        if self.directory.get_vehicle(vehicle_id).await?.is_none() {
            return Err(FleetError::VehicleNotFound {
                vehicle_id: vehicle_id.clone(),
            });
        }
        let session = self.sessions.start_session(vehicle_id).await?;
        info!(vehicle_id = %vehicle_id, session_id = %session.id, "tracking started");
        self.set_status(vehicle_id, VehicleStatus::OnDuty).await;
        Ok(session)
    }

    /// End the active session and mark the vehicle `available`.
    ///
    /// Fails with [`FleetError::SessionNotFound`] if none is active.
    pub async fn stop_tracking(&self, vehicle_id: &VehicleId) -> Result<TrackingSession, FleetError> {
        let session = self.sessions.end_session(vehicle_id).await?;
        info!(vehicle_id = %vehicle_id, session_id = %session.id, "tracking stopped");
        self.set_status(vehicle_id, VehicleStatus::Available).await;
        Ok(session)
    }

    /// Samples of one session, oldest first.
    pub async fn fetch_history(
        &self,
        vehicle_id: &VehicleId,
        session_id: &SessionId,
    ) -> Result<Vec<LocationSample>, FleetError> {
        self.sessions.fetch_history(vehicle_id, session_id).await
    }

    async fn set_status(&self, vehicle_id: &VehicleId, status: VehicleStatus) {
        if let Err(e) = self.directory.update_status(vehicle_id, status).await {
            warn!(vehicle_id = %vehicle_id, %status, error = %e, "failed to update vehicle status");
        }
    }
}
