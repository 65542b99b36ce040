// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`TrackingSessionManager`] for deterministic tests.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use fleet_core::{
    FleetError, LocationSample, SessionId, SessionStatus, TrackingSession,
    TrackingSessionManager, VehicleId,
};

#[derive(Default)]
struct State {
    sessions: Vec<TrackingSession>,
    samples: Vec<LocationSample>,
}

/// Keeps sessions and samples in memory with the same one-active-session
/// rule as the SQLite store.
#[derive(Default)]
pub struct MockTracking {
    state: Mutex<State>,
}

impl MockTracking {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every recorded sample, in insertion order.
    pub fn all_samples(&self) -> Vec<LocationSample> {
        self.lock().samples.clone()
    }

    /// Every session ever started, in start order.
    pub fn sessions(&self) -> Vec<TrackingSession> {
        self.lock().sessions.clone()
    }
}

#[async_trait]
impl TrackingSessionManager for MockTracking {
    async fn start_session(&self, vehicle_id: &VehicleId) -> Result<TrackingSession, FleetError> {
        let mut state = self.lock();
        if state
            .sessions
            .iter()
            .any(|s| &s.vehicle_id == vehicle_id && s.is_active())
        {
            return Err(FleetError::SessionConflict {
                vehicle_id: vehicle_id.clone(),
            });
        }
        let session = TrackingSession::start(SessionId::generate(), vehicle_id.clone());
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn end_session(&self, vehicle_id: &VehicleId) -> Result<TrackingSession, FleetError> {
        let mut state = self.lock();
        let session = state
            .sessions
            .iter_mut()
            .find(|s| &s.vehicle_id == vehicle_id && s.is_active())
            .ok_or_else(|| FleetError::SessionNotFound {
                vehicle_id: vehicle_id.clone(),
            })?;
        session.status = SessionStatus::Ended;
        session.ended_at = Some(Utc::now());
        Ok(session.clone())
    }

    async fn active_session(
        &self,
        vehicle_id: &VehicleId,
    ) -> Result<Option<TrackingSession>, FleetError> {
        Ok(self
            .lock()
            .sessions
            .iter()
            .find(|s| &s.vehicle_id == vehicle_id && s.is_active())
            .cloned())
    }

    async fn record_sample(
        &self,
        session_id: &SessionId,
        sample: &LocationSample,
    ) -> Result<(), FleetError> {
        let mut state = self.lock();
        if !state
            .sessions
            .iter()
            .any(|s| &s.id == session_id && s.is_active())
        {
            return Err(FleetError::SessionNotFound {
                vehicle_id: sample.vehicle_id.clone(),
            });
        }
        let mut sample = sample.clone();
        sample.session_id = session_id.clone();
        state.samples.push(sample);
        Ok(())
    }

    async fn fetch_history(
        &self,
        vehicle_id: &VehicleId,
        session_id: &SessionId,
    ) -> Result<Vec<LocationSample>, FleetError> {
        let mut samples: Vec<LocationSample> = self
            .lock()
            .samples
            .iter()
            .filter(|s| &s.vehicle_id == vehicle_id && &s.session_id == session_id)
            .cloned()
            .collect();
        samples.sort_by_key(|s| s.recorded_at);
        Ok(samples)
    }
}
