// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fire-and-forget persistence of driver reports.
//!
//! Handlers enqueue jobs without waiting; a fixed pool of workers drains the
//! queue against the collaborators. Each vehicle's jobs go to one worker, so
//! they are applied in the order they were enqueued. A full queue drops the
//! job so broadcast latency never depends on storage latency.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use fleet_config::model::PersistenceConfig;
use fleet_core::{
    FleetError, LocationSample, TrackingSessionManager, VehicleDirectory, VehicleId,
    VehicleStatus,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::CachedLocation;

/// Work handed to the persistence pool.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceJob {
    /// Record a sample against the active session (if any) and store the
    /// vehicle's last known coordinates.
    RecordLocation(CachedLocation),
    /// Store a driver-reported status.
    UpdateStatus {
        vehicle_id: VehicleId,
        status: VehicleStatus,
    },
}

impl PersistenceJob {
    pub fn vehicle_id(&self) -> &VehicleId {
        match self {
            PersistenceJob::RecordLocation(location) => &location.vehicle_id,
            PersistenceJob::UpdateStatus { vehicle_id, .. } => vehicle_id,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PersistenceJob::RecordLocation(_) => "record_location",
            PersistenceJob::UpdateStatus { .. } => "update_status",
        }
    }
}

/// Producer handle for the persistence pool.
#[derive(Debug, Clone)]
pub struct PersistenceQueue {
    lanes: Arc<[mpsc::Sender<PersistenceJob>]>,
}

impl PersistenceQueue {
    fn lane(&self, vehicle_id: &VehicleId) -> &mpsc::Sender<PersistenceJob> {
        let mut hasher = DefaultHasher::new();
        vehicle_id.hash(&mut hasher);
        let index = (hasher.finish() % self.lanes.len() as u64) as usize;
        &self.lanes[index]
    }

    /// Queue a job without waiting. Returns `false` if it was dropped.
    pub fn enqueue(&self, job: PersistenceJob) -> bool {
        match self.lane(job.vehicle_id()).try_send(job) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(job)) => {
                warn!(job = job.name(), vehicle_id = %job.vehicle_id(), "persistence queue full, dropping job");
                fleet_prometheus::record_persistence_dropped(job.name());
                false
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                warn!(job = job.name(), "persistence workers stopped, dropping job");
                fleet_prometheus::record_persistence_dropped(job.name());
                false
            }
        }
    }
}

/// The persistence collaborators shared by every worker.
#[derive(Clone)]
pub struct PersistenceBackends {
    pub tracking: Arc<dyn TrackingSessionManager>,
    pub directory: Arc<dyn VehicleDirectory>,
}

/// Start the worker pool. Workers exit once every [`PersistenceQueue`] is dropped.
///
/// `queue_capacity` is split evenly across the workers.
pub fn spawn_workers(
    config: &PersistenceConfig,
    backends: PersistenceBackends,
) -> (PersistenceQueue, Vec<JoinHandle<()>>) {
    let workers = config.workers.max(1);
    let lane_capacity = config.queue_capacity.div_ceil(workers).max(1);
    let mut lanes = Vec::with_capacity(workers);
    let mut handles = Vec::with_capacity(workers);
    for worker in 0..workers {
        let (tx, mut rx) = mpsc::channel::<PersistenceJob>(lane_capacity);
        lanes.push(tx);
        let backends = backends.clone();
        handles.push(tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let name = job.name();
                if let Err(e) = process(&backends, job).await {
                    warn!(worker, job = name, error = %e, "persistence job failed");
                    fleet_prometheus::record_persistence_failure(name);
                }
            }
            debug!(worker, "persistence worker stopped");
        }));
    }
    let queue = PersistenceQueue {
        lanes: Arc::from(lanes),
    };
    (queue, handles)
}

/// Run one job to completion.
///
/// A `RecordLocation` job attempts both writes and reports the first failure.
pub async fn process(backends: &PersistenceBackends, job: PersistenceJob) -> Result<(), FleetError> {
    match job {
        PersistenceJob::RecordLocation(location) => {
            let sample_result = record_sample(backends, &location).await;
            let directory_result = backends
                .directory
                .update_last_location(&location.vehicle_id, location.lat, location.lng)
                .await;
            sample_result.and(directory_result)
        }
        PersistenceJob::UpdateStatus { vehicle_id, status } => {
            backends.directory.update_status(&vehicle_id, status).await
        }
    }
}

async fn record_sample(
    backends: &PersistenceBackends,
    location: &CachedLocation,
) -> Result<(), FleetError> {
    let Some(session) = backends.tracking.active_session(&location.vehicle_id).await? else {
        return Ok(());
    };
    let sample = LocationSample {
        id: uuid::Uuid::new_v4().to_string(),
        vehicle_id: location.vehicle_id.clone(),
        session_id: session.id.clone(),
        lat: location.lat,
        lng: location.lng,
        speed: location.speed.unwrap_or_default(),
        heading: location.heading.unwrap_or_default(),
        recorded_at: DateTime::<Utc>::from_timestamp(location.timestamp, 0)
            .unwrap_or_else(Utc::now),
    };
    match backends.tracking.record_sample(&session.id, &sample).await {
        // The session ended between lookup and insert.
        Err(e) if e.is_session_state() => Ok(()),
        other => other,
    }
}
