// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the tracking and vehicle directory collaborators.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::OnceCell;
use tracing::debug;

use fleet_config::model::StorageConfig;
use fleet_core::{
    AdapterType, FleetError, HealthStatus, LocationSample, NewVehicle, PluginAdapter, SessionId,
    TrackingSession, TrackingSessionManager, Vehicle, VehicleDirectory, VehicleId, VehicleStatus,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed store for sessions, samples, and vehicles.
///
/// The database is lazily initialized on the first call to
/// [`SqliteStore::initialize`]; every other operation fails until then.
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a new store with the given configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Open the database and apply migrations.
    pub async fn initialize(&self) -> Result<(), FleetError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| FleetError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    fn db(&self) -> Result<&Database, FleetError> {
        self.db.get().ok_or_else(|| FleetError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(&self) -> Result<(), FleetError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                    Ok(())
                })
                .await
                .map_err(crate::database::map_tr_err)?;
            debug!("WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, FleetError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), FleetError> {
        self.checkpoint().await
    }
}

#[async_trait]
impl TrackingSessionManager for SqliteStore {
    async fn start_session(&self, vehicle_id: &VehicleId) -> Result<TrackingSession, FleetError> {
        queries::sessions::start_session(self.db()?, vehicle_id)
            .await?
            .ok_or_else(|| FleetError::SessionConflict {
                vehicle_id: vehicle_id.clone(),
            })
    }

    async fn end_session(&self, vehicle_id: &VehicleId) -> Result<TrackingSession, FleetError> {
        queries::sessions::end_session(self.db()?, vehicle_id)
            .await?
            .ok_or_else(|| FleetError::SessionNotFound {
                vehicle_id: vehicle_id.clone(),
            })
    }

    async fn active_session(
        &self,
        vehicle_id: &VehicleId,
    ) -> Result<Option<TrackingSession>, FleetError> {
        queries::sessions::active_session(self.db()?, vehicle_id).await
    }

    async fn record_sample(
        &self,
        session_id: &SessionId,
        sample: &LocationSample,
    ) -> Result<(), FleetError> {
        let mut sample = sample.clone();
        sample.session_id = session_id.clone();
        queries::samples::insert_sample(self.db()?, &sample).await
    }

    async fn fetch_history(
        &self,
        vehicle_id: &VehicleId,
        session_id: &SessionId,
    ) -> Result<Vec<LocationSample>, FleetError> {
        queries::samples::session_history(self.db()?, vehicle_id, session_id).await
    }
}

#[async_trait]
impl VehicleDirectory for SqliteStore {
    async fn update_status(
        &self,
        vehicle_id: &VehicleId,
        status: VehicleStatus,
    ) -> Result<(), FleetError> {
        if queries::vehicles::update_status(self.db()?, vehicle_id, status).await? {
            Ok(())
        } else {
            Err(FleetError::VehicleNotFound {
                vehicle_id: vehicle_id.clone(),
            })
        }
    }

    async fn update_last_location(
        &self,
        vehicle_id: &VehicleId,
        lat: f64,
        lng: f64,
    ) -> Result<(), FleetError> {
        let updated =
            queries::vehicles::update_last_location(self.db()?, vehicle_id, lat, lng, Utc::now())
                .await?;
        if updated {
            Ok(())
        } else {
            Err(FleetError::VehicleNotFound {
                vehicle_id: vehicle_id.clone(),
            })
        }
    }

    async fn create_vehicle(&self, vehicle: NewVehicle) -> Result<Vehicle, FleetError> {
        queries::vehicles::create_vehicle(self.db()?, &vehicle).await
    }

    async fn get_vehicle(&self, vehicle_id: &VehicleId) -> Result<Option<Vehicle>, FleetError> {
        queries::vehicles::get_vehicle(self.db()?, vehicle_id).await
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, FleetError> {
        queries::vehicles::list_vehicles(self.db()?).await
    }
}
