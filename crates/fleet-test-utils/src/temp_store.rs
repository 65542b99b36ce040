// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! An initialized [`SqliteStore`] backed by a throwaway directory.

use std::sync::Arc;

use fleet_config::model::StorageConfig;
use fleet_core::FleetError;
use fleet_storage::SqliteStore;
use tempfile::TempDir;

/// Keeps the temporary directory alive as long as the store.
pub struct TempStore {
    pub store: Arc<SqliteStore>,
    pub config: StorageConfig,
    _dir: TempDir,
}

impl TempStore {
    pub async fn new() -> Result<Self, FleetError> {
        let dir = tempfile::tempdir().map_err(|e| FleetError::Storage {
            source: Box::new(e),
        })?;
        let config = StorageConfig {
            database_path: dir.path().join("fleet.db").display().to_string(),
            wal_mode: true,
        };
        let store = SqliteStore::new(config.clone());
        store.initialize().await?;
        Ok(Self {
            store: Arc::new(store),
            config,
            _dir: dir,
        })
    }
}
