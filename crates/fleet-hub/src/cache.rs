// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Last-known location per vehicle.
//!
//! The cache is the only hub state shared outside the registry task. It has
//! no persistence and no tracking-session awareness.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use fleet_core::VehicleId;
use serde::{Deserialize, Serialize};

/// The latest sample reported by a vehicle.
///
/// This is also the wire shape of `location_update` broadcasts and of each
/// element of the `initial_locations` snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedLocation {
    pub vehicle_id: VehicleId,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Unix seconds.
    pub timestamp: i64,
}

/// Outcome of [`LocationCache::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheUpdate {
    /// The sample replaced (or created) the vehicle's entry.
    Applied,
    /// The sample was older than the cached one and was not cached.
    Stale { cached_timestamp: i64 },
}

impl CacheUpdate {
    pub fn is_applied(self) -> bool {
        matches!(self, CacheUpdate::Applied)
    }
}

/// Concurrent map of vehicle id to its latest sample.
#[derive(Debug)]
pub struct LocationCache {
    entries: RwLock<HashMap<VehicleId, CachedLocation>>,
    monotonic: bool,
}

impl LocationCache {
    /// Create an empty cache.
    ///
    /// With `monotonic` set, samples strictly older than the cached sample for
    /// the same vehicle are rejected; otherwise the last write wins.
    pub fn new(monotonic: bool) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            monotonic,
        }
    }

    pub fn update(&self, location: CachedLocation) -> CacheUpdate {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.get(&location.vehicle_id) {
            Some(current) if self.monotonic && location.timestamp < current.timestamp => {
                return CacheUpdate::Stale {
                    cached_timestamp: current.timestamp,
                };
            }
            _ => {}
        }
        entries.insert(location.vehicle_id.clone(), location);
        CacheUpdate::Applied
    }

    pub fn get(&self, vehicle_id: &VehicleId) -> Option<CachedLocation> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(vehicle_id)
            .cloned()
    }

    /// Every cached entry, ordered by vehicle id.
    pub fn snapshot(&self) -> Vec<CachedLocation> {
        let mut all: Vec<CachedLocation> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        all
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
