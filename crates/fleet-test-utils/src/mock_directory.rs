// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`VehicleDirectory`] for deterministic tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use fleet_core::{FleetError, NewVehicle, Vehicle, VehicleDirectory, VehicleId, VehicleStatus};

/// Vehicles keyed by id. Unknown ids fail with [`FleetError::VehicleNotFound`].
#[derive(Default)]
pub struct MockDirectory {
    vehicles: Mutex<BTreeMap<VehicleId, Vehicle>>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<VehicleId, Vehicle>> {
        self.vehicles.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add an `offline` vehicle whose plate number equals its id.
    pub fn insert_vehicle(&self, id: &str) -> Vehicle {
        let now = Utc::now();
        let vehicle = Vehicle {
            id: VehicleId::from(id),
            plate_number: id.to_string(),
            driver_name: format!("Driver {id}"),
            driver_phone: "+0000000000".to_string(),
            status: VehicleStatus::Offline,
            current_lat: None,
            current_lng: None,
            last_update_at: None,
            created_at: now,
            updated_at: now,
        };
        self.lock().insert(vehicle.id.clone(), vehicle.clone());
        vehicle
    }

    pub fn vehicle(&self, id: &str) -> Option<Vehicle> {
        self.lock().get(&VehicleId::from(id)).cloned()
    }

    fn modify(
        &self,
        vehicle_id: &VehicleId,
        f: impl FnOnce(&mut Vehicle),
    ) -> Result<(), FleetError> {
        let mut vehicles = self.lock();
        let vehicle = vehicles
            .get_mut(vehicle_id)
            .ok_or_else(|| FleetError::VehicleNotFound {
                vehicle_id: vehicle_id.clone(),
            })?;
        f(vehicle);
        vehicle.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl VehicleDirectory for MockDirectory {
    async fn update_status(
        &self,
        vehicle_id: &VehicleId,
        status: VehicleStatus,
    ) -> Result<(), FleetError> {
        self.modify(vehicle_id, |v| v.status = status)
    }

    async fn update_last_location(
        &self,
        vehicle_id: &VehicleId,
        lat: f64,
        lng: f64,
    ) -> Result<(), FleetError> {
        self.modify(vehicle_id, |v| {
            v.current_lat = Some(lat);
            v.current_lng = Some(lng);
            v.last_update_at = Some(Utc::now());
        })
    }

    async fn create_vehicle(&self, new: NewVehicle) -> Result<Vehicle, FleetError> {
        let id = new
            .id
            .unwrap_or_else(|| VehicleId::from(format!("veh-{}", self.lock().len() + 1)));
        let mut vehicles = self.lock();
        if vehicles.contains_key(&id) || vehicles.values().any(|v| v.plate_number == new.plate_number)
        {
            return Err(FleetError::Internal(format!(
                "duplicate vehicle {id} / {}",
                new.plate_number
            )));
        }
        let now = Utc::now();
        let vehicle = Vehicle {
            id: id.clone(),
            plate_number: new.plate_number,
            driver_name: new.driver_name,
            driver_phone: new.driver_phone,
            status: VehicleStatus::Offline,
            current_lat: None,
            current_lng: None,
            last_update_at: None,
            created_at: now,
            updated_at: now,
        };
        vehicles.insert(id, vehicle.clone());
        Ok(vehicle)
    }

    async fn get_vehicle(&self, vehicle_id: &VehicleId) -> Result<Option<Vehicle>, FleetError> {
        Ok(self.lock().get(vehicle_id).cloned())
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, FleetError> {
        let mut vehicles: Vec<Vehicle> = self.lock().values().cloned().collect();
        vehicles.sort_by(|a, b| a.plate_number.cmp(&b.plate_number));
        Ok(vehicles)
    }
}
