// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vehicle directory collaborator.

use async_trait::async_trait;

use crate::error::FleetError;
use crate::types::{NewVehicle, Vehicle, VehicleId, VehicleStatus};

/// Source of truth for vehicle records.
///
/// The hub only writes status and last-known location here; its own
/// location cache is never read back from the directory.
#[async_trait]
pub trait VehicleDirectory: Send + Sync + 'static {
    /// Sets the vehicle's operational status.
    async fn update_status(
        &self,
        vehicle_id: &VehicleId,
        status: VehicleStatus,
    ) -> Result<(), FleetError>;

    /// Stores the vehicle's last known coordinates and stamps the update time.
    async fn update_last_location(
        &self,
        vehicle_id: &VehicleId,
        lat: f64,
        lng: f64,
    ) -> Result<(), FleetError>;

    /// Registers a new vehicle. New vehicles start [`VehicleStatus::Offline`].
    async fn create_vehicle(&self, vehicle: NewVehicle) -> Result<Vehicle, FleetError>;

    /// Looks up a single vehicle.
    async fn get_vehicle(&self, vehicle_id: &VehicleId) -> Result<Option<Vehicle>, FleetError>;

    /// Lists all vehicles ordered by plate number.
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, FleetError>;
}
