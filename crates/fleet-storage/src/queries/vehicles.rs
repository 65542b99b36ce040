// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vehicle directory CRUD operations.

use chrono::{DateTime, Utc};
use fleet_core::{FleetError, NewVehicle, Vehicle, VehicleId, VehicleStatus};
use rusqlite::{params, OptionalExtension, Row};

use crate::database::Database;
use crate::queries::parse_enum;

const VEHICLE_COLUMNS: &str = "id, plate_number, driver_name, driver_phone, status,
     current_lat, current_lng, last_update_at, created_at, updated_at";

fn vehicle_from_row(row: &Row<'_>) -> rusqlite::Result<Vehicle> {
    Ok(Vehicle {
        id: VehicleId(row.get(0)?),
        plate_number: row.get(1)?,
        driver_name: row.get(2)?,
        driver_phone: row.get(3)?,
        status: parse_enum(4, row.get(4)?)?,
        current_lat: row.get(5)?,
        current_lng: row.get(6)?,
        last_update_at: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// Insert a new vehicle. New vehicles start offline with no known location.
pub async fn create_vehicle(db: &Database, new: &NewVehicle) -> Result<Vehicle, FleetError> {
    let now = Utc::now();
    let vehicle = Vehicle {
        id: new
            .id
            .clone()
            .unwrap_or_else(|| VehicleId(uuid::Uuid::new_v4().to_string())),
        plate_number: new.plate_number.clone(),
        driver_name: new.driver_name.clone(),
        driver_phone: new.driver_phone.clone(),
        status: VehicleStatus::Offline,
        current_lat: None,
        current_lng: None,
        last_update_at: None,
        created_at: now,
        updated_at: now,
    };
    let row = vehicle.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO vehicles (id, plate_number, driver_name, driver_phone, status,
                                       created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    row.id.0,
                    row.plate_number,
                    row.driver_name,
                    row.driver_phone,
                    row.status.to_string(),
                    row.created_at,
                    row.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    Ok(vehicle)
}

/// Get a vehicle by ID.
pub async fn get_vehicle(db: &Database, id: &VehicleId) -> Result<Option<Vehicle>, FleetError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| -> Result<Option<Vehicle>, rusqlite::Error> {
            let sql = format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = ?1");
            conn.query_row(&sql, params![id], vehicle_from_row)
                .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List all vehicles ordered by plate number.
pub async fn list_vehicles(db: &Database) -> Result<Vec<Vehicle>, FleetError> {
    db.connection()
        .call(|conn| -> Result<Vec<Vehicle>, rusqlite::Error> {
            let sql = format!("SELECT {VEHICLE_COLUMNS} FROM vehicles ORDER BY plate_number");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], vehicle_from_row)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set a vehicle's status. Returns `false` if no such vehicle exists.
pub async fn update_status(
    db: &Database,
    id: &VehicleId,
    status: VehicleStatus,
) -> Result<bool, FleetError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE vehicles SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.to_string(), Utc::now(), id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Store a vehicle's last known coordinates. Returns `false` if no such vehicle exists.
pub async fn update_last_location(
    db: &Database,
    id: &VehicleId,
    lat: f64,
    lng: f64,
    at: DateTime<Utc>,
) -> Result<bool, FleetError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE vehicles
                 SET current_lat = ?1, current_lng = ?2, last_update_at = ?3, updated_at = ?3
                 WHERE id = ?4",
                params![lat, lng, at, id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
