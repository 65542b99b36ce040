// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tracking session lifecycle operations.
//!
//! The partial unique index `idx_tracking_sessions_active` guarantees at most
//! one active session per vehicle even if two starts race.

use chrono::Utc;
use fleet_core::{FleetError, SessionId, SessionStatus, TrackingSession, VehicleId};
use rusqlite::{params, ErrorCode, OptionalExtension, Row};

use crate::database::Database;
use crate::queries::parse_enum;

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<TrackingSession> {
    Ok(TrackingSession {
        id: SessionId(row.get(0)?),
        vehicle_id: VehicleId(row.get(1)?),
        started_at: row.get(2)?,
        ended_at: row.get(3)?,
        status: parse_enum(4, row.get(4)?)?,
    })
}

fn select_active(
    conn: &rusqlite::Connection,
    vehicle_id: &str,
) -> rusqlite::Result<Option<TrackingSession>> {
    conn.query_row(
        "SELECT id, vehicle_id, started_at, ended_at, status
         FROM tracking_sessions WHERE vehicle_id = ?1 AND status = 'active'",
        params![vehicle_id],
        session_from_row,
    )
    .optional()
}

/// Open a new active session.
///
/// Returns `None` if the vehicle already has an active session.
pub async fn start_session(
    db: &Database,
    vehicle_id: &VehicleId,
) -> Result<Option<TrackingSession>, FleetError> {
    let session = TrackingSession::start(SessionId::generate(), vehicle_id.clone());
    db.connection()
        .call(move |conn| -> Result<Option<TrackingSession>, rusqlite::Error> {
            let tx = conn.transaction()?;
            if select_active(&tx, session.vehicle_id.as_str())?.is_some() {
                return Ok(None);
            }
            let inserted = tx.execute(
                "INSERT INTO tracking_sessions (id, vehicle_id, started_at, status)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    session.id.0,
                    session.vehicle_id.0,
                    session.started_at,
                    session.status.to_string(),
                ],
            );
            match inserted {
                Ok(_) => {
                    tx.commit()?;
                    Ok(Some(session))
                }
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// End the active session, stamping `ended_at`.
///
/// Returns `None` if the vehicle has no active session.
pub async fn end_session(
    db: &Database,
    vehicle_id: &VehicleId,
) -> Result<Option<TrackingSession>, FleetError> {
    let vehicle_id = vehicle_id.0.clone();
    db.connection()
        .call(move |conn| -> Result<Option<TrackingSession>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let Some(mut session) = select_active(&tx, &vehicle_id)? else {
                return Ok(None);
            };
            let ended_at = Utc::now();
            tx.execute(
                "UPDATE tracking_sessions SET status = ?1, ended_at = ?2 WHERE id = ?3",
                params![SessionStatus::Ended.to_string(), ended_at, session.id.0],
            )?;
            tx.commit()?;
            session.status = SessionStatus::Ended;
            session.ended_at = Some(ended_at);
            Ok(Some(session))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get the active session for a vehicle, if any.
pub async fn active_session(
    db: &Database,
    vehicle_id: &VehicleId,
) -> Result<Option<TrackingSession>, FleetError> {
    let vehicle_id = vehicle_id.0.clone();
    db.connection()
        .call(move |conn| -> Result<Option<TrackingSession>, rusqlite::Error> {
            select_active(conn, &vehicle_id)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a session by ID.
pub async fn get_session(
    db: &Database,
    session_id: &SessionId,
) -> Result<Option<TrackingSession>, FleetError> {
    let session_id = session_id.0.clone();
    db.connection()
        .call(move |conn| -> Result<Option<TrackingSession>, rusqlite::Error> {
            conn.query_row(
                "SELECT id, vehicle_id, started_at, ended_at, status
                 FROM tracking_sessions WHERE id = ?1",
                params![session_id],
                session_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
