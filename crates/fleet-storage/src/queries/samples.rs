// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Location sample history.

use fleet_core::{FleetError, LocationSample, SessionId, VehicleId};
use rusqlite::params;

use crate::database::Database;

/// Append a sample to its session's history.
///
/// The insert only happens while the session is still active; otherwise the
/// result is [`FleetError::SessionNotFound`].
pub async fn insert_sample(db: &Database, sample: &LocationSample) -> Result<(), FleetError> {
    let vehicle_id = sample.vehicle_id.clone();
    let sample = sample.clone();
    let inserted = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "INSERT INTO location_samples
                     (id, vehicle_id, session_id, lat, lng, speed, heading, recorded_at)
                 SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8
                 WHERE EXISTS (
                     SELECT 1 FROM tracking_sessions
                     WHERE id = ?3 AND status = 'active'
                 )",
                params![
                    sample.id,
                    sample.vehicle_id.0,
                    sample.session_id.0,
                    sample.lat,
                    sample.lng,
                    sample.speed,
                    sample.heading,
                    sample.recorded_at,
                ],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    if inserted == 0 {
        return Err(FleetError::SessionNotFound { vehicle_id });
    }
    Ok(())
}

/// Samples of one session, oldest first.
pub async fn session_history(
    db: &Database,
    vehicle_id: &VehicleId,
    session_id: &SessionId,
) -> Result<Vec<LocationSample>, FleetError> {
    let vehicle_id = vehicle_id.0.clone();
    let session_id = session_id.0.clone();
    db.connection()
        .call(move |conn| -> Result<Vec<LocationSample>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, vehicle_id, session_id, lat, lng, speed, heading, recorded_at
                 FROM location_samples
                 WHERE vehicle_id = ?1 AND session_id = ?2
                 ORDER BY recorded_at ASC",
            )?;
            let rows = stmt.query_map(params![vehicle_id, session_id], |row| {
                Ok(LocationSample {
                    id: row.get(0)?,
                    vehicle_id: VehicleId(row.get(1)?),
                    session_id: SessionId(row.get(2)?),
                    lat: row.get(3)?,
                    lng: row.get(4)?,
                    speed: row.get(5)?,
                    heading: row.get(6)?,
                    recorded_at: row.get(7)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::sessions::{end_session, start_session};
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn sample(vid: &VehicleId, sid: &SessionId, n: i64) -> LocationSample {
        LocationSample {
            id: format!("sample-{n}"),
            vehicle_id: vid.clone(),
            session_id: sid.clone(),
            lat: n as f64,
            lng: -(n as f64),
            speed: 10.0,
            heading: 90.0,
            recorded_at: Utc::now() + Duration::seconds(n),
        }
    }

    #[tokio::test]
    async fn history_is_ordered_by_recorded_at() {
        let (db, _dir) = setup_db().await;
        let vid = VehicleId::from("AMB-1");
        let session = start_session(&db, &vid).await.unwrap().unwrap();

        for n in [3, 1, 2] {
            insert_sample(&db, &sample(&vid, &session.id, n)).await.unwrap();
        }

        let history = session_history(&db, &vid, &session.id).await.unwrap();
        let lats: Vec<f64> = history.iter().map(|s| s.lat).collect();
        assert_eq!(lats, vec![1.0, 2.0, 3.0]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn history_is_scoped_to_vehicle_and_session() {
        let (db, _dir) = setup_db().await;
        let a = VehicleId::from("A");
        let b = VehicleId::from("B");
        let sa = start_session(&db, &a).await.unwrap().unwrap();
        let sb = start_session(&db, &b).await.unwrap().unwrap();
        insert_sample(&db, &sample(&a, &sa.id, 1)).await.unwrap();
        insert_sample(&db, &sample(&b, &sb.id, 2)).await.unwrap();

        assert_eq!(session_history(&db, &a, &sa.id).await.unwrap().len(), 1);
        assert!(session_history(&db, &a, &sb.id).await.unwrap().is_empty());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn sample_requires_existing_session() {
        let (db, _dir) = setup_db().await;
        let vid = VehicleId::from("A");
        let orphan = sample(&vid, &SessionId("missing".to_string()), 1);
        assert!(matches!(
            insert_sample(&db, &orphan).await,
            Err(FleetError::SessionNotFound { .. })
        ));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn ended_session_accepts_no_samples() {
        let (db, _dir) = setup_db().await;
        let vid = VehicleId::from("A");
        let session = start_session(&db, &vid).await.unwrap().unwrap();
        insert_sample(&db, &sample(&vid, &session.id, 1)).await.unwrap();
        end_session(&db, &vid).await.unwrap();

        let err = insert_sample(&db, &sample(&vid, &session.id, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, FleetError::SessionNotFound { vehicle_id } if vehicle_id == vid));
        assert_eq!(session_history(&db, &vid, &session.id).await.unwrap().len(), 1);
        db.close().await.unwrap();
    }
}
