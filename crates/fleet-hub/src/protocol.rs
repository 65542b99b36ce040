// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire protocol between the hub and its clients.
//!
//! Every message is one text frame carrying an envelope:
//!
//! ```json
//! {"type": "location_update", "payload": {"lat": 1.0, "lng": 2.0, "timestamp": 1000}}
//! ```
//!
//! Client -> Hub:
//! - drivers: `location_update`, `status_update`, `ping`
//! - dashboards: `subscribe`, `ping`
//!
//! Hub -> Client: `vehicle_online`, `vehicle_offline`, `initial_locations`,
//! `location_update`, `status_update`, `pong`.

use fleet_core::{ClientKind, FleetError, VehicleId, VehicleStatus};
use serde::{Deserialize, Serialize};

use crate::cache::CachedLocation;
use crate::mailbox::Frame;

/// Message type names used on the wire.
pub mod message_types {
    pub const LOCATION_UPDATE: &str = "location_update";
    pub const STATUS_UPDATE: &str = "status_update";
    pub const SUBSCRIBE: &str = "subscribe";
    pub const PING: &str = "ping";
    pub const PONG: &str = "pong";
    pub const VEHICLE_ONLINE: &str = "vehicle_online";
    pub const VEHICLE_OFFLINE: &str = "vehicle_offline";
    pub const INITIAL_LOCATIONS: &str = "initial_locations";
}

/// Undecoded inbound envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Payload of a driver `location_update`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocationReport {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude")]
    pub lng: f64,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    /// Unix seconds. Arrival time is used when absent.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// How far past arrival time a reported timestamp may lie.
pub const MAX_FUTURE_SKEW_SECS: i64 = 300;

impl LocationReport {
    /// Attach the sender's identity, stamping the sample with `now` when the
    /// timestamp is missing or further than [`MAX_FUTURE_SKEW_SECS`] ahead.
    pub fn into_location(self, vehicle_id: VehicleId, now: i64) -> CachedLocation {
        let timestamp = match self.timestamp {
            Some(ts) if ts <= now.saturating_add(MAX_FUTURE_SKEW_SECS) => ts,
            _ => now,
        };
        CachedLocation {
            vehicle_id,
            lat: self.lat,
            lng: self.lng,
            speed: self.speed,
            heading: self.heading,
            accuracy: self.accuracy,
            timestamp,
        }
    }

    /// Whether the reported timestamp was replaced by arrival time.
    pub fn has_future_timestamp(&self, now: i64) -> bool {
        self.timestamp
            .is_some_and(|ts| ts > now.saturating_add(MAX_FUTURE_SKEW_SECS))
    }
}

/// Payload of a driver `status_update`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusReport {
    pub status: VehicleStatus,
}

/// A decoded message a client of the given kind is allowed to send.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    LocationUpdate(LocationReport),
    StatusUpdate(StatusReport),
    Subscribe,
    Ping,
}

/// Result of decoding one inbound frame.
#[derive(Debug, PartialEq)]
pub enum Decoded {
    Message(Inbound),
    /// A well-formed envelope whose type the sender may not use, or an unknown type.
    Ignored { kind: String },
}

/// Decode a text frame from a client of kind `sender`.
///
/// Malformed JSON or a malformed payload for a known type is a
/// [`FleetError::Protocol`].
pub fn decode(sender: ClientKind, text: &str) -> Result<Decoded, FleetError> {
    let envelope: Envelope = serde_json::from_str(text)
        .map_err(|e| FleetError::protocol(format!("invalid envelope: {e}")))?;

    let inbound = match (sender, envelope.kind.as_str()) {
        (ClientKind::Driver, message_types::LOCATION_UPDATE) => {
            Inbound::LocationUpdate(payload(&envelope)?)
        }
        (ClientKind::Driver, message_types::STATUS_UPDATE) => {
            Inbound::StatusUpdate(payload(&envelope)?)
        }
        (ClientKind::Dashboard, message_types::SUBSCRIBE) => Inbound::Subscribe,
        (_, message_types::PING) => Inbound::Ping,
        _ => return Ok(Decoded::Ignored { kind: envelope.kind }),
    };
    Ok(Decoded::Message(inbound))
}

fn payload<T: for<'de> Deserialize<'de>>(envelope: &Envelope) -> Result<T, FleetError> {
    T::deserialize(&envelope.payload).map_err(|e| {
        FleetError::protocol(format!("invalid {} payload: {e}", envelope.kind))
    })
}

/// A hub-originated message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Outbound {
    VehicleOnline {
        vehicle_id: VehicleId,
        timestamp: i64,
    },
    VehicleOffline {
        vehicle_id: VehicleId,
        timestamp: i64,
    },
    InitialLocations(Vec<CachedLocation>),
    LocationUpdate(CachedLocation),
    StatusUpdate {
        vehicle_id: VehicleId,
        status: VehicleStatus,
        timestamp: i64,
    },
    Pong,
}

impl Outbound {
    /// The wire `type` of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Outbound::VehicleOnline { .. } => message_types::VEHICLE_ONLINE,
            Outbound::VehicleOffline { .. } => message_types::VEHICLE_OFFLINE,
            Outbound::InitialLocations(_) => message_types::INITIAL_LOCATIONS,
            Outbound::LocationUpdate(_) => message_types::LOCATION_UPDATE,
            Outbound::StatusUpdate { .. } => message_types::STATUS_UPDATE,
            Outbound::Pong => message_types::PONG,
        }
    }

    /// Serialize into a single text frame.
    pub fn to_frame(&self) -> Result<Frame, FleetError> {
        serde_json::to_string(self)
            .map(Frame::from)
            .map_err(|e| FleetError::protocol(format!("failed to encode {}: {e}", self.kind())))
    }
}
