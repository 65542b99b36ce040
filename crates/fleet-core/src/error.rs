// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the fleet dispatch hub.

use thiserror::Error;

use crate::types::VehicleId;

/// The primary error type used across collaborator traits and hub operations.
#[derive(Debug, Error)]
pub enum FleetError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A malformed protocol envelope or payload.
    #[error("protocol error: {message}")]
    Protocol { message: String },

    /// Missing or invalid credentials at connection upgrade or on the REST API.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A client mailbox could not accept another message.
    #[error("mailbox full for connection {connection_id}")]
    Capacity { connection_id: String },

    /// An active tracking session already exists for the vehicle.
    #[error("tracking session already active for vehicle {vehicle_id}")]
    SessionConflict { vehicle_id: VehicleId },

    /// No active tracking session exists for the vehicle.
    #[error("no active tracking session for vehicle {vehicle_id}")]
    SessionNotFound { vehicle_id: VehicleId },

    /// The vehicle is not known to the directory.
    #[error("vehicle not found: {vehicle_id}")]
    VehicleNotFound { vehicle_id: VehicleId },

    /// A background persistence call failed.
    #[error("persistence error: {message}")]
    Persistence {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Transport-level failures (bind, socket, upgrade).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FleetError {
    /// Shorthand for a [`FleetError::Protocol`] with the given message.
    pub fn protocol(message: impl Into<String>) -> Self {
        FleetError::Protocol {
            message: message.into(),
        }
    }

    /// Returns `true` for the two lifecycle conflicts that callers are
    /// expected to handle as ordinary results.
    pub fn is_session_state(&self) -> bool {
        matches!(
            self,
            FleetError::SessionConflict { .. } | FleetError::SessionNotFound { .. }
        )
    }
}
