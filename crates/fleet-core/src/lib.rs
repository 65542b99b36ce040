// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the fleet dispatch hub.
//!
//! This crate provides the domain types, error type, and collaborator traits
//! used throughout the workspace. Storage backends implement the traits
//! defined here; the hub only ever holds them as trait objects.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::FleetError;
pub use types::{
    AdapterType, ClientKind, HealthStatus, LocationSample, NewVehicle, SessionId, SessionStatus,
    TrackingSession, Vehicle, VehicleId, VehicleStatus,
};

pub use traits::{PluginAdapter, TokenVerifier, TrackingSessionManager, VehicleDirectory};
