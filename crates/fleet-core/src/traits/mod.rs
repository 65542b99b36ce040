// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! All traits use `#[async_trait]` so they can be held as `Arc<dyn ...>`
//! and injected into the hub at startup.

pub mod adapter;
pub mod auth;
pub mod directory;
pub mod tracking;

pub use adapter::PluginAdapter;
pub use auth::TokenVerifier;
pub use directory::VehicleDirectory;
pub use tracking::TrackingSessionManager;
