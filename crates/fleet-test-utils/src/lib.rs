// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for fleet dispatch hub tests.
//!
//! - [`MockTracking`] - in-memory tracking session manager
//! - [`MockDirectory`] - in-memory vehicle directory
//! - [`TempStore`] - SQLite store in a temporary directory

pub mod mock_directory;
pub mod mock_tracking;
pub mod temp_store;

pub use mock_directory::MockDirectory;
pub use mock_tracking::MockTracking;
pub use temp_store::TempStore;
