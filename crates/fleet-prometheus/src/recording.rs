// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics. Without an installed recorder every call is a no-op.

use metrics::{describe_counter, describe_gauge};

pub const CONNECTIONS_ACTIVE: &str = "fleet_connections_active";
pub const BROADCASTS_TOTAL: &str = "fleet_broadcasts_total";
pub const EVICTIONS_TOTAL: &str = "fleet_evictions_total";
pub const LOCATION_UPDATES_TOTAL: &str = "fleet_location_updates_total";
pub const PERSISTENCE_DROPPED_TOTAL: &str = "fleet_persistence_dropped_total";
pub const PERSISTENCE_FAILURES_TOTAL: &str = "fleet_persistence_failures_total";

/// Register all fleet metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_gauge!(CONNECTIONS_ACTIVE, "Registered hub connections by client kind");
    describe_counter!(BROADCASTS_TOTAL, "Broadcast operations processed by the hub");
    describe_counter!(
        EVICTIONS_TOTAL,
        "Clients evicted because their mailbox was full or closed"
    );
    describe_counter!(
        LOCATION_UPDATES_TOTAL,
        "Driver location updates by outcome (applied or stale)"
    );
    describe_counter!(
        PERSISTENCE_DROPPED_TOTAL,
        "Persistence jobs dropped because the queue was full"
    );
    describe_counter!(
        PERSISTENCE_FAILURES_TOTAL,
        "Persistence jobs that failed against storage"
    );
}

/// Set the number of registered connections of one kind.
pub fn set_connections_active(kind: &str, count: usize) {
    metrics::gauge!(CONNECTIONS_ACTIVE, "kind" => kind.to_string()).set(count as f64);
}

/// Record a processed broadcast.
pub fn record_broadcast(target: &str) {
    metrics::counter!(BROADCASTS_TOTAL, "target" => target.to_string()).increment(1);
}

/// Record an evicted client.
pub fn record_eviction(kind: &str) {
    metrics::counter!(EVICTIONS_TOTAL, "kind" => kind.to_string()).increment(1);
}

/// Record a driver location update and whether it reached the cache.
pub fn record_location_update(applied: bool) {
    let outcome = if applied { "applied" } else { "stale" };
    metrics::counter!(LOCATION_UPDATES_TOTAL, "outcome" => outcome).increment(1);
}

/// Record a persistence job dropped at enqueue.
pub fn record_persistence_dropped(job: &str) {
    metrics::counter!(PERSISTENCE_DROPPED_TOTAL, "job" => job.to_string()).increment(1);
}

/// Record a persistence job that failed.
pub fn record_persistence_failure(job: &str) {
    metrics::counter!(PERSISTENCE_FAILURES_TOTAL, "job" => job.to_string()).increment(1);
}
