// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection registry.
//!
//! A single task owns the driver and dashboard maps and applies operations
//! strictly in arrival order. Everything else talks to it through the
//! cloneable [`Hub`] handle.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use fleet_core::{ClientKind, FleetError, VehicleId};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cache::{CachedLocation, LocationCache};
use crate::mailbox::{Frame, Mailbox, PushError};
use crate::protocol::Outbound;

/// Identifier of one physical connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        ConnectionId(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What the registry knows about a live connection.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub id: ConnectionId,
    pub kind: ClientKind,
    /// Set for drivers only.
    pub vehicle_id: Option<VehicleId>,
    pub mailbox: Mailbox,
}

impl ClientHandle {
    pub fn driver(vehicle_id: VehicleId, mailbox: Mailbox) -> Self {
        Self {
            id: ConnectionId::new(),
            kind: ClientKind::Driver,
            vehicle_id: Some(vehicle_id),
            mailbox,
        }
    }

    pub fn dashboard(mailbox: Mailbox) -> Self {
        Self {
            id: ConnectionId::new(),
            kind: ClientKind::Dashboard,
            vehicle_id: None,
            mailbox,
        }
    }
}

/// Which clients a broadcast reaches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    All,
    /// Every driver.
    Mobile,
    /// Every dashboard.
    Web,
    /// A dashboard connection id or a driver's vehicle id.
    Specific(String),
}

impl Target {
    fn label(&self) -> &'static str {
        match self {
            Target::All => "all",
            Target::Mobile => "mobile",
            Target::Web => "web",
            Target::Specific(_) => "specific",
        }
    }
}

enum HubOp {
    Register(ClientHandle),
    Unregister(ClientHandle),
    Broadcast(Outbound, Target),
    OnlineVehicles(oneshot::Sender<Vec<VehicleId>>),
    CloseAll,
}

/// Cloneable handle to the registry task.
#[derive(Clone)]
pub struct Hub {
    ops: mpsc::Sender<HubOp>,
    cache: Arc<LocationCache>,
}

impl Hub {
    /// Spawn the registry task.
    ///
    /// The task runs until every `Hub` clone has been dropped.
    pub fn spawn(op_buffer: usize, cache: Arc<LocationCache>) -> (Hub, JoinHandle<()>) {
        let (ops, rx) = mpsc::channel(op_buffer.max(1));
        let registry = Registry {
            ops: rx,
            drivers: HashMap::new(),
            dashboards: HashMap::new(),
            cache: Arc::clone(&cache),
        };
        let handle = tokio::spawn(registry.run());
        (Hub { ops, cache }, handle)
    }

    async fn submit(&self, op: HubOp) -> Result<(), FleetError> {
        self.ops
            .send(op)
            .await
            .map_err(|_| FleetError::Internal("hub registry stopped".to_string()))
    }

    pub async fn register(&self, client: ClientHandle) -> Result<(), FleetError> {
        self.submit(HubOp::Register(client)).await
    }

    /// Remove a connection. A no-op if it is gone or was superseded.
    pub async fn unregister(&self, client: ClientHandle) -> Result<(), FleetError> {
        self.submit(HubOp::Unregister(client)).await
    }

    pub async fn broadcast(&self, message: Outbound, target: Target) -> Result<(), FleetError> {
        self.submit(HubOp::Broadcast(message, target)).await
    }

    /// Vehicle ids with a registered driver, sorted.
    pub async fn online_vehicle_ids(&self) -> Result<Vec<VehicleId>, FleetError> {
        let (tx, rx) = oneshot::channel();
        self.submit(HubOp::OnlineVehicles(tx)).await?;
        rx.await
            .map_err(|_| FleetError::Internal("hub registry dropped reply".to_string()))
    }

    /// Close every registered mailbox, ending those connections.
    pub async fn close_all(&self) -> Result<(), FleetError> {
        self.submit(HubOp::CloseAll).await
    }

    pub fn current_location(&self, vehicle_id: &VehicleId) -> Option<CachedLocation> {
        self.cache.get(vehicle_id)
    }

    pub fn cache(&self) -> &Arc<LocationCache> {
        &self.cache
    }
}

struct Registry {
    ops: mpsc::Receiver<HubOp>,
    drivers: HashMap<VehicleId, ClientHandle>,
    dashboards: HashMap<ConnectionId, ClientHandle>,
    cache: Arc<LocationCache>,
}

impl Registry {
    async fn run(mut self) {
        info!("hub registry started");
        while let Some(op) = self.ops.recv().await {
            match op {
                HubOp::Register(client) => self.register(client),
                HubOp::Unregister(client) => self.unregister(&client),
                HubOp::Broadcast(message, target) => self.broadcast(&message, &target),
                HubOp::OnlineVehicles(reply) => {
                    let mut ids: Vec<VehicleId> = self.drivers.keys().cloned().collect();
                    ids.sort();
                    let _ = reply.send(ids);
                }
                HubOp::CloseAll => self.close_all(),
            }
        }
        self.close_all();
        info!("hub registry stopped");
    }

    fn close_all(&self) {
        for client in self.drivers.values().chain(self.dashboards.values()) {
            client.mailbox.close();
        }
    }

    fn register(&mut self, client: ClientHandle) {
        match (client.kind, client.vehicle_id.clone()) {
            (ClientKind::Driver, Some(vehicle_id)) => {
                if let Some(previous) = self.drivers.remove(&vehicle_id) {
                    previous.mailbox.close();
                    debug!(
                        vehicle_id = %vehicle_id,
                        connection_id = %previous.id,
                        "replaced previous driver connection"
                    );
                }
                info!(vehicle_id = %vehicle_id, connection_id = %client.id, "driver registered");
                self.drivers.insert(vehicle_id.clone(), client);
                self.record_counts();
                self.broadcast(
                    &Outbound::VehicleOnline {
                        vehicle_id,
                        timestamp: Utc::now().timestamp(),
                    },
                    &Target::Web,
                );
            }
            (ClientKind::Driver, None) => {
                error!(connection_id = %client.id, "driver registration without vehicle id");
                client.mailbox.close();
            }
            (ClientKind::Dashboard, _) => {
                info!(connection_id = %client.id, "dashboard registered");
                let snapshot = Outbound::InitialLocations(self.cache.snapshot());
                let id = client.id;
                let delivered = match snapshot.to_frame() {
                    Ok(frame) => client.mailbox.try_push(frame).is_ok(),
                    Err(e) => {
                        error!(connection_id = %id, error = %e, "failed to encode snapshot");
                        false
                    }
                };
                self.dashboards.insert(id, client);
                if !delivered {
                    self.evict_dashboard(id);
                }
                self.record_counts();
            }
        }
    }

    fn unregister(&mut self, client: &ClientHandle) {
        match client.kind {
            ClientKind::Driver => {
                let Some(vehicle_id) = &client.vehicle_id else {
                    return;
                };
                let owned = self
                    .drivers
                    .get(vehicle_id)
                    .is_some_and(|current| current.id == client.id);
                if !owned {
                    return;
                }
                if let Some(removed) = self.drivers.remove(vehicle_id) {
                    removed.mailbox.close();
                    info!(vehicle_id = %vehicle_id, connection_id = %removed.id, "driver unregistered");
                    self.record_counts();
                    self.announce_offline(vehicle_id.clone());
                }
            }
            ClientKind::Dashboard => {
                if let Some(removed) = self.dashboards.remove(&client.id) {
                    removed.mailbox.close();
                    info!(connection_id = %removed.id, "dashboard unregistered");
                    self.record_counts();
                }
            }
        }
    }

    fn broadcast(&mut self, message: &Outbound, target: &Target) {
        let frame = match message.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!(error = %e, "dropping broadcast that failed to encode");
                return;
            }
        };
        fleet_prometheus::record_broadcast(target.label());

        let mut slow_drivers = Vec::new();
        let mut slow_dashboards = Vec::new();

        if matches!(target, Target::All | Target::Mobile) {
            for (vehicle_id, client) in &self.drivers {
                if let Err(reason) = client.mailbox.try_push(frame.clone()) {
                    log_refused(client, reason);
                    slow_drivers.push(vehicle_id.clone());
                }
            }
        }
        if matches!(target, Target::All | Target::Web) {
            for (id, client) in &self.dashboards {
                if let Err(reason) = client.mailbox.try_push(frame.clone()) {
                    log_refused(client, reason);
                    slow_dashboards.push(*id);
                }
            }
        }
        if let Target::Specific(key) = target {
            match self.find_specific(key) {
                Some(client) => {
                    if let Err(reason) = client.mailbox.try_push(frame.clone()) {
                        log_refused(client, reason);
                        match &client.vehicle_id {
                            Some(vehicle_id) => slow_drivers.push(vehicle_id.clone()),
                            None => slow_dashboards.push(client.id),
                        }
                    }
                }
                None => debug!(key = %key, "broadcast target not connected"),
            }
        }

        for id in slow_dashboards {
            self.evict_dashboard(id);
        }
        for vehicle_id in slow_drivers {
            self.evict_driver(&vehicle_id);
        }
    }

    fn find_specific(&self, key: &str) -> Option<&ClientHandle> {
        if let Some(client) = self.drivers.get(&VehicleId::from(key)) {
            return Some(client);
        }
        self.dashboards.values().find(|c| c.id.to_string() == key)
    }

    fn evict_dashboard(&mut self, id: ConnectionId) {
        if let Some(client) = self.dashboards.remove(&id) {
            client.mailbox.close();
            fleet_prometheus::record_eviction("dashboard");
            self.record_counts();
        }
    }

    fn evict_driver(&mut self, vehicle_id: &VehicleId) {
        if let Some(client) = self.drivers.remove(vehicle_id) {
            client.mailbox.close();
            fleet_prometheus::record_eviction("driver");
            self.record_counts();
            self.announce_offline(vehicle_id.clone());
        }
    }

    fn announce_offline(&mut self, vehicle_id: VehicleId) {
        self.broadcast(
            &Outbound::VehicleOffline {
                vehicle_id,
                timestamp: Utc::now().timestamp(),
            },
            &Target::Web,
        );
    }

    fn record_counts(&self) {
        fleet_prometheus::set_connections_active("driver", self.drivers.len());
        fleet_prometheus::set_connections_active("dashboard", self.dashboards.len());
    }
}

fn log_refused(client: &ClientHandle, reason: PushError) {
    match reason {
        PushError::Full => warn!(
            connection_id = %client.id,
            kind = %client.kind,
            "client mailbox full, evicting"
        ),
        PushError::Closed => debug!(
            connection_id = %client.id,
            kind = %client.kind,
            "client mailbox closed, evicting"
        ),
    }
}

/// Push a frame to one client outside the registry, ignoring refusal.
pub(crate) fn push_direct(mailbox: &Mailbox, frame: Frame) {
    if let Err(reason) = mailbox.try_push(frame) {
        debug!(?reason, "direct reply not delivered");
    }
}
