// SPDX-FileCopyrightText: 2026 Fleet Dispatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-connection actor: a reader and a writer sharing one mailbox.
//!
//! The loops are generic over any `Stream`/`Sink` of WebSocket messages so
//! they can be driven by an in-memory channel in tests.

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::Message;
use chrono::Utc;
use fleet_config::model::HubConfig;
use fleet_core::ClientKind;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use crate::cache::CacheUpdate;
use crate::mailbox::{Frame, MailboxReceiver};
use crate::persistence::{PersistenceJob, PersistenceQueue};
use crate::protocol::{self, Decoded, Inbound, LocationReport, Outbound, StatusReport};
use crate::registry::{push_direct, ClientHandle, Hub, Target};

/// Connection timers, taken from `[hub]`.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    pub liveness_timeout: Duration,
    pub keepalive_interval: Duration,
    pub write_timeout: Duration,
}

impl From<&HubConfig> for Timing {
    fn from(config: &HubConfig) -> Self {
        Self {
            liveness_timeout: config.liveness_timeout(),
            keepalive_interval: config.keepalive_interval(),
            write_timeout: config.write_timeout(),
        }
    }
}

/// Everything a connection needs to act on inbound messages.
#[derive(Clone)]
pub struct ConnectionContext {
    pub hub: Hub,
    pub persistence: PersistenceQueue,
    pub timing: Timing,
}

/// Register `client`, run both duties until either stops, then unregister.
pub async fn run_connection<S>(
    socket: S,
    client: ClientHandle,
    mailbox: MailboxReceiver,
    ctx: ConnectionContext,
) where
    S: Stream<Item = Result<Message, axum::Error>>
        + Sink<Message, Error = axum::Error>
        + Send
        + 'static,
{
    let (sink, stream) = socket.split();

    if let Err(e) = ctx.hub.register(client.clone()).await {
        warn!(connection_id = %client.id, error = %e, "registration failed");
        return;
    }

    let writer = tokio::spawn(write_loop(sink, mailbox, ctx.timing, client.clone()));
    read_loop(stream, &client, &ctx).await;

    client.mailbox.close();
    if let Err(e) = ctx.hub.unregister(client.clone()).await {
        debug!(connection_id = %client.id, error = %e, "unregister after hub stopped");
    }
    let _ = writer.await;
    debug!(connection_id = %client.id, kind = %client.kind, "connection finished");
}

/// Drain the mailbox onto the socket.
///
/// Pending frames are fed together and flushed once. A ping is sent when
/// nothing was written for `keepalive_interval`. Ends on close, on write
/// error or timeout, or when every mailbox producer is gone.
pub async fn write_loop<W>(
    mut sink: W,
    mut mailbox: MailboxReceiver,
    timing: Timing,
    client: ClientHandle,
) where
    W: Sink<Message, Error = axum::Error> + Unpin,
{
    let closed = mailbox.closed_token();
    let keepalive = tokio::time::sleep(timing.keepalive_interval);
    tokio::pin!(keepalive);

    loop {
        tokio::select! {
            biased;
            _ = closed.cancelled() => {
                let _ = timeout(timing.write_timeout, sink.send(Message::Close(None))).await;
                break;
            }
            frame = mailbox.recv() => {
                let Some(frame) = frame else { break };
                if let Err(reason) = write_batch(&mut sink, &mut mailbox, frame, timing.write_timeout).await {
                    warn!(connection_id = %client.id, %reason, "write failed");
                    break;
                }
                keepalive.as_mut().reset(Instant::now() + timing.keepalive_interval);
            }
            _ = &mut keepalive => {
                let ping = timeout(timing.write_timeout, sink.send(Message::Ping(Bytes::new()))).await;
                if !matches!(ping, Ok(Ok(()))) {
                    warn!(connection_id = %client.id, "keepalive ping failed");
                    break;
                }
                keepalive.as_mut().reset(Instant::now() + timing.keepalive_interval);
            }
        }
    }

    // Wakes the reader if the writer gave up first.
    client.mailbox.close();
}

async fn write_batch<W>(
    sink: &mut W,
    mailbox: &mut MailboxReceiver,
    first: Frame,
    write_timeout: Duration,
) -> Result<(), String>
where
    W: Sink<Message, Error = axum::Error> + Unpin,
{
    let batch = async {
        sink.feed(Message::Text(first)).await?;
        while let Some(frame) = mailbox.try_recv() {
            sink.feed(Message::Text(frame)).await?;
        }
        sink.flush().await
    };
    match timeout(write_timeout, batch).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("timed out after {write_timeout:?}")),
    }
}

/// Read frames until the peer leaves, goes quiet, or the mailbox is closed.
pub async fn read_loop<R>(mut stream: R, client: &ClientHandle, ctx: &ConnectionContext)
where
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let closed = client.mailbox.closed_token();
    loop {
        let next = tokio::select! {
            _ = closed.cancelled() => break,
            next = timeout(ctx.timing.liveness_timeout, stream.next()) => next,
        };
        let message = match next {
            Err(_) => {
                info!(connection_id = %client.id, kind = %client.kind, "liveness deadline expired");
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                debug!(connection_id = %client.id, error = %e, "transport error");
                break;
            }
            Ok(Some(Ok(message))) => message,
        };
        match message {
            Message::Text(text) => handle_text(ctx, client, text.as_str()).await,
            Message::Close(_) => break,
            Message::Binary(_) => debug!(connection_id = %client.id, "ignoring binary frame"),
            // Counted toward liveness; nothing else to do.
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }
}

/// Decode and dispatch one text frame. Malformed input is logged and dropped.
pub async fn handle_text(ctx: &ConnectionContext, client: &ClientHandle, text: &str) {
    match protocol::decode(client.kind, text) {
        Ok(Decoded::Message(message)) => dispatch(ctx, client, message).await,
        Ok(Decoded::Ignored { kind }) => {
            debug!(connection_id = %client.id, sender = %client.kind, kind = %kind, "ignoring message type");
        }
        Err(e) => {
            warn!(connection_id = %client.id, error = %e, "dropping malformed frame");
        }
    }
}

async fn dispatch(ctx: &ConnectionContext, client: &ClientHandle, message: Inbound) {
    match message {
        Inbound::LocationUpdate(report) => on_location(ctx, client, report).await,
        Inbound::StatusUpdate(report) => on_status(ctx, client, report).await,
        Inbound::Subscribe => debug!(connection_id = %client.id, "subscribe acknowledged"),
        Inbound::Ping => match Outbound::Pong.to_frame() {
            Ok(frame) => push_direct(&client.mailbox, frame),
            Err(e) => warn!(error = %e, "failed to encode pong"),
        },
    }
}

async fn on_location(ctx: &ConnectionContext, client: &ClientHandle, report: LocationReport) {
    let (ClientKind::Driver, Some(vehicle_id)) = (client.kind, &client.vehicle_id) else {
        return;
    };
    let now = Utc::now().timestamp();
    if report.has_future_timestamp(now) {
        debug!(
            vehicle_id = %vehicle_id,
            reported = ?report.timestamp,
            "timestamp too far ahead, using arrival time"
        );
    }
    let location = report.into_location(vehicle_id.clone(), now);

    // History is ordered by recorded time, so late samples are still stored.
    ctx.persistence
        .enqueue(PersistenceJob::RecordLocation(location.clone()));

    if let CacheUpdate::Stale { cached_timestamp } = ctx.hub.cache().update(location.clone()) {
        debug!(
            vehicle_id = %vehicle_id,
            timestamp = location.timestamp,
            cached_timestamp,
            "out-of-order location not broadcast"
        );
        fleet_prometheus::record_location_update(false);
        return;
    }
    fleet_prometheus::record_location_update(true);

    if let Err(e) = ctx
        .hub
        .broadcast(Outbound::LocationUpdate(location), Target::Web)
        .await
    {
        warn!(vehicle_id = %vehicle_id, error = %e, "location broadcast failed");
    }
}

async fn on_status(ctx: &ConnectionContext, client: &ClientHandle, report: StatusReport) {
    let (ClientKind::Driver, Some(vehicle_id)) = (client.kind, &client.vehicle_id) else {
        return;
    };
    ctx.persistence.enqueue(PersistenceJob::UpdateStatus {
        vehicle_id: vehicle_id.clone(),
        status: report.status,
    });
    let message = Outbound::StatusUpdate {
        vehicle_id: vehicle_id.clone(),
        status: report.status,
        timestamp: Utc::now().timestamp(),
    };
    if let Err(e) = ctx.hub.broadcast(message, Target::Web).await {
        warn!(vehicle_id = %vehicle_id, error = %e, "status broadcast failed");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fleet_config::model::PersistenceConfig;
    use fleet_core::{TrackingSessionManager, VehicleId, VehicleStatus};
    use fleet_test_utils::{MockDirectory, MockTracking};
    use futures::channel::mpsc;
    use serde_json::Value;

    use super::*;
    use crate::cache::LocationCache;
    use crate::mailbox::mailbox;
    use crate::persistence::{spawn_workers, PersistenceBackends};

    struct Fixture {
        ctx: ConnectionContext,
        tracking: Arc<MockTracking>,
        directory: Arc<MockDirectory>,
    }

    fn fixture(timing: Timing) -> Fixture {
        let tracking = Arc::new(MockTracking::new());
        let directory = Arc::new(MockDirectory::new());
        directory.insert_vehicle("AMB-1");
        let backends = PersistenceBackends {
            tracking: tracking.clone(),
            directory: directory.clone(),
        };
        let (persistence, _workers) = spawn_workers(
            &PersistenceConfig {
                queue_capacity: 16,
                workers: 1,
            },
            backends,
        );
        let (hub, _task) = Hub::spawn(64, Arc::new(LocationCache::new(true)));
        Fixture {
            ctx: ConnectionContext {
                hub,
                persistence,
                timing,
            },
            tracking,
            directory,
        }
    }

    fn slow_timing() -> Timing {
        Timing {
            liveness_timeout: Duration::from_secs(60),
            keepalive_interval: Duration::from_secs(50),
            write_timeout: Duration::from_secs(10),
        }
    }

    fn text(value: Value) -> Result<Message, axum::Error> {
        Ok(Message::Text(value.to_string().into()))
    }

    async fn next_json(rx: &mut MailboxReceiver) -> Value {
        let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out")
            .expect("producer dropped");
        serde_json::from_str(frame.as_str()).unwrap()
    }

    #[tokio::test]
    async fn ping_gets_pong_on_own_mailbox() {
        let f = fixture(slow_timing());
        let (tx, mut rx) = mailbox(8);
        let client = ClientHandle::dashboard(tx);
        handle_text(&f.ctx, &client, r#"{"type":"ping"}"#).await;
        assert_eq!(next_json(&mut rx).await, serde_json::json!({"type": "pong"}));
    }

    #[tokio::test]
    async fn malformed_frames_are_dropped_without_reply() {
        let f = fixture(slow_timing());
        let (tx, mut rx) = mailbox(8);
        let client = ClientHandle::driver(VehicleId::from("AMB-1"), tx.clone());
        handle_text(&f.ctx, &client, "{not json").await;
        handle_text(&f.ctx, &client, r#"{"type":"location_update","payload":{"lat":"x"}}"#).await;
        handle_text(&f.ctx, &client, r#"{"type":"subscribe"}"#).await;
        assert!(rx.try_recv().is_none());
        assert!(!tx.is_closed());
        assert!(f.ctx.hub.cache().is_empty());
    }

    #[tokio::test]
    async fn location_update_reaches_dashboards_and_cache() {
        let f = fixture(slow_timing());
        let (dash_tx, mut dash_rx) = mailbox(8);
        f.ctx.hub.register(ClientHandle::dashboard(dash_tx)).await.unwrap();
        assert_eq!(next_json(&mut dash_rx).await["type"], "initial_locations");

        let (drv_tx, mut drv_rx) = mailbox(8);
        let driver = ClientHandle::driver(VehicleId::from("AMB-1"), drv_tx);
        handle_text(
            &f.ctx,
            &driver,
            r#"{"type":"location_update","payload":{"latitude":-6.2,"longitude":106.8,"timestamp":100}}"#,
        )
        .await;

        let update = next_json(&mut dash_rx).await;
        assert_eq!(update["type"], "location_update");
        assert_eq!(update["payload"]["vehicle_id"], "AMB-1");
        assert_eq!(update["payload"]["lat"], -6.2);
        assert_eq!(update["payload"]["timestamp"], 100);
        assert!(drv_rx.try_recv().is_none());

        let cached = f.ctx.hub.current_location(&VehicleId::from("AMB-1")).unwrap();
        assert_eq!(cached.lng, 106.8);
    }

    #[tokio::test]
    async fn stale_location_is_not_broadcast() {
        let f = fixture(slow_timing());
        let (dash_tx, mut dash_rx) = mailbox(8);
        f.ctx.hub.register(ClientHandle::dashboard(dash_tx)).await.unwrap();
        next_json(&mut dash_rx).await;

        let (drv_tx, _drv_rx) = mailbox(8);
        let driver = ClientHandle::driver(VehicleId::from("AMB-1"), drv_tx);
        handle_text(&f.ctx, &driver, r#"{"type":"location_update","payload":{"lat":1,"lng":1,"timestamp":200}}"#).await;
        handle_text(&f.ctx, &driver, r#"{"type":"location_update","payload":{"lat":2,"lng":2,"timestamp":100}}"#).await;
        f.ctx.hub.online_vehicle_ids().await.unwrap();

        assert_eq!(next_json(&mut dash_rx).await["payload"]["timestamp"], 200);
        assert!(dash_rx.try_recv().is_none());
        assert_eq!(f.ctx.hub.current_location(&VehicleId::from("AMB-1")).unwrap().lat, 1.0);
    }

    #[tokio::test]
    async fn future_timestamp_does_not_freeze_live_view() {
        let f = fixture(slow_timing());
        let (dash_tx, mut dash_rx) = mailbox(8);
        f.ctx.hub.register(ClientHandle::dashboard(dash_tx)).await.unwrap();
        next_json(&mut dash_rx).await;

        let (drv_tx, _drv_rx) = mailbox(8);
        let driver = ClientHandle::driver(VehicleId::from("AMB-1"), drv_tx);
        handle_text(
            &f.ctx,
            &driver,
            r#"{"type":"location_update","payload":{"lat":1,"lng":1,"timestamp":1893456000000}}"#,
        )
        .await;
        let glitch = next_json(&mut dash_rx).await;
        assert!(glitch["payload"]["timestamp"].as_i64().unwrap() <= Utc::now().timestamp());

        for lat in [2, 3, 4] {
            let frame = format!(r#"{{"type":"location_update","payload":{{"lat":{lat},"lng":1}}}}"#);
            handle_text(&f.ctx, &driver, &frame).await;
            let update = next_json(&mut dash_rx).await;
            assert_eq!(update["payload"]["lat"], lat as f64);
        }
        assert_eq!(f.ctx.hub.current_location(&VehicleId::from("AMB-1")).unwrap().lat, 4.0);
    }

    #[tokio::test]
    async fn out_of_order_sample_is_still_persisted() {
        let f = fixture(slow_timing());
        let session = f.tracking.start_session(&VehicleId::from("AMB-1")).await.unwrap();
        let (dash_tx, mut dash_rx) = mailbox(8);
        f.ctx.hub.register(ClientHandle::dashboard(dash_tx)).await.unwrap();
        next_json(&mut dash_rx).await;

        let (drv_tx, _drv_rx) = mailbox(8);
        let driver = ClientHandle::driver(VehicleId::from("AMB-1"), drv_tx);
        handle_text(&f.ctx, &driver, r#"{"type":"location_update","payload":{"lat":1,"lng":1,"timestamp":200}}"#).await;
        handle_text(&f.ctx, &driver, r#"{"type":"location_update","payload":{"lat":2,"lng":2,"timestamp":100}}"#).await;
        f.ctx.hub.online_vehicle_ids().await.unwrap();
        assert_eq!(next_json(&mut dash_rx).await["payload"]["timestamp"], 200);
        assert!(dash_rx.try_recv().is_none());

        for _ in 0..50 {
            if f.tracking.all_samples().len() == 2 {
                let history = f
                    .tracking
                    .fetch_history(&VehicleId::from("AMB-1"), &session.id)
                    .await
                    .unwrap();
                let stamps: Vec<i64> = history.iter().map(|s| s.recorded_at.timestamp()).collect();
                assert_eq!(stamps, vec![100, 200]);
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("late sample was never persisted");
    }

    #[tokio::test]
    async fn persistence_failure_does_not_block_broadcasts() {
        let f = fixture(slow_timing());
        let (dash_tx, mut dash_rx) = mailbox(8);
        f.ctx.hub.register(ClientHandle::dashboard(dash_tx)).await.unwrap();
        next_json(&mut dash_rx).await;

        // GHOST is unknown to the directory, so every write for it fails.
        let (drv_tx, _drv_rx) = mailbox(8);
        let driver = ClientHandle::driver(VehicleId::from("GHOST"), drv_tx);
        handle_text(&f.ctx, &driver, r#"{"type":"location_update","payload":{"lat":5,"lng":6}}"#).await;
        handle_text(&f.ctx, &driver, r#"{"type":"status_update","payload":{"status":"on_duty"}}"#).await;

        let location = next_json(&mut dash_rx).await;
        assert_eq!(location["type"], "location_update");
        assert_eq!(location["payload"]["vehicle_id"], "GHOST");
        let status = next_json(&mut dash_rx).await;
        assert_eq!(status["type"], "status_update");
        assert_eq!(status["payload"]["status"], "on_duty");

        let cached = f.ctx.hub.current_location(&VehicleId::from("GHOST")).unwrap();
        assert_eq!((cached.lat, cached.lng), (5.0, 6.0));
        assert!(f.directory.vehicle("GHOST").is_none());
    }

    #[tokio::test]
    async fn status_update_is_broadcast_and_persisted() {
        let f = fixture(slow_timing());
        let (dash_tx, mut dash_rx) = mailbox(8);
        f.ctx.hub.register(ClientHandle::dashboard(dash_tx)).await.unwrap();
        next_json(&mut dash_rx).await;

        let (drv_tx, _drv_rx) = mailbox(8);
        let driver = ClientHandle::driver(VehicleId::from("AMB-1"), drv_tx);
        handle_text(&f.ctx, &driver, r#"{"type":"status_update","payload":{"status":"maintenance"}}"#).await;

        let msg = next_json(&mut dash_rx).await;
        assert_eq!(msg["type"], "status_update");
        assert_eq!(msg["payload"]["status"], "maintenance");

        for _ in 0..50 {
            if f.directory.vehicle("AMB-1").unwrap().status == VehicleStatus::Maintenance {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("status was never persisted");
    }

    #[tokio::test]
    async fn dashboards_cannot_send_driver_messages() {
        let f = fixture(slow_timing());
        let (tx, _rx) = mailbox(8);
        let dash = ClientHandle::dashboard(tx);
        handle_text(&f.ctx, &dash, r#"{"type":"location_update","payload":{"lat":1,"lng":1}}"#).await;
        assert!(f.ctx.hub.cache().is_empty());
    }

    #[tokio::test]
    async fn writer_coalesces_pending_frames_and_closes() {
        let (tx, rx) = mailbox(8);
        let client = ClientHandle::dashboard(tx.clone());
        tx.try_push(Frame::from("one")).unwrap();
        tx.try_push(Frame::from("two")).unwrap();

        let (sink, mut out) = mpsc::unbounded::<Message>();
        let sink = sink.sink_map_err(axum::Error::new);
        let writer = tokio::spawn(write_loop(sink, rx, slow_timing(), client));

        assert_eq!(out.next().await, Some(Message::Text("one".into())));
        assert_eq!(out.next().await, Some(Message::Text("two".into())));
        tx.close();
        assert_eq!(out.next().await, Some(Message::Close(None)));
        writer.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn writer_sends_keepalive_when_idle() {
        let (tx, rx) = mailbox(8);
        let client = ClientHandle::dashboard(tx.clone());
        let (sink, mut out) = mpsc::unbounded::<Message>();
        let sink = sink.sink_map_err(axum::Error::new);
        let timing = Timing {
            keepalive_interval: Duration::from_secs(5),
            ..slow_timing()
        };
        let writer = tokio::spawn(write_loop(sink, rx, timing, client));

        let first = out.next().await;
        assert!(matches!(first, Some(Message::Ping(_))));
        tx.close();
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn writer_stops_on_sink_error() {
        let (tx, rx) = mailbox(8);
        let client = ClientHandle::dashboard(tx.clone());
        let (sink, out) = mpsc::unbounded::<Message>();
        drop(out);
        let sink = sink.sink_map_err(axum::Error::new);
        tx.try_push(Frame::from("lost")).unwrap();
        write_loop(sink, rx, slow_timing(), client).await;
        assert!(tx.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn silent_peer_hits_liveness_deadline() {
        let f = fixture(Timing {
            liveness_timeout: Duration::from_secs(3),
            ..slow_timing()
        });
        let (tx, _rx) = mailbox(8);
        let client = ClientHandle::dashboard(tx);
        let (_keep_open, stream) = mpsc::unbounded::<Result<Message, axum::Error>>();
        read_loop(stream, &client, &f.ctx).await;
    }

    #[tokio::test]
    async fn reader_stops_on_close_frame() {
        let f = fixture(slow_timing());
        let (tx, mut rx) = mailbox(8);
        let client = ClientHandle::dashboard(tx);
        let (in_tx, stream) = mpsc::unbounded();
        in_tx.unbounded_send(text(serde_json::json!({"type": "ping"}))).unwrap();
        in_tx.unbounded_send(Ok(Message::Close(None))).unwrap();
        in_tx.unbounded_send(text(serde_json::json!({"type": "ping"}))).unwrap();
        read_loop(stream, &client, &f.ctx).await;
        assert!(rx.try_recv().is_some());
        assert!(rx.try_recv().is_none());
    }

    #[tokio::test]
    async fn run_connection_unregisters_driver_on_disconnect() {
        let f = fixture(slow_timing());
        let (dash_tx, mut dash_rx) = mailbox(8);
        f.ctx.hub.register(ClientHandle::dashboard(dash_tx)).await.unwrap();
        next_json(&mut dash_rx).await;

        let (in_tx, stream) = mpsc::unbounded::<Result<Message, axum::Error>>();
        let (sink, _out) = mpsc::unbounded::<Message>();
        let socket = Duplex {
            stream,
            sink: sink.sink_map_err(axum::Error::new),
        };
        let (tx, rx) = mailbox(8);
        let driver = ClientHandle::driver(VehicleId::from("AMB-1"), tx);
        let task = tokio::spawn(run_connection(socket, driver, rx, f.ctx.clone()));

        assert_eq!(next_json(&mut dash_rx).await["type"], "vehicle_online");
        drop(in_tx);
        assert_eq!(next_json(&mut dash_rx).await["type"], "vehicle_offline");
        task.await.unwrap();
        assert!(f.ctx.hub.online_vehicle_ids().await.unwrap().is_empty());
    }

    /// Joins a stream and a sink into one socket-like value.
    struct Duplex<St, Si> {
        stream: St,
        sink: Si,
    }

    impl<St: Stream + Unpin, Si: Unpin> Stream for Duplex<St, Si> {
        type Item = St::Item;

        fn poll_next(
            mut self: std::pin::Pin<&mut Self>,
            cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Option<Self::Item>> {
            self.stream.poll_next_unpin(cx)
        }
    }

    impl<St: Unpin, Si: Sink<Message> + Unpin> Sink<Message> for Duplex<St, Si> {
        type Error = Si::Error;

        fn poll_ready(
            mut self: std::pin::Pin<&mut Self>,
            cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Result<(), Self::Error>> {
            self.sink.poll_ready_unpin(cx)
        }

        fn start_send(mut self: std::pin::Pin<&mut Self>, item: Message) -> Result<(), Self::Error> {
            self.sink.start_send_unpin(item)
        }

        fn poll_flush(
            mut self: std::pin::Pin<&mut Self>,
            cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Result<(), Self::Error>> {
            self.sink.poll_flush_unpin(cx)
        }

        fn poll_close(
            mut self: std::pin::Pin<&mut Self>,
            cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Result<(), Self::Error>> {
            self.sink.poll_close_unpin(cx)
        }
    }
}
