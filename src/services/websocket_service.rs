//! Per-connection WebSocket handling: the subscribe/unsubscribe/message
//! command protocol and the fan-out plumbing behind it.
//!
//! The server stays a stateless relay: it never inspects scoreboard
//! semantics, it only persists published snapshots and forwards frames.

use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use time::OffsetDateTime;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dto::ws::{ActionEnvelope, ClientCommand, ServerFrame};
use crate::services::snapshot_service;
use crate::state::SharedState;

/// Handle the full lifecycle of one client connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we
    // await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    send_frame(&outbound_tx, &ServerFrame::Welcome);
    let ping_task = spawn_ping(state.config().ping_interval, outbound_tx.clone());

    let mut subscriptions: HashMap<String, JoinHandle<()>> = HashMap::new();

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let command = match ClientCommand::from_json_str(&text) {
                    Ok(command) => command,
                    Err(err) => {
                        warn!(error = %err, "dropping malformed command");
                        continue;
                    }
                };
                handle_command(&state, &outbound_tx, &mut subscriptions, command).await;
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) | Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(error = %err, "websocket error");
                break;
            }
        }
    }

    for (topic, forwarder) in subscriptions.drain() {
        forwarder.abort();
        // Wait for the forwarder to release its receiver so the prune sees
        // the true subscriber count.
        let _ = forwarder.await;
        state.hub().prune(&topic);
    }
    ping_task.abort();
    info!("client disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Dispatch one parsed client command.
async fn handle_command(
    state: &SharedState,
    outbound_tx: &mpsc::UnboundedSender<Message>,
    subscriptions: &mut HashMap<String, JoinHandle<()>>,
    command: ClientCommand,
) {
    match command {
        ClientCommand::Subscribe { topic } => {
            if !subscriptions.contains_key(&topic) {
                let receiver = state.hub().subscribe(&topic);
                let forwarder = spawn_forwarder(topic.clone(), receiver, outbound_tx.clone());
                subscriptions.insert(topic.clone(), forwarder);
                info!(%topic, "subscribed");
            } else {
                warn!(%topic, "duplicate subscribe; resending snapshot");
            }

            send_frame(
                outbound_tx,
                &ServerFrame::ConfirmSubscription {
                    topic: topic.clone(),
                },
            );

            // Directed snapshot so the new subscriber converges without
            // waiting for the next broadcast.
            match snapshot_service::fetch_or_init(state, &topic).await {
                Ok(payload) => {
                    send_frame(outbound_tx, &ServerFrame::State { topic, payload });
                }
                Err(err) => warn!(%topic, error = %err, "failed to fetch snapshot"),
            }
        }
        ClientCommand::Unsubscribe { topic } => {
            if let Some(forwarder) = subscriptions.remove(&topic) {
                forwarder.abort();
                let _ = forwarder.await;
                state.hub().prune(&topic);
                info!(%topic, "unsubscribed");
            }
        }
        ClientCommand::Message { topic, data } => {
            if !subscriptions.contains_key(&topic) {
                warn!(%topic, "dropping message for a topic this client is not subscribed to");
                return;
            }
            match ActionEnvelope::from_json_str(&data) {
                Ok(envelope) => {
                    snapshot_service::store_and_broadcast(state, &topic, envelope).await;
                }
                Err(err) => warn!(%topic, error = %err, "dropping malformed envelope"),
            }
        }
        ClientCommand::Unknown => debug!("ignoring unknown command"),
    }
}

/// Bridge a hub receiver into the connection's writer channel. Lagged
/// receivers skip what they missed and keep going; the latest state always
/// supersedes anything skipped.
fn spawn_forwarder(
    topic: String,
    mut receiver: broadcast::Receiver<ServerFrame>,
    outbound_tx: mpsc::UnboundedSender<Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(frame) => {
                    if !send_frame(&outbound_tx, &frame) {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%topic, skipped, "subscriber lagged; skipping to latest");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Periodic keepalive frames carrying the server's clock.
fn spawn_ping(
    interval: std::time::Duration,
    outbound_tx: mpsc::UnboundedSender<Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let frame = ServerFrame::Ping {
                message: OffsetDateTime::now_utc().unix_timestamp(),
            };
            if !send_frame(&outbound_tx, &frame) {
                break;
            }
        }
    })
}

/// Serialize a frame onto the writer channel. Returns false when the writer
/// is gone; serialization failure is permanent and only logged.
fn send_frame(outbound_tx: &mpsc::UnboundedSender<Message>, frame: &ServerFrame) -> bool {
    let payload = match serde_json::to_string(frame) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize frame `{frame:?}`");
            return true;
        }
    };
    outbound_tx.send(Message::Text(payload.into())).is_ok()
}

/// Ensure the writer task winds down before we return from the socket
/// handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
