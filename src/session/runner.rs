//! Async shell driving a [`ScoreboardSession`] over a live WebSocket.
//!
//! The runner owns the three event sources the session reacts to — inbound
//! frames, operator actions, and the two one-second tickers — and reconnects
//! with capped exponential backoff when the transport drops. Sends are
//! fire-and-forget: no acknowledgement is awaited before the next tick or
//! render.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior, interval, sleep};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{info, warn};

use crate::dto::ws::{ActionEnvelope, ClientCommand, ServerFrame};
use crate::session::{ControlAction, Role, ScoreboardSession, SessionSettings};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Run a session against the channel endpoint at `url` until the action
/// sender is dropped.
///
/// Operator actions arrive through `actions`; non-control sessions may pass
/// a receiver that never yields. The runner resubscribes after every
/// reconnect, so the latest snapshot restores continuity.
pub async fn run(
    url: &str,
    settings: SessionSettings,
    role: Role,
    mut actions: mpsc::UnboundedReceiver<ControlAction>,
) -> anyhow::Result<()> {
    let mut session = ScoreboardSession::new(settings, role);
    let mut backoff = INITIAL_BACKOFF;

    loop {
        let mut socket = match connect_async(url).await {
            Ok((socket, _response)) => {
                backoff = INITIAL_BACKOFF;
                socket
            }
            Err(err) => {
                warn!(error = %err, "connection failed; retrying");
                sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
                continue;
            }
        };

        info!(topic = %session.match_key(), role = ?session.role(), "session connected");
        let subscribe = serde_json::to_string(&session.subscribe_command())?;
        if socket.send(Message::Text(subscribe)).await.is_err() {
            session.on_disconnect();
            continue;
        }

        let finished = drive(&mut socket, &mut session, &mut actions).await;
        session.on_disconnect();
        if finished {
            let _ = socket.close(None).await;
            return Ok(());
        }

        info!(topic = %session.match_key(), "disconnected; awaiting reconnection");
        sleep(backoff).await;
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

/// Pump one connection until it drops. Returns true when the operator hung
/// up (action sender dropped) and the session should wind down for good.
async fn drive(
    socket: &mut Socket,
    session: &mut ScoreboardSession,
    actions: &mut mpsc::UnboundedReceiver<ControlAction>,
) -> bool {
    let mut period_ticker = second_ticker();
    let mut shot_ticker = second_ticker();

    loop {
        let period_armed = session.wants_period_tick();
        let shot_armed = session.wants_shot_tick();

        let outbound = tokio::select! {
            frame = socket.next() => match frame {
                Some(Ok(Message::Text(text))) => match ServerFrame::from_json_str(&text) {
                    Ok(frame) => session.handle_frame(frame),
                    Err(err) => {
                        warn!(error = %err, "dropping malformed frame");
                        None
                    }
                },
                Some(Ok(Message::Close(_))) | None => return false,
                Some(Ok(_)) => None,
                Some(Err(err)) => {
                    warn!(error = %err, "websocket error");
                    return false;
                }
            },
            action = actions.recv() => match action {
                Some(action) => session.apply(action),
                None => return true,
            },
            _ = period_ticker.tick(), if period_armed => session.tick_period(),
            _ = shot_ticker.tick(), if shot_armed => session.tick_shot(),
        };

        if let Some(envelope) = outbound {
            if publish(socket, session.match_key(), envelope).await.is_err() {
                return false;
            }
        }

        // Re-arm a ticker that just went live so the first decrement lands a
        // full second after the toggle, not immediately.
        if !period_armed && session.wants_period_tick() {
            period_ticker = second_ticker();
        }
        if !shot_armed && session.wants_shot_tick() {
            shot_ticker = second_ticker();
        }
    }
}

fn second_ticker() -> Interval {
    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.reset();
    ticker
}

/// Wrap an envelope in a `message` command and push it onto the socket.
/// Serialization failures are permanent and only logged; transport failures
/// bubble up so the caller can reconnect.
async fn publish(
    socket: &mut Socket,
    topic: &str,
    envelope: ActionEnvelope,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let data = match serde_json::to_string(&envelope) {
        Ok(data) => data,
        Err(err) => {
            warn!(error = %err, "failed to serialize envelope; dropping");
            return Ok(());
        }
    };
    let command = ClientCommand::Message {
        topic: topic.to_string(),
        data,
    };
    let raw = match serde_json::to_string(&command) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(error = %err, "failed to serialize command; dropping");
            return Ok(());
        }
    };
    socket.send(Message::Text(raw)).await
}
