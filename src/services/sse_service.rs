//! Read-only SSE mirror of a match topic, for embedding a scoreboard where a
//! WebSocket client is unwanted.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use crate::dto::ws::ServerFrame;
use crate::state::SharedState;
use crate::state::board::ScoreboardState;

/// Convert a hub receiver into an SSE response, emitting the current
/// snapshot first and then every state frame broadcast on the topic.
pub fn to_sse_stream(
    state: SharedState,
    topic: String,
    initial: ScoreboardState,
    mut receiver: broadcast::Receiver<ServerFrame>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if let Some(event) = state_event(&initial) {
            if tx.send(Ok(event)).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(ServerFrame::State { payload, .. }) => {
                            let Some(event) = state_event(&payload) else {
                                continue;
                            };
                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Ok(_) => continue,
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // Skip lagged frames; the next one supersedes them.
                            continue;
                        }
                    }
                }
            }
        }

        // Release our receiver before pruning so an otherwise-idle topic is
        // actually dropped.
        drop(receiver);
        state.hub().prune(&topic);
        info!(%topic, "live SSE stream disconnected");
    });

    // response stream reads from mpsc; when the client disconnects axum
    // drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn state_event(payload: &ScoreboardState) -> Option<Event> {
    serde_json::to_string(payload)
        .ok()
        .map(|data| Event::default().event("state").data(data))
}
