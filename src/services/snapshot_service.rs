//! Orchestration between the snapshot store and the broadcast hub.

use tracing::{debug, warn};

use crate::dto::validation::validate_topic;
use crate::dto::ws::{ActionEnvelope, ServerFrame};
use crate::error::ServiceError;
use crate::state::SharedState;
use crate::state::board::ScoreboardState;

/// Fetch the snapshot for `key`, initializing the default when absent.
pub async fn fetch_or_init(
    state: &SharedState,
    key: &str,
) -> Result<ScoreboardState, ServiceError> {
    validate_topic(key).map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
    Ok(state.store().fetch_or_init(key).await?)
}

/// Drop the snapshot for `key`. The surrounding application calls this
/// whenever the match's team or game composition changes shape, so stale
/// rosters never survive a reshuffle.
pub async fn invalidate(state: &SharedState, key: &str) -> Result<bool, ServiceError> {
    validate_topic(key).map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
    Ok(state.store().invalidate(key).await?)
}

/// Persist a published envelope and fan the resulting state frame out to the
/// topic.
///
/// The write is fire-and-forget from the publisher's perspective: a store
/// failure is logged and the broadcast still goes out, because the in-flight
/// state remains authoritative for currently-connected viewers either way.
pub async fn store_and_broadcast(state: &SharedState, topic: &str, envelope: ActionEnvelope) {
    if let Err(err) = state.store().write(topic, envelope.payload.clone()).await {
        warn!(%topic, error = %err, "snapshot write failed; broadcasting anyway");
    }

    let delivered = state.hub().publish(
        topic,
        ServerFrame::State {
            topic: topic.to_string(),
            payload: envelope.payload,
        },
    );
    debug!(%topic, delivered, action = ?envelope.action, "state published");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::dto::ws::EnvelopeAction;
    use crate::state::AppState;
    use crate::state::board::{ScoreboardState, Team};

    fn shared_state() -> SharedState {
        AppState::new(AppConfig::default())
    }

    #[tokio::test]
    async fn fetch_on_unseen_key_initializes_default() {
        let state = shared_state();
        let snapshot = fetch_or_init(&state, "match:1").await.unwrap();
        assert_eq!(snapshot, ScoreboardState::default());
    }

    #[tokio::test]
    async fn invalid_keys_are_rejected() {
        let state = shared_state();
        assert!(matches!(
            fetch_or_init(&state, "").await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            invalidate(&state, "has space").await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn store_and_broadcast_persists_then_fans_out() {
        let state = shared_state();
        let mut subscriber = state.hub().subscribe("match:1");

        let mut payload =
            ScoreboardState::synthesized(vec![Team::new(1, "A", "red"), Team::new(2, "B", "blue")], 600, 24);
        payload.teams[0].score = 9;
        let envelope = ActionEnvelope {
            action: EnvelopeAction::Update,
            payload: payload.clone(),
        };

        store_and_broadcast(&state, "match:1", envelope).await;

        let frame = subscriber.recv().await.unwrap();
        let ServerFrame::State { topic, payload: received } = frame else {
            panic!("expected a state frame");
        };
        assert_eq!(topic, "match:1");
        assert_eq!(received, payload);

        // Late joiner converges from the persisted snapshot.
        assert_eq!(fetch_or_init(&state, "match:1").await.unwrap(), payload);
    }

    #[tokio::test]
    async fn invalidate_resets_to_default_on_next_fetch() {
        let state = shared_state();
        let mut payload = ScoreboardState::default();
        payload.quarter = 4;
        store_and_broadcast(
            &state,
            "match:1",
            ActionEnvelope {
                action: EnvelopeAction::Reset,
                payload,
            },
        )
        .await;

        assert!(invalidate(&state, "match:1").await.unwrap());
        let fresh = fetch_or_init(&state, "match:1").await.unwrap();
        assert_eq!(fresh.quarter, 1);
    }
}
