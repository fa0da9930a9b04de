//! Frames exchanged over the scoreboard WebSocket channel.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::dto::validation::validate_topic;
use crate::state::board::ScoreboardState;

/// Error raised when an inbound frame cannot be parsed or fails validation.
/// Callers drop the frame and leave state untouched.
#[derive(Debug, Error)]
pub enum WireError {
    /// The payload was not valid JSON for the expected shape.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The payload parsed but carried an unacceptable field.
    #[error("invalid frame: {0}")]
    Invalid(#[from] validator::ValidationError),
}

/// Commands accepted from connected clients.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(tag = "command")]
pub enum ClientCommand {
    /// Register interest in a topic; answered with a subscription
    /// confirmation followed by a directed snapshot frame.
    #[serde(rename = "subscribe")]
    Subscribe {
        /// Match key naming the channel.
        topic: String,
    },
    /// Stop delivery for a topic.
    #[serde(rename = "unsubscribe")]
    Unsubscribe {
        /// Match key naming the channel.
        topic: String,
    },
    /// Publish an action envelope to a topic the client is subscribed to.
    #[serde(rename = "message")]
    Message {
        /// Match key naming the channel.
        topic: String,
        /// JSON-string-encoded [`ActionEnvelope`].
        data: String,
    },
    /// Any command this server does not know; ignored.
    #[serde(other)]
    Unknown,
}

impl ClientCommand {
    /// Parse and validate a raw inbound text frame.
    pub fn from_json_str(raw: &str) -> Result<Self, WireError> {
        let command: Self = serde_json::from_str(raw)?;
        match &command {
            Self::Subscribe { topic }
            | Self::Unsubscribe { topic }
            | Self::Message { topic, .. } => {
                validate_topic(topic)?;
            }
            Self::Unknown => {}
        }
        Ok(command)
    }
}

/// Frames pushed from the server to connected clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type")]
pub enum ServerFrame {
    /// Greeting sent once per connection.
    #[serde(rename = "welcome")]
    Welcome,
    /// Periodic keepalive carrying a unix timestamp.
    #[serde(rename = "ping")]
    Ping {
        /// Seconds since the unix epoch at send time.
        message: i64,
    },
    /// Acknowledges a subscribe command.
    #[serde(rename = "confirm_subscription")]
    ConfirmSubscription {
        /// Topic the subscription was registered on.
        topic: String,
    },
    /// Full scoreboard snapshot, sent directly after subscribe and as the
    /// fan-out of every published envelope.
    #[serde(rename = "state")]
    State {
        /// Topic the snapshot belongs to.
        topic: String,
        /// The complete shared state; receivers replace wholesale.
        payload: ScoreboardState,
    },
    /// Any frame this client does not know; ignored.
    #[serde(other)]
    Unknown,
}

impl ServerFrame {
    /// Parse a raw inbound text frame on the client side.
    pub fn from_json_str(raw: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Presentational flavor of a published state. Both variants store and
/// rebroadcast identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeAction {
    /// Routine mutation from an operator action or a clock tick.
    Update,
    /// Wholesale replacement, e.g. a new game.
    Reset,
}

/// Application-level envelope carried inside a `message` command.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActionEnvelope {
    /// Presentational action tag.
    pub action: EnvelopeAction,
    /// The full state authored by the publishing control session.
    pub payload: ScoreboardState,
}

impl ActionEnvelope {
    /// Parse the string-encoded envelope out of a `message` command's data
    /// field.
    pub fn from_json_str(raw: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(raw)?)
    }
}
