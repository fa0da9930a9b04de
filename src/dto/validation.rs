//! Validation helpers for wire-level inputs.

use validator::ValidationError;

/// Longest accepted topic / match key.
const MAX_TOPIC_LEN: usize = 128;

/// Validates that a topic (match key) is non-empty, bounded, and free of
/// whitespace and control characters.
///
/// Keys are otherwise opaque: the surrounding application mints `match:<id>`
/// keys for persisted matches and the session library mints
/// `standalone:<uuid>` keys for ephemeral boards, but nothing here depends on
/// either shape.
pub fn validate_topic(topic: &str) -> Result<(), ValidationError> {
    if topic.is_empty() {
        let mut err = ValidationError::new("topic_empty");
        err.message = Some("topic must not be empty".into());
        return Err(err);
    }

    if topic.len() > MAX_TOPIC_LEN {
        let mut err = ValidationError::new("topic_length");
        err.message =
            Some(format!("topic must be at most {MAX_TOPIC_LEN} bytes (got {})", topic.len()).into());
        return Err(err);
    }

    if topic.chars().any(|c| c.is_whitespace() || c.is_control()) {
        let mut err = ValidationError::new("topic_format");
        err.message = Some("topic must not contain whitespace or control characters".into());
        return Err(err);
    }

    Ok(())
}
