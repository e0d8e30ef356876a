//! Session identifiers and the caller-opaque conversation payload.
//!
//! Nothing is persisted here: the session token travels to the front end inside
//! `conversationPayload` and comes back on the next turn.

use serde::{Deserialize, Serialize};

/// Dialog engine session identifier (opaque string).
pub type SessionToken = String;

/// Key under which a freshly started session stores its token.
pub const SESSION_TOKEN_KEY: &str = "sessionToken";

/// Key used by earlier deployments; still honored on continuation turns.
const LEGACY_SESSION_KEY: &str = "platformSessionId";

/// Mint a new session token.
pub fn new_session_token() -> SessionToken {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("conversation payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("conversation payload must be a JSON object")]
    NotAnObject,
}

/// Continuation token handed to the front end and round-tripped verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationPayload(serde_json::Map<String, serde_json::Value>);

impl ConversationPayload {
    /// Payload for a newly started session: `{ "sessionToken": token }`.
    pub fn start(token: &str) -> Self {
        let mut map = serde_json::Map::new();
        map.insert(
            SESSION_TOKEN_KEY.to_string(),
            serde_json::Value::String(token.to_string()),
        );
        Self(map)
    }

    /// Accept either a stringified JSON object or an object.
    pub fn from_value(value: serde_json::Value) -> Result<Self, SessionError> {
        let value = match value {
            serde_json::Value::String(s) => serde_json::from_str(&s)?,
            other => other,
        };
        match value {
            serde_json::Value::Object(map) => Ok(Self(map)),
            _ => Err(SessionError::NotAnObject),
        }
    }

    /// Session token, falling back to the legacy key.
    pub fn session_token(&self) -> Option<&str> {
        [SESSION_TOKEN_KEY, LEGACY_SESSION_KEY]
            .into_iter()
            .filter_map(|k| self.0.get(k).and_then(|v| v.as_str()))
            .find(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn start_payload_holds_token() {
        let token = new_session_token();
        let payload = ConversationPayload::start(&token);
        assert_eq!(payload.session_token(), Some(token.as_str()));
        assert_eq!(serde_json::to_value(&payload).unwrap(), json!({ "sessionToken": token }));
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(new_session_token(), new_session_token());
    }

    #[test]
    fn parses_stringified_payload_and_keeps_extra_fields() {
        let raw = json!(r#"{"sessionToken":"abc","step":3}"#);
        let payload = ConversationPayload::from_value(raw).unwrap();
        assert_eq!(payload.session_token(), Some("abc"));
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({ "sessionToken": "abc", "step": 3 })
        );
    }

    #[test]
    fn legacy_key_is_honored() {
        let payload =
            ConversationPayload::from_value(json!({ "platformSessionId": "old" })).unwrap();
        assert_eq!(payload.session_token(), Some("old"));
    }

    #[test]
    fn rejects_non_objects() {
        assert!(matches!(
            ConversationPayload::from_value(json!("[1]")),
            Err(SessionError::NotAnObject)
        ));
        assert!(matches!(
            ConversationPayload::from_value(json!("{oops")),
            Err(SessionError::Json(_))
        ));
    }
}
