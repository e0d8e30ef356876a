//! Front-end wire types: the inbound turn request and error bodies.

use crate::session::ConversationPayload;
use serde::{Deserialize, Serialize};

/// Turn kind from `fm-avatar.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TurnKind {
    /// Session start.
    Welcome,
    /// Continuation with the user's question.
    Question,
}

/// Contextual information sent with each turn (`fm-avatar`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarContext {
    #[serde(rename = "type")]
    pub kind: TurnKind,
}

/// Wire request: `{ "fm-question", "fm-conversation", "fm-avatar" }`.
/// `fm-conversation` and `fm-avatar` are stringified JSON on the wire; objects are accepted too.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundRequest {
    #[serde(rename = "fm-question", default)]
    pub question: Option<String>,
    #[serde(rename = "fm-conversation", default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<serde_json::Value>,
    #[serde(rename = "fm-avatar", default)]
    pub avatar: serde_json::Value,
}

/// Invalid front-end request.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("fm-avatar is missing or invalid: {0}")]
    Avatar(String),
    #[error("fm-conversation is required on a QUESTION turn")]
    MissingConversation,
    #[error("fm-conversation is invalid: {0}")]
    Conversation(#[from] crate::session::SessionError),
    #[error("fm-conversation has no session token")]
    MissingSessionToken,
}

impl InboundRequest {
    /// Session-start request as the front end sends it.
    pub fn welcome() -> Self {
        Self {
            question: Some(String::new()),
            conversation: None,
            avatar: serde_json::Value::String(r#"{"type":"WELCOME"}"#.to_string()),
        }
    }

    /// Continuation request carrying the previous turn's conversation payload.
    pub fn question(text: impl Into<String>, conversation: &ConversationPayload) -> Self {
        let conversation = serde_json::to_string(conversation).unwrap_or_else(|_| "{}".to_string());
        Self {
            question: Some(text.into()),
            conversation: Some(serde_json::Value::String(conversation)),
            avatar: serde_json::Value::String(r#"{"type":"QUESTION"}"#.to_string()),
        }
    }

    /// The question text; absent means empty.
    pub fn question_text(&self) -> &str {
        self.question.as_deref().unwrap_or("")
    }

    pub fn turn_kind(&self) -> Result<TurnKind, RequestError> {
        let avatar = match &self.avatar {
            serde_json::Value::String(s) => serde_json::from_str::<AvatarContext>(s)
                .map_err(|e| RequestError::Avatar(e.to_string()))?,
            serde_json::Value::Null => {
                return Err(RequestError::Avatar("missing".to_string()));
            }
            other => serde_json::from_value::<AvatarContext>(other.clone())
                .map_err(|e| RequestError::Avatar(e.to_string()))?,
        };
        Ok(avatar.kind)
    }

    /// The caller's conversation payload (continuation turns).
    pub fn conversation_payload(&self) -> Result<ConversationPayload, RequestError> {
        let raw = self
            .conversation
            .clone()
            .filter(|v| !v.is_null())
            .ok_or(RequestError::MissingConversation)?;
        Ok(ConversationPayload::from_value(raw)?)
    }
}

/// Error body: `{ "error": message }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
