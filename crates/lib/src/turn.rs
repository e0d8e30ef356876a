//! Turn dispatcher: picks the upstream call for a front-end turn and normalizes the reply.

use crate::config::DialogConfig;
use crate::dialog::{DialogEngine, UpstreamCallError};
use crate::format::ResponseFormatter;
use crate::gateway::{InboundRequest, RequestError, TurnKind};
use crate::normalize::{self, DecodeError, TurnResponse};
use crate::session::{self, ConversationPayload};

/// Sent instead of an empty question: the engine rejects empty input, and a lone
/// non-alphanumeric character lands in its fallback/clarification path.
pub const EMPTY_QUESTION_PLACEHOLDER: &str = ".";

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("bad request: {0}")]
    BadRequest(#[from] RequestError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Upstream(#[from] UpstreamCallError),
}

/// Text forwarded to the engine for a question.
pub fn question_text(question: &str) -> &str {
    if question.is_empty() {
        EMPTY_QUESTION_PLACEHOLDER
    } else {
        question
    }
}

/// Run one turn: upstream call by turn kind, then decode, normalize and assemble.
pub async fn run_turn(
    config: &DialogConfig,
    engine: &dyn DialogEngine,
    formatter: &dyn ResponseFormatter,
    request: &InboundRequest,
) -> Result<TurnResponse, TurnError> {
    let (reply, conversation_payload) = match request.turn_kind()? {
        TurnKind::Welcome => {
            let token = session::new_session_token();
            log::debug!("session start {} (intent {})", token, config.welcome_intent);
            let reply = engine.start_session(&token, &config.welcome_intent).await?;
            (reply, ConversationPayload::start(&token))
        }
        TurnKind::Question => {
            let payload = request.conversation_payload()?;
            let token = payload
                .session_token()
                .ok_or(RequestError::MissingSessionToken)?
                .to_string();
            log::debug!("continuation {}", token);
            let reply = engine
                .recognize_text(&token, question_text(request.question_text()))
                .await?;
            (reply, payload)
        }
    };
    let normalized = normalize::normalize_reply(&reply, formatter)?;
    if !normalized.diagnostics.is_empty() {
        log::debug!("turn completed with {} diagnostic(s)", normalized.diagnostics.len());
    }
    Ok(normalize::assemble(
        normalized.answer,
        normalized.instructions,
        conversation_payload,
    ))
}
