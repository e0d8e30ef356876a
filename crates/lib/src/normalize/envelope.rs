//! Response assembler: the boundary-facing turn envelope.

use super::InstructionSet;
use crate::session::ConversationPayload;
use serde::{Deserialize, Serialize};

/// `{ "answer", "instructions", "conversationPayload" }` returned to the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    pub answer: String,
    pub instructions: InstructionSet,
    pub conversation_payload: ConversationPayload,
}

pub fn assemble(
    answer: String,
    instructions: InstructionSet,
    conversation_payload: ConversationPayload,
) -> TurnResponse {
    TurnResponse {
        answer,
        instructions,
        conversation_payload,
    }
}
