//! Payload decoder: any raw reply variant → ordered message units.
//!
//! Only the envelope and encoding are restructured; text content is never inspected.

use super::reply::{MessageKind, MessageList, MessageUnit, RawReply, WireMessage};
use base64::Engine;
use flate2::read::{GzDecoder, ZlibDecoder};
use serde::Deserialize;
use std::io::Read;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Malformed or corrupt message list. Fatal to the turn.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("message list is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("message list could not be decompressed: {0}")]
    Decompress(#[from] std::io::Error),
    #[error("message list is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Composite entry of a previous-generation reply.
#[derive(Debug, Deserialize)]
struct CompositeEntry {
    #[serde(rename = "type")]
    typ: String,
    #[serde(default)]
    value: Option<String>,
}

/// `{"messages": [...]}`, the engine's own composite layout.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CompositeMessage {
    List(Vec<CompositeEntry>),
    Wrapped { messages: Vec<CompositeEntry> },
}

/// Decode a reply into its ordered message units.
pub fn decode(reply: &RawReply) -> Result<Vec<MessageUnit>, DecodeError> {
    match reply {
        RawReply::Modern {
            messages: MessageList::Inline(list),
        } => {
            let list: Vec<WireMessage> = serde_json::from_value(list.clone())?;
            Ok(list.into_iter().map(MessageUnit::from).collect())
        }
        RawReply::Modern {
            messages: MessageList::Compressed(encoded),
        } => {
            let list = decompress_messages(encoded)?;
            Ok(list.into_iter().map(MessageUnit::from).collect())
        }
        RawReply::LegacySingle { kind, message } => {
            Ok(vec![MessageUnit::new(kind.clone(), message.clone())])
        }
        RawReply::LegacyComposite { message } => decode_composite(message),
    }
}

/// base64 → gunzip/inflate → JSON array of wire messages.
fn decompress_messages(encoded: &str) -> Result<Vec<WireMessage>, DecodeError> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
    let mut json = String::new();
    if bytes.starts_with(&GZIP_MAGIC) {
        GzDecoder::new(bytes.as_slice()).read_to_string(&mut json)?;
    } else {
        ZlibDecoder::new(bytes.as_slice()).read_to_string(&mut json)?;
    }
    Ok(serde_json::from_str(&json)?)
}

fn decode_composite(message: &str) -> Result<Vec<MessageUnit>, DecodeError> {
    let entries = match serde_json::from_str::<CompositeMessage>(message)? {
        CompositeMessage::List(entries) => entries,
        CompositeMessage::Wrapped { messages } => messages,
    };
    Ok(entries
        .into_iter()
        .map(|e| MessageUnit::new(MessageKind::from_wire(&e.typ), e.value.unwrap_or_default()))
        .collect())
}
