//! Dialog engine reply types: the raw wire variants and the normalized message unit.

use serde::{Deserialize, Serialize};

/// Declared content kind of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    PlainText,
    Ssml,
    CustomPayload,
    /// A kind no accumulation rule handles (e.g. "ImageResponseCard").
    Other(String),
}

impl MessageKind {
    /// Map a wire tag (`contentType`, `messageFormat`, composite `type`) to a kind.
    pub fn from_wire(tag: &str) -> Self {
        match tag {
            "PlainText" => MessageKind::PlainText,
            "SSML" => MessageKind::Ssml,
            "CustomPayload" => MessageKind::CustomPayload,
            other => MessageKind::Other(other.to_string()),
        }
    }

    pub fn as_wire(&self) -> &str {
        match self {
            MessageKind::PlainText => "PlainText",
            MessageKind::Ssml => "SSML",
            MessageKind::CustomPayload => "CustomPayload",
            MessageKind::Other(tag) => tag.as_str(),
        }
    }
}

/// One normalized message: kind + text, in reply order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageUnit {
    pub kind: MessageKind,
    pub text: String,
}

impl MessageUnit {
    pub fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(MessageKind::PlainText, text)
    }

    pub fn ssml(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Ssml, text)
    }

    pub fn custom_payload(text: impl Into<String>) -> Self {
        Self::new(MessageKind::CustomPayload, text)
    }
}

/// Current-generation wire message: `{ "contentType", "content" }`.
/// Image cards carry no `content`; it decodes as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    pub content_type: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl From<WireMessage> for MessageUnit {
    fn from(m: WireMessage) -> Self {
        MessageUnit::new(
            MessageKind::from_wire(&m.content_type),
            m.content.unwrap_or_default(),
        )
    }
}

/// Current-generation message list: inline JSON array, or base64 of a compressed JSON array.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageList {
    Inline(serde_json::Value),
    Compressed(String),
}

/// The dialog engine's reply as received, tagged by the wire format that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawReply {
    /// Previous generation, one `message` with a non-composite `messageFormat`.
    LegacySingle { kind: MessageKind, message: String },
    /// Previous generation, `messageFormat: "Composite"`; `message` is JSON-encoded.
    LegacyComposite { message: String },
    /// Current generation, `messages` list.
    Modern { messages: MessageList },
}

impl RawReply {
    /// Detect the wire variant of a reply body. Returns None when the body is not a JSON object.
    /// A reply with neither `messages` nor `messageFormat` is an empty current-generation reply.
    pub fn from_json(body: serde_json::Value) -> Option<Self> {
        let serde_json::Value::Object(mut obj) = body else {
            return None;
        };
        if let Some(messages) = obj.remove("messages") {
            let messages = match messages {
                serde_json::Value::String(s) => MessageList::Compressed(s),
                serde_json::Value::Null => {
                    MessageList::Inline(serde_json::Value::Array(Vec::new()))
                }
                other => MessageList::Inline(other),
            };
            return Some(RawReply::Modern { messages });
        }
        if let Some(format) = obj.get("messageFormat").and_then(|v| v.as_str()) {
            let message = obj
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            if format == "Composite" {
                return Some(RawReply::LegacyComposite { message });
            }
            return Some(RawReply::LegacySingle {
                kind: MessageKind::from_wire(format),
                message,
            });
        }
        Some(RawReply::empty())
    }

    /// A current-generation reply with no messages.
    pub fn empty() -> Self {
        RawReply::Modern {
            messages: MessageList::Inline(serde_json::Value::Array(Vec::new())),
        }
    }
}
