//! Text formatting: plain answer → SSML, and the instruction contract check.

use crate::normalize::{InstructionParseError, InstructionSet};

/// Formatting collaborator used by the normalizer.
pub trait ResponseFormatter: Send + Sync {
    /// Turn accumulated plain text into caller-ready markup.
    fn format_answer(&self, text: &str) -> String;

    /// Validate and normalize the author-supplied instructions JSON.
    fn parse_instructions(&self, json_text: &str) -> Result<InstructionSet, InstructionParseError>;
}

/// Default formatter: XML-escapes the text and wraps it in `<speak>`; instructions must be a JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct SsmlFormatter;

impl ResponseFormatter for SsmlFormatter {
    fn format_answer(&self, text: &str) -> String {
        format!("<speak>{}</speak>", escape_xml(text))
    }

    fn parse_instructions(&self, json_text: &str) -> Result<InstructionSet, InstructionParseError> {
        match serde_json::from_str::<serde_json::Value>(json_text)? {
            serde_json::Value::Object(map) => Ok(InstructionSet::from(map)),
            other => Err(InstructionParseError::Contract(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Escape the five XML special characters.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
