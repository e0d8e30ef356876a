//! Instruction extractor: the first CustomPayload message carries the front end's instructions.

use super::Diagnostic;
use crate::format::ResponseFormatter;
use serde::{Deserialize, Serialize};

/// Structured instructions for the front end's rendering pipeline. Serializes as a JSON object (`{}` when empty).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstructionSet(serde_json::Map<String, serde_json::Value>);

impl InstructionSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for InstructionSet {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(map)
    }
}

/// A CustomPayload that could not be turned into instructions. Non-fatal.
#[derive(Debug, thiserror::Error)]
pub enum InstructionParseError {
    #[error("custom payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("custom payload has no instructions field")]
    MissingInstructions,
    #[error("instructions rejected: {0}")]
    Contract(String),
}

/// Parse one CustomPayload text into instructions.
/// CR/LF are stripped first; authoring tools insert them and they break JSON string literals.
pub fn parse_custom_payload(
    text: &str,
    formatter: &dyn ResponseFormatter,
) -> Result<InstructionSet, InstructionParseError> {
    let cleaned: String = text.chars().filter(|c| *c != '\r' && *c != '\n').collect();
    let payload: serde_json::Value = serde_json::from_str(&cleaned)?;
    let instructions = payload
        .get("instructions")
        .ok_or(InstructionParseError::MissingInstructions)?;
    formatter.parse_instructions(&serde_json::to_string(instructions)?)
}

/// First-wins extraction over the CustomPayload messages of one reply.
#[derive(Debug, Default)]
pub struct InstructionExtractor {
    seen_payload: bool,
    instructions: InstructionSet,
}

impl InstructionExtractor {
    /// Feed the CustomPayload at message `index`. Only the first one is parsed; failures and later payloads become diagnostics.
    pub fn push(
        &mut self,
        index: usize,
        text: &str,
        formatter: &dyn ResponseFormatter,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        if self.seen_payload {
            log::info!("ignored additional custom payload at message {}", index);
            diagnostics.push(Diagnostic::DuplicatePayloadIgnored { index });
            return;
        }
        self.seen_payload = true;
        match parse_custom_payload(text, formatter) {
            Ok(instructions) => self.instructions = instructions,
            Err(error) => {
                log::warn!("could not parse custom payload at message {}: {}", index, error);
                diagnostics.push(Diagnostic::InstructionParse { index, error });
            }
        }
    }

    pub fn finish(self) -> InstructionSet {
        self.instructions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::SsmlFormatter;
    use serde_json::json;

    #[test]
    fn line_breaks_inside_strings_are_stripped() {
        let text = "{\"instructions\": {\"displayHtml\": {\"html\": \"<p>one\r\ntwo</p>\"}}}";
        let set = parse_custom_payload(text, &SsmlFormatter).unwrap();
        assert_eq!(
            set.get("displayHtml"),
            Some(&json!({ "html": "<p>onetwo</p>" }))
        );
    }

    #[test]
    fn missing_instructions_field() {
        let err = parse_custom_payload(r#"{"other": 1}"#, &SsmlFormatter).unwrap_err();
        assert!(matches!(err, InstructionParseError::MissingInstructions));
    }

    #[test]
    fn non_object_instructions_are_rejected() {
        let err = parse_custom_payload(r#"{"instructions": [1, 2]}"#, &SsmlFormatter).unwrap_err();
        assert!(matches!(err, InstructionParseError::Contract(_)));
    }

    #[test]
    fn first_payload_wins() {
        let mut diagnostics = Vec::new();
        let mut extractor = InstructionExtractor::default();
        extractor.push(
            0,
            r#"{"instructions":{"action":"wave"}}"#,
            &SsmlFormatter,
            &mut diagnostics,
        );
        extractor.push(1, r#"{"instructions":{"action":"nod"}}"#, &SsmlFormatter, &mut diagnostics);
        let set = extractor.finish();
        assert_eq!(set.get("action"), Some(&json!("wave")));
        assert!(matches!(
            diagnostics.as_slice(),
            [Diagnostic::DuplicatePayloadIgnored { index: 1 }]
        ));
    }

    #[test]
    fn broken_first_payload_leaves_instructions_empty() {
        let mut diagnostics = Vec::new();
        let mut extractor = InstructionExtractor::default();
        extractor.push(2, "{not json", &SsmlFormatter, &mut diagnostics);
        extractor.push(3, r#"{"instructions":{"action":"nod"}}"#, &SsmlFormatter, &mut diagnostics);
        assert!(extractor.finish().is_empty());
        assert!(matches!(
            diagnostics.as_slice(),
            [
                Diagnostic::InstructionParse { index: 2, error: InstructionParseError::Json(_) },
                Diagnostic::DuplicatePayloadIgnored { index: 3 }
            ]
        ));
    }

    #[test]
    fn empty_set_serializes_as_object() {
        assert_eq!(serde_json::to_value(InstructionSet::default()).unwrap(), json!({}));
    }
}
