//! Response normalization: a dialog engine reply in any wire encoding → answer + instructions.
//!
//! Decode the reply into message units, classify each unit, accumulate spoken text and
//! extract the first custom payload, then assemble the turn envelope.

mod answer;
mod decode;
mod envelope;
mod instructions;
mod reply;

pub use answer::NormalizedAnswer;
pub use decode::{decode, DecodeError};
pub use envelope::{assemble, TurnResponse};
pub use instructions::{
    parse_custom_payload, InstructionExtractor, InstructionParseError, InstructionSet,
};
pub use reply::{MessageKind, MessageList, MessageUnit, RawReply, WireMessage};

#[cfg(test)]
pub(crate) use decode::test_support;

use crate::format::ResponseFormatter;

/// Something recorded while normalizing that did not fail the turn.
#[derive(Debug, thiserror::Error)]
pub enum Diagnostic {
    #[error("could not parse custom payload at message {index}: {error}")]
    InstructionParse {
        index: usize,
        error: InstructionParseError,
    },
    #[error("ignored additional custom payload at message {index}")]
    DuplicatePayloadIgnored { index: usize },
}

/// Normalized reply: final answer, instructions, and what was dropped along the way.
#[derive(Debug)]
pub struct Normalized {
    pub answer: String,
    pub contains_markup: bool,
    pub instructions: InstructionSet,
    pub diagnostics: Vec<Diagnostic>,
}

/// Classify units in order and run both accumulation rules.
pub fn normalize(units: &[MessageUnit], formatter: &dyn ResponseFormatter) -> Normalized {
    let mut answer = NormalizedAnswer::default();
    let mut extractor = InstructionExtractor::default();
    let mut diagnostics = Vec::new();
    for (index, unit) in units.iter().enumerate() {
        match &unit.kind {
            MessageKind::PlainText => answer.push_plain(&unit.text),
            MessageKind::Ssml => answer.push_ssml(&unit.text),
            MessageKind::CustomPayload => {
                extractor.push(index, &unit.text, formatter, &mut diagnostics)
            }
            MessageKind::Other(_) => log::debug!(
                "skipping message {} of unsupported kind {}",
                index,
                unit.kind.as_wire()
            ),
        }
    }
    let contains_markup = answer.contains_markup;
    Normalized {
        answer: answer.finish(formatter),
        contains_markup,
        instructions: extractor.finish(),
        diagnostics,
    }
}

/// Decode then normalize. A decode failure is fatal; instruction problems are only diagnostics.
pub fn normalize_reply(
    reply: &RawReply,
    formatter: &dyn ResponseFormatter,
) -> Result<Normalized, DecodeError> {
    let units = decode(reply)?;
    Ok(normalize(&units, formatter))
}

#[cfg(test)]
mod tests {
    use super::test_support::gzip_base64;
    use super::*;
    use crate::format::SsmlFormatter;
    use serde_json::json;

    #[test]
    fn legacy_plain_text_is_formatted_without_instructions() {
        let reply = RawReply::LegacySingle {
            kind: MessageKind::PlainText,
            message: "How can I help?".to_string(),
        };
        let n = normalize_reply(&reply, &SsmlFormatter).unwrap();
        assert_eq!(n.answer, SsmlFormatter.format_answer("How can I help? "));
        assert!(n.instructions.is_empty());
        assert!(n.diagnostics.is_empty());
    }

    #[test]
    fn single_ssml_unit_is_emitted_verbatim() {
        let reply = RawReply::Modern {
            messages: MessageList::Inline(json!([
                { "contentType": "SSML", "content": "<speak>Hi <break time=\"1s\"/></speak>" }
            ])),
        };
        let n = normalize_reply(&reply, &SsmlFormatter).unwrap();
        assert!(n.contains_markup);
        assert_eq!(n.answer, "<speak>Hi <break time='1s'/></speak> ");
    }

    #[test]
    fn mixed_ssml_and_plain_text_do_not_run_together() {
        let units = [MessageUnit::ssml("<speak>Hi</speak>"), MessageUnit::plain("Bye")];
        let n = normalize(&units, &SsmlFormatter);
        assert!(n.contains_markup);
        assert_eq!(n.answer, "<speak>Hi</speak> Bye ");
    }

    #[test]
    fn plain_text_and_custom_payload_from_compressed_reply() {
        let messages = json!([
            { "contentType": "PlainText", "content": "Hello " },
            { "contentType": "CustomPayload", "content": "{\"instructions\":{\"action\":\"wave\"}}" }
        ]);
        let reply = RawReply::Modern {
            messages: MessageList::Compressed(gzip_base64(&messages.to_string())),
        };
        let n = normalize_reply(&reply, &SsmlFormatter).unwrap();
        assert_eq!(n.answer, SsmlFormatter.format_answer("Hello  "));
        assert_eq!(serde_json::to_value(&n.instructions).unwrap(), json!({ "action": "wave" }));
    }

    #[test]
    fn only_first_of_several_payloads_is_honored() {
        let units = vec![
            MessageUnit::custom_payload(r#"{"instructions":{"n":1}}"#),
            MessageUnit::plain("text"),
            MessageUnit::custom_payload(r#"{"instructions":{"n":2}}"#),
            MessageUnit::custom_payload(r#"{"instructions":{"n":3}}"#),
        ];
        let n = normalize(&units, &SsmlFormatter);
        assert_eq!(n.instructions.get("n"), Some(&json!(1)));
        assert_eq!(n.diagnostics.len(), 2);
        assert!(n
            .diagnostics
            .iter()
            .all(|d| matches!(d, Diagnostic::DuplicatePayloadIgnored { .. })));
        assert_eq!(n.answer, "<speak>text </speak>");
    }

    #[test]
    fn malformed_payload_still_yields_answer() {
        let units = vec![
            MessageUnit::plain("Sorry"),
            MessageUnit::custom_payload("{\"instructions\": "),
        ];
        let n = normalize(&units, &SsmlFormatter);
        assert_eq!(n.answer, "<speak>Sorry </speak>");
        assert!(n.instructions.is_empty());
        assert!(matches!(
            n.diagnostics.as_slice(),
            [Diagnostic::InstructionParse { index: 1, error: InstructionParseError::Json(_) }]
        ));
    }

    #[test]
    fn unsupported_kinds_are_skipped() {
        let units = vec![
            MessageUnit::new(MessageKind::Other("ImageResponseCard".to_string()), ""),
            MessageUnit::plain("ok"),
        ];
        let n = normalize(&units, &SsmlFormatter);
        assert_eq!(n.answer, "<speak>ok </speak>");
    }

    #[test]
    fn malformed_base64_fails_without_answer() {
        let reply = RawReply::Modern {
            messages: MessageList::Compressed("%%%".to_string()),
        };
        assert!(matches!(
            normalize_reply(&reply, &SsmlFormatter),
            Err(DecodeError::Base64(_))
        ));
    }
}
