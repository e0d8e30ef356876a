//! Answer accumulator: spoken-text fragments → one answer string.

use crate::format::ResponseFormatter;

/// Accumulated spoken text and whether any fragment was SSML.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedAnswer {
    pub text: String,
    pub contains_markup: bool,
}

impl NormalizedAnswer {
    /// Plain text is joined with a single trailing space per fragment.
    pub fn push_plain(&mut self, text: &str) {
        self.text.push_str(text);
        self.text.push(' ');
    }

    /// SSML double quotes become single quotes so the answer can sit inside a double-quoted attribute.
    /// Each fragment also gets a trailing space, same as plain text.
    pub fn push_ssml(&mut self, text: &str) {
        self.text.push_str(&text.replace('"', "'"));
        self.text.push(' ');
        self.contains_markup = true;
    }

    /// Final answer: formatted when no fragment was SSML, verbatim otherwise.
    pub fn finish(self, formatter: &dyn ResponseFormatter) -> String {
        if self.contains_markup {
            self.text
        } else {
            formatter.format_answer(&self.text)
        }
    }
}
