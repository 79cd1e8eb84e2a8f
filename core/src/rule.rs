//! Bracketed grammar rules: a start/end delimiter pair with translations.

use serde::{Deserialize, Serialize};

/// A grammar rule keyed at `original_start` in the trie and closed by
/// `original_end`. Either translation may be empty; the rule is still
/// structurally present and will still be matched and recursed into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub original_start: String,
    pub original_end: String,
    pub translation_start: String,
    pub translation_end: String,
}

impl Rule {
    pub fn new(
        original_start: impl Into<String>,
        original_end: impl Into<String>,
        translation_start: impl Into<String>,
        translation_end: impl Into<String>,
    ) -> Self {
        Self {
            original_start: original_start.into(),
            original_end: original_end.into(),
            translation_start: translation_start.into(),
            translation_end: translation_end.into(),
        }
    }

    pub(crate) fn end_len(&self) -> usize {
        self.original_end.chars().count()
    }
}
