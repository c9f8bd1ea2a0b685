use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::case::CaseProfile;

// ---------------------------------------------------------------------------
// SourceTokenKind / SourceToken
// ---------------------------------------------------------------------------

/// Category assigned to a token by the upstream tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTokenKind {
    Word,
    Number,
    Punctuation,
    Symbol,
    Newline,
}

/// A token as delivered by the external tokenizer / tagger.
///
/// `begin` and `end` are character offsets into the source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceToken {
    pub begin: usize,
    pub end: usize,
    pub text: String,
    pub kind: SourceTokenKind,
    /// Penn Treebank tag, if the document was tagged.
    pub part_of_speech: Option<String>,
}

impl SourceToken {
    pub fn new(begin: usize, end: usize, text: impl Into<String>, kind: SourceTokenKind) -> Self {
        Self {
            begin,
            end,
            text: text.into(),
            kind,
            part_of_speech: None,
        }
    }

    pub fn with_part_of_speech(mut self, pos: impl Into<String>) -> Self {
        self.part_of_speech = Some(pos.into());
        self
    }
}

// ---------------------------------------------------------------------------
// TokenView
// ---------------------------------------------------------------------------

/// Read-only view of one token in a lookup window.
///
/// Case flags and the lowercase form are computed once at construction.
/// Two views are equal when they cover the same span, whatever their text.
#[derive(Debug, Clone)]
pub struct TokenView {
    begin: usize,
    end: usize,
    text: String,
    /// `None` when `text` is already all-lowercase.
    lower_text: Option<String>,
    case: CaseProfile,
    valid_index_token: bool,
}

impl TokenView {
    pub fn new(begin: usize, end: usize, text: impl Into<String>, valid_index_token: bool) -> Self {
        let text = text.into();
        let case = CaseProfile::of(&text);
        let lower_text = if case.all_lower {
            None
        } else {
            Some(text.to_lowercase())
        };
        Self {
            begin,
            end,
            text,
            lower_text,
            case,
            valid_index_token,
        }
    }

    pub fn begin(&self) -> usize {
        self.begin
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn span(&self) -> (usize, usize) {
        (self.begin, self.end)
    }

    pub fn length(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lower_text(&self) -> &str {
        self.lower_text.as_deref().unwrap_or(&self.text)
    }

    pub fn case_profile(&self) -> CaseProfile {
        self.case
    }

    pub fn is_all_upper_case(&self) -> bool {
        self.case.all_upper
    }

    pub fn is_all_lower_case(&self) -> bool {
        self.case.all_lower
    }

    pub fn is_valid_index_token(&self) -> bool {
        self.valid_index_token
    }
}

impl PartialEq for TokenView {
    fn eq(&self, other: &Self) -> bool {
        self.begin == other.begin && self.end == other.end
    }
}

impl Eq for TokenView {}

impl Hash for TokenView {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.begin.hash(state);
        self.end.hash(state);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
