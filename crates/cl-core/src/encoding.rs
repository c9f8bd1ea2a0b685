//! Vocabulary codes attached to a discovered concept.
//!
//! A term encoder maps a concept code to zero or more [`TermEncoding`]s, each
//! naming the vocabulary (schema) it comes from.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Schema recorded on semantic type codes.
pub const TUI_SCHEMA: &str = "TUI";
/// Schema recorded on a concept's preferred text.
pub const PREFERRED_TEXT_SCHEMA: &str = "PREFERRED_TEXT";

// ---------------------------------------------------------------------------
// CodeType
// ---------------------------------------------------------------------------

/// How the stored code of an encoder is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeType {
    #[default]
    Text,
    Long,
    Int,
    /// Integer semantic type, recorded under [`TUI_SCHEMA`].
    Tui,
    /// Text recorded under [`PREFERRED_TEXT_SCHEMA`].
    PrefText,
}

impl CodeType {
    /// The schema this type forces on its encodings. `None` means the
    /// encoder's own name is used.
    pub fn fixed_schema(self) -> Option<&'static str> {
        match self {
            CodeType::Tui => Some(TUI_SCHEMA),
            CodeType::PrefText => Some(PREFERRED_TEXT_SCHEMA),
            CodeType::Text | CodeType::Long | CodeType::Int => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, CodeType::Long | CodeType::Int | CodeType::Tui)
    }

    /// Whether values must fit in 32 bits.
    pub fn is_narrow(self) -> bool {
        matches!(self, CodeType::Int | CodeType::Tui)
    }
}

// ---------------------------------------------------------------------------
// EncodedCode
// ---------------------------------------------------------------------------

/// A code value, serialized as a bare JSON number or string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EncodedCode {
    Number(i64),
    Text(String),
}

impl fmt::Display for EncodedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodedCode::Number(n) => write!(f, "{n}"),
            EncodedCode::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EncodedCode {
    fn from(n: i64) -> Self {
        EncodedCode::Number(n)
    }
}

impl From<i32> for EncodedCode {
    fn from(n: i32) -> Self {
        EncodedCode::Number(n.into())
    }
}

impl From<String> for EncodedCode {
    fn from(s: String) -> Self {
        EncodedCode::Text(s)
    }
}

impl From<&str> for EncodedCode {
    fn from(s: &str) -> Self {
        EncodedCode::Text(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// TermEncoding
// ---------------------------------------------------------------------------

/// One code for a concept in one vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TermEncoding {
    pub schema: String,
    pub code: EncodedCode,
}

impl TermEncoding {
    pub fn new(schema: impl Into<String>, code: impl Into<EncodedCode>) -> Self {
        Self {
            schema: schema.into(),
            code: code.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
