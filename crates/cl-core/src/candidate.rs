//! Dictionary entry indexed by its rare pivot word.
//!
//! The term text lives behind an `Arc`, so the per-lookup copies handed out
//! by dictionaries (which differ only in `matches_lookup_case`) share one
//! allocation. Lowercase prefix/suffix forms are computed on first access and
//! cached; nothing outside this module can mutate the token arrays, so the
//! caches never go stale.

use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use crate::case::CaseProfile;
use crate::error::{LookupError, Result};
use crate::hash::compute_term_hash;
use crate::term::TokenizedTerm;

/// Rank given to terms whose source carries no ranking column.
pub const DEFAULT_RANK: i32 = 1;
/// Instance count given to terms whose source carries no instance column.
pub const DEFAULT_INSTANCES: i32 = 1;

#[derive(Debug)]
struct TermEntry {
    concept_code: i64,
    prefixes: Vec<String>,
    rare_word: String,
    suffixes: Vec<String>,
    case: CaseProfile,
    rank: i32,
    instances: i32,
    hash: i64,
    lower_prefixes: OnceLock<Vec<String>>,
    lower_suffixes: OnceLock<Vec<String>>,
}

/// A term that may match around a lookup token, split at its pivot.
#[derive(Debug, Clone)]
pub struct CandidateTerm {
    entry: Arc<TermEntry>,
    matches_lookup_case: bool,
}

impl CandidateTerm {
    /// Split a tokenized term around the pivot at `rare_word_index`.
    ///
    /// Without a lookup context the term is considered to match its own case.
    pub fn from_tokenized(term: &TokenizedTerm, rare_word_index: usize) -> Result<Self> {
        Self::build(
            term.concept_code(),
            term.tokens(),
            rare_word_index,
            term.case_profile(),
            DEFAULT_RANK,
            DEFAULT_INSTANCES,
        )
        .map(|entry| Self {
            entry: Arc::new(entry),
            matches_lookup_case: true,
        })
    }

    /// Split raw tokens around the pivot and flag whether the term's own case
    /// profile equals `lookup_case`, the case of the triggering token.
    pub fn from_tokens(
        concept_code: i64,
        tokens: &[String],
        rare_word_index: usize,
        lookup_case: CaseProfile,
        rank: i32,
        instances: i32,
    ) -> Result<Self> {
        let case = CaseProfile::of_parts(tokens.iter().map(String::as_str));
        let entry = Self::build(concept_code, tokens, rare_word_index, case, rank, instances)?;
        Ok(Self {
            entry: Arc::new(entry),
            matches_lookup_case: case == lookup_case,
        })
    }

    /// Rebuild a term stored as separate prefix / pivot / suffix columns.
    ///
    /// Prefix and suffix text is split on single spaces; empty text yields no
    /// tokens. `case` is the profile of the tier the row was stored in.
    pub fn from_columns(
        concept_code: i64,
        prefix: &str,
        rare_word: &str,
        suffix: &str,
        case: CaseProfile,
        rank: i32,
        instances: i32,
    ) -> Self {
        let prefixes = split_column(prefix);
        let suffixes = split_column(suffix);
        let hash = compute_term_hash(
            concept_code,
            &joined(&prefixes, rare_word, &suffixes),
        );
        Self {
            entry: Arc::new(TermEntry {
                concept_code,
                prefixes,
                rare_word: rare_word.to_string(),
                suffixes,
                case,
                rank,
                instances,
                hash,
                lower_prefixes: OnceLock::new(),
                lower_suffixes: OnceLock::new(),
            }),
            matches_lookup_case: true,
        }
    }

    fn build(
        concept_code: i64,
        tokens: &[String],
        rare_word_index: usize,
        case: CaseProfile,
        rank: i32,
        instances: i32,
    ) -> Result<TermEntry> {
        if rare_word_index >= tokens.len() {
            return Err(LookupError::InvalidInput(format!(
                "rare word index {rare_word_index} out of range for {} tokens of concept {concept_code}",
                tokens.len()
            )));
        }
        Ok(TermEntry {
            concept_code,
            prefixes: tokens[..rare_word_index].to_vec(),
            rare_word: tokens[rare_word_index].clone(),
            suffixes: tokens[rare_word_index + 1..].to_vec(),
            case,
            rank,
            instances,
            hash: compute_term_hash(concept_code, tokens),
            lower_prefixes: OnceLock::new(),
            lower_suffixes: OnceLock::new(),
        })
    }

    /// A copy of this term flagged against the case of another lookup token.
    pub fn with_lookup_case(&self, lookup_case: CaseProfile) -> Self {
        Self {
            entry: Arc::clone(&self.entry),
            matches_lookup_case: self.entry.case == lookup_case,
        }
    }

    pub fn concept_code(&self) -> i64 {
        self.entry.concept_code
    }

    /// The full ordered token sequence: prefixes, pivot, suffixes.
    pub fn tokens(&self) -> Vec<String> {
        joined(&self.entry.prefixes, &self.entry.rare_word, &self.entry.suffixes)
    }

    pub fn prefixes(&self) -> &[String] {
        &self.entry.prefixes
    }

    pub fn rare_word(&self) -> &str {
        &self.entry.rare_word
    }

    pub fn suffixes(&self) -> &[String] {
        &self.entry.suffixes
    }

    pub fn lower_prefixes(&self) -> &[String] {
        if self.entry.case.all_lower {
            return &self.entry.prefixes;
        }
        self.entry
            .lower_prefixes
            .get_or_init(|| lowercase_all(&self.entry.prefixes))
    }

    pub fn lower_suffixes(&self) -> &[String] {
        if self.entry.case.all_lower {
            return &self.entry.suffixes;
        }
        self.entry
            .lower_suffixes
            .get_or_init(|| lowercase_all(&self.entry.suffixes))
    }

    pub fn rare_word_index(&self) -> usize {
        self.entry.prefixes.len()
    }

    pub fn token_count(&self) -> usize {
        self.entry.prefixes.len() + 1 + self.entry.suffixes.len()
    }

    pub fn case_profile(&self) -> CaseProfile {
        self.entry.case
    }

    pub fn is_all_upper_case(&self) -> bool {
        self.entry.case.all_upper
    }

    pub fn is_all_lower_case(&self) -> bool {
        self.entry.case.all_lower
    }

    pub fn matches_lookup_case(&self) -> bool {
        self.matches_lookup_case
    }

    pub fn rank(&self) -> i32 {
        self.entry.rank
    }

    pub fn instances(&self) -> i32 {
        self.entry.instances
    }

    pub fn term_hash(&self) -> i64 {
        self.entry.hash
    }
}

impl PartialEq for CandidateTerm {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (&self.entry, &other.entry);
        a.concept_code == b.concept_code
            && self.token_count() == other.token_count()
            && a.token_iter().eq(b.token_iter())
    }
}

impl Eq for CandidateTerm {}

impl Hash for CandidateTerm {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entry.hash.hash(state);
    }
}

impl TermEntry {
    fn token_iter(&self) -> impl Iterator<Item = &str> {
        self.prefixes
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.rare_word.as_str()))
            .chain(self.suffixes.iter().map(String::as_str))
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn split_column(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split(' ').map(str::to_string).collect()
}

fn joined(prefixes: &[String], rare_word: &str, suffixes: &[String]) -> Vec<String> {
    let mut tokens = Vec::with_capacity(prefixes.len() + 1 + suffixes.len());
    tokens.extend_from_slice(prefixes);
    tokens.push(rare_word.to_string());
    tokens.extend_from_slice(suffixes);
    tokens
}

fn lowercase_all(tokens: &[String]) -> Vec<String> {
    tokens.iter().map(|t| t.to_lowercase()).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
