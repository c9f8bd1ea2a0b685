//! Contiguous term matching over one window of lookup tokens.
//!
//! Every valid token is used as a possible pivot. Each candidate term found
//! for it must then line up token for token with its neighbours: prefixes
//! immediately before the pivot, suffixes immediately after, with no gaps.
//!
//! How a term token is compared against a window token depends on the case
//! of the whole term:
//!
//! | term case  | window token must                                  |
//! |------------|----------------------------------------------------|
//! | all-upper  | be all-upper, equal exactly, and equal lowercased  |
//! | mixed      | equal exactly (and lowercased)                     |
//! | all-lower  | equal lowercased                                   |

use std::collections::{BTreeMap, BTreeSet};

use cl_core::{CandidateTerm, TokenView};
use cl_dictionary::CasedDictionary;

use crate::discovered::{DiscoveredTerm, Span};

/// Discovered terms grouped by the text span they cover.
pub type TermMap = BTreeMap<Span, BTreeSet<DiscoveredTerm>>;

// ---------------------------------------------------------------------------
// ContiguousLookupEngine
// ---------------------------------------------------------------------------

/// Stateless matcher; one instance can serve any number of threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContiguousLookupEngine;

impl ContiguousLookupEngine {
    pub fn new() -> Self {
        Self
    }

    /// Find every dictionary term that occurs contiguously in `window`.
    ///
    /// Overlapping matches are all kept; nothing is subsumed here.
    pub fn find_terms(&self, dictionary: &dyn CasedDictionary, window: &[TokenView]) -> TermMap {
        let mut found = TermMap::new();
        for (index, token) in window.iter().enumerate() {
            if !token.is_valid_index_token() {
                continue;
            }
            for candidate in dictionary.candidate_terms(token) {
                if let Some(span) = match_span(&candidate, window, index) {
                    found
                        .entry(span)
                        .or_default()
                        .insert(DiscoveredTerm::from(&candidate));
                }
            }
        }
        found
    }
}

/// The span `candidate` covers when pivoted at `window[index]`, if all of its
/// tokens line up.
fn match_span(candidate: &CandidateTerm, window: &[TokenView], index: usize) -> Option<Span> {
    let pivot = &window[index];
    if candidate.token_count() == 1 {
        return Some(Span::new(pivot.begin(), pivot.end()));
    }
    let prefix_count = candidate.prefixes().len();
    let suffix_count = candidate.suffixes().len();
    if prefix_count > index || index + suffix_count >= window.len() {
        return None;
    }

    let first = index - prefix_count;
    let prefixes_match = candidate
        .prefixes()
        .iter()
        .zip(candidate.lower_prefixes())
        .zip(&window[first..index])
        .all(|((text, lower), token)| token_matches(candidate, text, lower, token));
    if !prefixes_match {
        return None;
    }

    let last = index + suffix_count;
    let suffixes_match = candidate
        .suffixes()
        .iter()
        .zip(candidate.lower_suffixes())
        .zip(&window[index + 1..=last])
        .all(|((text, lower), token)| token_matches(candidate, text, lower, token));
    if !suffixes_match {
        return None;
    }

    Some(Span::new(window[first].begin(), window[last].end()))
}

fn token_matches(candidate: &CandidateTerm, text: &str, lower: &str, token: &TokenView) -> bool {
    if candidate.is_all_upper_case() {
        if !token.is_all_upper_case() || text != token.text() {
            return false;
        }
    } else if !candidate.is_all_lower_case() && text != token.text() {
        return false;
    }
    lower == token.lower_text()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
