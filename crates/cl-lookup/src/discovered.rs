//! Match records produced by a lookup pass.

use std::fmt;

use serde::{Deserialize, Serialize};

use cl_core::CandidateTerm;

// ---------------------------------------------------------------------------
// Span
// ---------------------------------------------------------------------------

/// Character offsets `[begin, end)` of a match in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub begin: usize,
    pub end: usize,
}

impl Span {
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<(usize, usize)> for Span {
    fn from((begin, end): (usize, usize)) -> Self {
        Self { begin, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.begin, self.end)
    }
}

// ---------------------------------------------------------------------------
// DiscoveredTerm
// ---------------------------------------------------------------------------

/// A dictionary term found in the text. Plain value; two records with the
/// same fields are the same discovery.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DiscoveredTerm {
    pub concept_code: i64,
    pub matches_lookup_case: bool,
    pub rank: i32,
    pub instances: i32,
    /// Always 0: contiguous matching never skips tokens.
    pub consecutive_skips: u32,
    /// Always 0: contiguous matching never skips tokens.
    pub total_skips: u32,
}

impl From<&CandidateTerm> for DiscoveredTerm {
    fn from(candidate: &CandidateTerm) -> Self {
        Self {
            concept_code: candidate.concept_code(),
            matches_lookup_case: candidate.matches_lookup_case(),
            rank: candidate.rank(),
            instances: candidate.instances(),
            consecutive_skips: 0,
            total_skips: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use cl_core::CaseProfile;

    #[test]
    fn spans_order_by_begin_then_end() {
        let mut spans = vec![Span::new(4, 9), Span::new(0, 9), Span::new(0, 3)];
        spans.sort();
        assert_eq!(spans, vec![Span::new(0, 3), Span::new(0, 9), Span::new(4, 9)]);
        assert_eq!(Span::from((2, 7)).len(), 5);
        assert_eq!(Span::new(2, 7).to_string(), "2..7");
    }

    #[test]
    fn discovered_term_copies_candidate_fields() {
        let candidate = CandidateTerm::from_columns(55, "", "fever", "", CaseProfile::LOWER, 3, 7)
            .with_lookup_case(CaseProfile::UPPER);
        let term = DiscoveredTerm::from(&candidate);
        assert_eq!(term.concept_code, 55);
        assert!(!term.matches_lookup_case);
        assert_eq!((term.rank, term.instances), (3, 7));
        assert_eq!((term.consecutive_skips, term.total_skips), (0, 0));
    }

    #[test]
    fn discovered_term_serializes_fields() {
        let term = DiscoveredTerm::from(&CandidateTerm::from_columns(
            1,
            "",
            "AIDS",
            "",
            CaseProfile::UPPER,
            1,
            1,
        ));
        let json = serde_json::to_value(&term).unwrap();
        assert_eq!(json["concept_code"], 1);
        assert_eq!(json["matches_lookup_case"], true);
        assert_eq!(json["total_skips"], 0);
    }
}
