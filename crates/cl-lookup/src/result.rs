//! Lookup run result types, the structured output of the lookup engine.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cl_core::TermEncoding;

use crate::discovered::{DiscoveredTerm, Span};

// ---------------------------------------------------------------------------
// SpanTerms
// ---------------------------------------------------------------------------

/// All terms discovered at one span.
///
/// Spans are not valid JSON object keys, so results carry a list of these
/// rather than the span map itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanTerms {
    pub span: Span,
    pub terms: BTreeSet<DiscoveredTerm>,
}

// ---------------------------------------------------------------------------
// LookupStats
// ---------------------------------------------------------------------------

/// Aggregate counts summarising a lookup run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupStats {
    /// Number of windows searched.
    pub windows: usize,
    /// Total tokens across all windows.
    pub tokens: usize,
    /// Number of dictionaries consulted.
    pub dictionaries: usize,
    /// Distinct spans with at least one term.
    pub spans: usize,
    /// Total (span, term) pairs.
    pub discovered: usize,
    /// Distinct concepts that received at least one code.
    #[serde(default)]
    pub encoded: usize,
}

// ---------------------------------------------------------------------------
// LookupRun
// ---------------------------------------------------------------------------

/// The top-level output of one lookup run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupRun {
    /// Unique identifier for this run (UUIDv4).
    pub run_id: Uuid,
    /// Wall-clock duration of the run in milliseconds.
    pub elapsed_ms: u64,
    pub stats: LookupStats,
    /// Discovered terms in span order, merged across windows and
    /// dictionaries.
    pub terms: Vec<SpanTerms>,
    /// Codes from every encoder, keyed by concept code. Concepts without
    /// codes are absent.
    #[serde(default)]
    pub encodings: BTreeMap<i64, BTreeSet<TermEncoding>>,
}

impl LookupRun {
    /// Rebuild the span map view of [`Self::terms`].
    pub fn term_map(&self) -> BTreeMap<Span, BTreeSet<DiscoveredTerm>> {
        self.terms
            .iter()
            .map(|entry| (entry.span, entry.terms.clone()))
            .collect()
    }

    pub fn terms_at(&self, span: Span) -> Option<&BTreeSet<DiscoveredTerm>> {
        self.terms
            .binary_search_by(|entry| entry.span.cmp(&span))
            .ok()
            .map(|i| &self.terms[i].terms)
    }

    /// Codes for one concept, empty if no encoder knew it.
    pub fn encodings_for(&self, concept_code: i64) -> impl Iterator<Item = &TermEncoding> {
        self.encodings.get(&concept_code).into_iter().flatten()
    }

    /// Every distinct concept code found, ascending.
    pub fn concept_codes(&self) -> BTreeSet<i64> {
        self.terms
            .iter()
            .flat_map(|entry| entry.terms.iter().map(|t| t.concept_code))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
