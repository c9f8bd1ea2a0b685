//! The dictionary capability shared by every backend, and the two tier
//! lookup strategies.
//!
//! A dictionary stores each term under its pivot word in one of three case
//! tiers. How a lookup token consults those tiers is a per-backend policy:
//!
//! - [`TierPolicy::Exclusive`] returns the first tier that has anything for
//!   the token, falling back to the lowercase tier. The in-memory backends
//!   use this.
//! - [`TierPolicy::Union`] asks every tier compatible with the token and
//!   merges the results. The SQLite backend uses this.

use serde::{Deserialize, Serialize};

use cl_core::{CandidateTerm, CaseTier, TokenView};

// ---------------------------------------------------------------------------
// CasedDictionary
// ---------------------------------------------------------------------------

/// A named source of candidate terms keyed by their rare pivot word.
pub trait CasedDictionary: Send + Sync {
    /// Unique name of this dictionary within a registry.
    fn name(&self) -> &str;

    /// Every term that has `token` as its pivot. Each returned term carries
    /// `matches_lookup_case` relative to the case of `token`.
    fn candidate_terms(&self, token: &TokenView) -> Vec<CandidateTerm>;

    /// The tier strategy this dictionary applies.
    fn tier_policy(&self) -> TierPolicy;
}

// ---------------------------------------------------------------------------
// TierPolicy
// ---------------------------------------------------------------------------

/// How the upper, mixed and lower tiers are consulted for one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierPolicy {
    /// Upper (all-upper token) or mixed (mixed token) tier by exact text if
    /// it has entries, otherwise the lower tier by lowercase text. Never more
    /// than one tier.
    Exclusive,
    /// Upper tier if the token is all-upper, mixed tier if it is not
    /// all-lower, and always the lower tier; all results are merged.
    Union,
}

impl TierPolicy {
    /// Collect candidates for `token`, calling `fetch(tier, key)` for each
    /// tier this policy consults. Results are tagged with the token's case.
    pub fn candidates<F>(&self, token: &TokenView, mut fetch: F) -> Vec<CandidateTerm>
    where
        F: FnMut(CaseTier, &str) -> Vec<CandidateTerm>,
    {
        let found = match self {
            TierPolicy::Exclusive => {
                let cased = if token.is_all_upper_case() {
                    fetch(CaseTier::Upper, token.text())
                } else if !token.is_all_lower_case() {
                    fetch(CaseTier::Mixed, token.text())
                } else {
                    Vec::new()
                };
                if cased.is_empty() {
                    fetch(CaseTier::Lower, token.lower_text())
                } else {
                    cased
                }
            }
            TierPolicy::Union => {
                let mut merged: Vec<CandidateTerm> = Vec::new();
                if token.is_all_upper_case() {
                    merge_into(&mut merged, fetch(CaseTier::Upper, token.text()));
                }
                if !token.is_all_lower_case() {
                    merge_into(&mut merged, fetch(CaseTier::Mixed, token.text()));
                }
                merge_into(&mut merged, fetch(CaseTier::Lower, token.lower_text()));
                merged
            }
        };
        let lookup_case = token.case_profile();
        found
            .into_iter()
            .map(|c| c.with_lookup_case(lookup_case))
            .collect()
    }
}

/// Append terms not already present (set semantics on term identity).
fn merge_into(merged: &mut Vec<CandidateTerm>, found: Vec<CandidateTerm>) {
    for candidate in found {
        if !merged.contains(&candidate) {
            merged.push(candidate);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
