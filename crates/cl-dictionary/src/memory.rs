use std::collections::HashMap;

use tracing::{info, warn};

use cl_core::{CandidateTerm, CaseTier, PivotPolicy, TokenView, TokenizedTerm};

use crate::dictionary::{CasedDictionary, TierPolicy};

/// Three independent maps from pivot word to the terms filed under it.
#[derive(Debug, Default)]
struct TierMaps {
    upper: HashMap<String, Vec<CandidateTerm>>,
    mixed: HashMap<String, Vec<CandidateTerm>>,
    lower: HashMap<String, Vec<CandidateTerm>>,
}

impl TierMaps {
    fn tier(&self, tier: CaseTier) -> &HashMap<String, Vec<CandidateTerm>> {
        match tier {
            CaseTier::Upper => &self.upper,
            CaseTier::Mixed => &self.mixed,
            CaseTier::Lower => &self.lower,
        }
    }

    fn tier_mut(&mut self, tier: CaseTier) -> &mut HashMap<String, Vec<CandidateTerm>> {
        match tier {
            CaseTier::Upper => &mut self.upper,
            CaseTier::Mixed => &mut self.mixed,
            CaseTier::Lower => &mut self.lower,
        }
    }
}

/// Number of distinct terms held in each tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierCounts {
    pub upper: usize,
    pub mixed: usize,
    pub lower: usize,
}

impl TierCounts {
    pub fn total(&self) -> usize {
        self.upper + self.mixed + self.lower
    }
}

// ---------------------------------------------------------------------------
// MemoryDictionary
// ---------------------------------------------------------------------------

/// Dictionary held entirely in hash maps.
///
/// Built once, then read-only: `candidate_terms` only reads the maps, so a
/// shared reference can serve any number of threads.
#[derive(Debug)]
pub struct MemoryDictionary {
    name: String,
    maps: TierMaps,
    policy: TierPolicy,
}

impl MemoryDictionary {
    /// An empty dictionary using the exclusive tier policy.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            maps: TierMaps::default(),
            policy: TierPolicy::Exclusive,
        }
    }

    /// Switch the tier strategy. The default for this backend is
    /// [`TierPolicy::Exclusive`].
    pub fn with_policy(mut self, policy: TierPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build from tokenized terms, pivoting each with `policy`.
    pub fn from_terms(
        name: impl Into<String>,
        terms: &[TokenizedTerm],
        policy: &dyn PivotPolicy,
    ) -> Self {
        let mut dictionary = Self::new(name);
        for term in terms {
            dictionary.insert_term(term, policy);
        }
        let counts = dictionary.tier_counts();
        info!(
            "Dictionary {} loaded {} terms (upper {}, mixed {}, lower {})",
            dictionary.name,
            counts.total(),
            counts.upper,
            counts.mixed,
            counts.lower
        );
        dictionary
    }

    /// Pivot and insert one tokenized term. Returns false if the term has no
    /// usable pivot.
    pub fn insert_term(&mut self, term: &TokenizedTerm, policy: &dyn PivotPolicy) -> bool {
        let Some(index) = policy.pivot_index(term.tokens()) else {
            warn!(
                "Bad rare word index for concept {} term '{}'",
                term.concept_code(),
                term.tokens().join(" ")
            );
            return false;
        };
        match CandidateTerm::from_tokenized(term, index) {
            Ok(candidate) => {
                self.insert(candidate);
                true
            }
            Err(e) => {
                warn!("{e}");
                false
            }
        }
    }

    /// File a candidate under its pivot word in the tier of its own case.
    /// Lower-tier keys are lowercase. Duplicate terms are ignored.
    pub fn insert(&mut self, candidate: CandidateTerm) {
        let tier = candidate.case_profile().tier();
        let key = match tier {
            CaseTier::Lower => candidate.rare_word().to_lowercase(),
            _ => candidate.rare_word().to_string(),
        };
        let terms = self.maps.tier_mut(tier).entry(key).or_default();
        if !terms.contains(&candidate) {
            terms.push(candidate);
        }
    }

    /// Raw contents of one tier for `key`, untagged.
    pub fn tier_terms(&self, tier: CaseTier, key: &str) -> &[CandidateTerm] {
        self.maps
            .tier(tier)
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn tier_counts(&self) -> TierCounts {
        let count = |tier: CaseTier| -> usize { self.maps.tier(tier).values().map(Vec::len).sum() };
        TierCounts {
            upper: count(CaseTier::Upper),
            mixed: count(CaseTier::Mixed),
            lower: count(CaseTier::Lower),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tier_counts().total() == 0
    }
}

impl CasedDictionary for MemoryDictionary {
    fn name(&self) -> &str {
        &self.name
    }

    fn candidate_terms(&self, token: &TokenView) -> Vec<CandidateTerm> {
        self.policy
            .candidates(token, |tier, key| self.tier_terms(tier, key).to_vec())
    }

    fn tier_policy(&self) -> TierPolicy {
        self.policy
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
