//! Parallel lookup engine using rayon.
//!
//! [`LookupEngine`] is the primary entry point. It runs the contiguous
//! matcher for every (window, dictionary) pair on a rayon pool, merges the
//! per-span term sets across dictionaries, encodes the concepts found, and
//! assembles a [`LookupRun`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, warn};
use uuid::Uuid;

use cl_core::{SourceToken, TermEncoding, TokenView};
use cl_dictionary::{CasedDictionary, DictionaryRegistry, TermEncoder};

use crate::config::LookupConfig;
use crate::contiguous::{ContiguousLookupEngine, TermMap};
use crate::result::{LookupRun, LookupStats, SpanTerms};

// ---------------------------------------------------------------------------
// LookupEngine
// ---------------------------------------------------------------------------

/// Deterministic, parallel lookup over every registered dictionary.
pub struct LookupEngine {
    config: LookupConfig,
    registry: Arc<DictionaryRegistry>,
    matcher: ContiguousLookupEngine,
    encoders: Vec<Arc<dyn TermEncoder>>,
    pool: Option<ThreadPool>,
}

impl LookupEngine {
    /// Create an engine. A dedicated pool of `config.worker_threads` threads
    /// is built; if that fails the global rayon pool is used.
    pub fn new(config: LookupConfig, registry: Arc<DictionaryRegistry>) -> Self {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!("Falling back to the global rayon pool: {e}");
                None
            }
        };
        Self {
            config,
            registry,
            matcher: ContiguousLookupEngine::new(),
            encoders: Vec::new(),
            pool,
        }
    }

    /// Consult `encoders`, in order, for every concept a run finds.
    pub fn with_encoders(mut self, encoders: Vec<Arc<dyn TermEncoder>>) -> Self {
        self.encoders = encoders;
        self
    }

    pub fn encoders(&self) -> &[Arc<dyn TermEncoder>] {
        &self.encoders
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    pub fn registry(&self) -> &DictionaryRegistry {
        &self.registry
    }

    /// Look up every window in every registered dictionary.
    ///
    /// # Steps
    /// 1. Snapshot the registry.
    /// 2. Run `find_terms` for each (window, dictionary) pair in parallel.
    /// 3. Restore job order and union the span sets.
    /// 4. Encode every distinct concept found.
    /// 5. Compute stats and record elapsed time.
    pub fn run(&self, windows: &[Vec<TokenView>]) -> LookupRun {
        let start = Instant::now();

        let dictionaries = self.registry.all();
        let jobs: Vec<(usize, &[TokenView], &Arc<dyn CasedDictionary>)> = windows
            .iter()
            .flat_map(|window| dictionaries.iter().map(move |d| (window.as_slice(), d)))
            .enumerate()
            .map(|(idx, (window, d))| (idx, window, d))
            .collect();

        let mut indexed: Vec<(usize, TermMap)> = match &self.pool {
            Some(pool) => pool.install(|| self.find_all(&jobs)),
            None => self.find_all(&jobs),
        };
        indexed.sort_by_key(|(i, _)| *i);

        let mut merged = TermMap::new();
        for (_, found) in indexed {
            for (span, terms) in found {
                merged.entry(span).or_default().extend(terms);
            }
        }

        let concepts: Vec<i64> = merged
            .values()
            .flatten()
            .map(|term| term.concept_code)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let encodings = match &self.pool {
            Some(pool) => pool.install(|| self.encode_all(&concepts)),
            None => self.encode_all(&concepts),
        };

        let stats = LookupStats {
            windows: windows.len(),
            tokens: windows.iter().map(Vec::len).sum(),
            dictionaries: dictionaries.len(),
            spans: merged.len(),
            discovered: merged.values().map(|terms| terms.len()).sum(),
            encoded: encodings.len(),
        };
        let terms: Vec<SpanTerms> = merged
            .into_iter()
            .map(|(span, terms)| SpanTerms { span, terms })
            .collect();

        let elapsed_ms = start.elapsed().as_millis() as u64;
        debug!(
            "Lookup found {} terms at {} spans in {} ms",
            stats.discovered, stats.spans, elapsed_ms
        );

        LookupRun {
            run_id: Uuid::new_v4(),
            elapsed_ms,
            stats,
            terms,
            encodings,
        }
    }

    /// Build lookup windows from tokenizer output, then [`Self::run`].
    pub fn run_source(&self, windows: &[Vec<SourceToken>]) -> LookupRun {
        let views: Vec<Vec<TokenView>> = windows
            .iter()
            .map(|tokens| self.config.lookup_window(tokens))
            .collect();
        self.run(&views)
    }

    /// Codes from every encoder for each concept, dropping concepts no
    /// encoder knows.
    fn encode_all(&self, concepts: &[i64]) -> BTreeMap<i64, BTreeSet<TermEncoding>> {
        if self.encoders.is_empty() {
            return BTreeMap::new();
        }
        concepts
            .par_iter()
            .map(|&code| {
                let codes: BTreeSet<TermEncoding> = self
                    .encoders
                    .iter()
                    .flat_map(|encoder| encoder.encodings(code))
                    .collect();
                (code, codes)
            })
            .filter(|(_, codes)| !codes.is_empty())
            .collect()
    }

    fn find_all(
        &self,
        jobs: &[(usize, &[TokenView], &Arc<dyn CasedDictionary>)],
    ) -> Vec<(usize, TermMap)> {
        jobs.par_iter()
            .map(|&(idx, window, dictionary)| {
                (idx, self.matcher.find_terms(&**dictionary, window))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
