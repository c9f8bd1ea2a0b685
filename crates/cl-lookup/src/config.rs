use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use cl_core::{LookupError, Result, SourceToken, SourceTokenKind, TokenView};
use cl_dictionary::{
    create_dictionary, create_encoder, DictionaryConfig, DictionaryRegistry, EncoderConfig,
    TermEncoder,
};

/// Penn Treebank verb tags, including the `VV*` variants some taggers emit.
pub const VERB_POS: &[&str] = &[
    "VB", "VBD", "VBG", "VBN", "VBP", "VBZ", "VV", "VVD", "VVG", "VVN", "VVP", "VVZ",
];
pub const NOUN_POS: &[&str] = &["NN", "NNS", "NP", "NPS", "NNP", "NNPS"];
pub const ADJECTIVE_POS: &[&str] = &["JJ", "JJR", "JJS"];
pub const ADVERB_POS: &[&str] = &["RB", "RBR", "RBS"];

// ---------------------------------------------------------------------------
// LookupConfig
// ---------------------------------------------------------------------------

/// Runtime configuration for a lookup run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Shortest token, in characters, that may act as a pivot.
    /// Default: 3.
    pub min_lookup_span: usize,
    /// Part-of-speech tags allowed as pivots. Untagged tokens are always
    /// allowed. Default: verbs, nouns, adjectives and adverbs.
    pub lookup_pos: BTreeSet<String>,
    /// Number of rayon worker threads to use.
    /// Default: `rayon::current_num_threads()`.
    pub worker_threads: usize,
    /// Dictionaries to load into the registry.
    pub dictionaries: Vec<DictionaryConfig>,
    /// Encoders consulted for every concept found. Default: none.
    pub encoders: Vec<EncoderConfig>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            min_lookup_span: 3,
            lookup_pos: VERB_POS
                .iter()
                .chain(NOUN_POS)
                .chain(ADJECTIVE_POS)
                .chain(ADVERB_POS)
                .map(|pos| pos.to_string())
                .collect(),
            worker_threads: rayon::current_num_threads(),
            dictionaries: Vec::new(),
            encoders: Vec::new(),
        }
    }
}

impl LookupConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_threads == 0 {
            return Err(LookupError::Config("worker_threads must be at least 1".into()));
        }
        Ok(())
    }

    /// Whether a source token may serve as a pivot.
    pub fn is_lookup_token(&self, token: &SourceToken) -> bool {
        if token.kind != SourceTokenKind::Word
            || token.end.saturating_sub(token.begin) < self.min_lookup_span
        {
            return false;
        }
        match &token.part_of_speech {
            Some(pos) => self.lookup_pos.contains(pos),
            None => true,
        }
    }

    /// Turn tokenizer output into a lookup window: newlines dropped, tokens
    /// ordered by start offset, and each flagged by [`Self::is_lookup_token`].
    pub fn lookup_window(&self, tokens: &[SourceToken]) -> Vec<TokenView> {
        let mut kept: Vec<&SourceToken> = tokens
            .iter()
            .filter(|t| t.kind != SourceTokenKind::Newline)
            .collect();
        kept.sort_by_key(|t| t.begin);
        kept.into_iter()
            .map(|t| TokenView::new(t.begin, t.end, t.text.clone(), self.is_lookup_token(t)))
            .collect()
    }

    /// Build every configured dictionary. Dictionaries that fail to build,
    /// and duplicate names, are logged and left out.
    pub fn build_registry(&self) -> DictionaryRegistry {
        let registry = DictionaryRegistry::new();
        for config in &self.dictionaries {
            match create_dictionary(config) {
                Ok(dictionary) => {
                    registry.add(dictionary);
                }
                Err(e) => error!("Dictionary {} not loaded: {e}", config.name()),
            }
        }
        info!("{} of {} dictionaries loaded", registry.len(), self.dictionaries.len());
        registry
    }

    /// Build every configured encoder. Encoders that fail to build are logged
    /// and left out.
    pub fn build_encoders(&self) -> Vec<Arc<dyn TermEncoder>> {
        let mut encoders: Vec<Arc<dyn TermEncoder>> = Vec::with_capacity(self.encoders.len());
        for config in &self.encoders {
            match create_encoder(config) {
                Ok(encoder) => encoders.push(encoder),
                Err(e) => error!("Encoder {} not loaded: {e}", config.name()),
            }
        }
        if !self.encoders.is_empty() {
            info!("{} of {} encoders loaded", encoders.len(), self.encoders.len());
        }
        encoders
    }

    /// Convenience wrapper returning the registry behind an `Arc`.
    pub fn shared_registry(&self) -> Arc<DictionaryRegistry> {
        Arc::new(self.build_registry())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
