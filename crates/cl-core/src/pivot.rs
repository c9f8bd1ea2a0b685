//! Rare-word pivot selection.
//!
//! Every multi-word term is indexed under exactly one of its tokens, the
//! pivot. Which token is chosen does not affect matching correctness, only
//! how many candidates each lookup token pulls from the dictionary.

use std::collections::HashMap;

use crate::term::TokenizedTerm;

/// Function words never used as a pivot: numbers, conjunctions,
/// determiners, prepositions, modals, pronouns, particles and wh-words.
const FUNCTION_WORDS: &[&str] = &[
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "and", "or", "but", "for", "nor", "so", "yet", "both",
    "this", "that", "these", "those", "the", "all", "an", "another", "any", "each", "either",
    "many", "much", "neither", "no", "some", "such", "them",
    "there",
    "among", "upon", "in", "into", "below", "atop", "until", "over", "under", "towards", "to",
    "whether", "despite", "if",
    "can", "should", "will", "may", "might", "must", "could", "would", "need", "ought", "shall",
    "cannot", "shouldn",
    "half", "none", "twice",
    "at", "before", "after", "behind", "beneath", "beside", "between", "through", "across", "of",
    "concerning", "like", "except", "with", "without", "toward", "past", "against", "during",
    "throughout", "besides", "beyond", "from", "inside", "near", "outside", "since",
    "my", "our",
    "i", "you", "he", "she", "it", "him", "himself", "we",
    "mine", "yours", "his", "hers", "its", "ours", "theirs",
    "about", "off", "up", "along", "away", "back", "by", "down", "forward", "on", "out", "around",
    "what", "whatever", "which", "whichever",
    "who", "whom", "whoever", "whomever", "whose",
    "how", "where", "when", "however", "wherever", "whenever", "wherein", "why",
];

// ---------------------------------------------------------------------------
// PivotPolicy
// ---------------------------------------------------------------------------

/// Chooses the index of the token a term is filed under.
pub trait PivotPolicy {
    /// Return `None` only when no token can serve as a pivot.
    fn pivot_index(&self, tokens: &[String]) -> Option<usize>;
}

/// Always pivot on the same position (clamped to the last token).
#[derive(Debug, Clone, Copy)]
pub struct FixedPivot(pub usize);

impl PivotPolicy for FixedPivot {
    fn pivot_index(&self, tokens: &[String]) -> Option<usize> {
        if tokens.is_empty() {
            None
        } else {
            Some(self.0.min(tokens.len() - 1))
        }
    }
}

/// Pivot on the token that occurs least often across a whole term load.
///
/// Only "rarable" tokens are counted: longer than one character, containing
/// a letter, and not a function word. Ties go to the earliest token; terms
/// without any rarable token pivot on their first token.
#[derive(Debug, Clone, Default)]
pub struct TermFrequencyPivot {
    counts: HashMap<String, u64>,
}

impl TermFrequencyPivot {
    pub fn from_terms<'a, I>(terms: I) -> Self
    where
        I: IntoIterator<Item = &'a TokenizedTerm>,
    {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for term in terms {
            for token in term.tokens() {
                if is_rarable_token(token) {
                    *counts.entry(token.clone()).or_insert(0) += 1;
                }
            }
        }
        Self { counts }
    }

    pub fn count(&self, token: &str) -> u64 {
        self.counts.get(token).copied().unwrap_or(0)
    }
}

impl PivotPolicy for TermFrequencyPivot {
    fn pivot_index(&self, tokens: &[String]) -> Option<usize> {
        match tokens.len() {
            0 => return None,
            1 => return Some(0),
            _ => {}
        }
        let mut best_index = 0;
        let mut best_count = u64::MAX;
        for (i, token) in tokens.iter().enumerate() {
            if !is_rarable_token(token) {
                continue;
            }
            if let Some(&count) = self.counts.get(token) {
                if count < best_count {
                    best_index = i;
                    best_count = count;
                }
            }
        }
        Some(best_index)
    }
}

/// Whether `token` may be used as a pivot.
pub fn is_rarable_token(token: &str) -> bool {
    if token.chars().count() <= 1 || !token.chars().any(char::is_alphabetic) {
        return false;
    }
    !FUNCTION_WORDS
        .iter()
        .any(|w| *w == token || w.to_uppercase() == token)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn fixed_pivot_clamps() {
        assert_eq!(FixedPivot(1).pivot_index(&toks(&["a", "b"])), Some(1));
        assert_eq!(FixedPivot(5).pivot_index(&toks(&["a", "b"])), Some(1));
        assert_eq!(FixedPivot(0).pivot_index(&[]), None);
    }

    #[test]
    fn rarable_tokens() {
        assert!(is_rarable_token("infarction"));
        assert!(!is_rarable_token("a"));
        assert!(!is_rarable_token("12"));
        assert!(!is_rarable_token("of"));
        assert!(!is_rarable_token("OF"));
        // Only the lower and upper spellings are excluded.
        assert!(is_rarable_token("Of"));
    }

    #[test]
    fn least_frequent_token_wins() {
        let terms = vec![
            TokenizedTerm::new(1, "chest pain"),
            TokenizedTerm::new(2, "back pain"),
            TokenizedTerm::new(3, "pain"),
            TokenizedTerm::new(4, "pain radiation"),
        ];
        let policy = TermFrequencyPivot::from_terms(&terms);
        assert_eq!(policy.count("pain"), 4);
        assert_eq!(policy.pivot_index(terms[0].tokens()), Some(0));
        assert_eq!(policy.pivot_index(terms[2].tokens()), Some(0));
        assert_eq!(policy.pivot_index(terms[3].tokens()), Some(1));
    }

    #[test]
    fn function_words_are_never_pivots() {
        let terms = vec![TokenizedTerm::new(1, "disease of heart"), TokenizedTerm::new(2, "heart")];
        let policy = TermFrequencyPivot::from_terms(&terms);
        // "disease" (1) beats "heart" (2); "of" is skipped.
        assert_eq!(policy.pivot_index(terms[0].tokens()), Some(0));

        let terms = vec![
            TokenizedTerm::new(1, "of the heart"),
            TokenizedTerm::new(2, "of"),
        ];
        let policy = TermFrequencyPivot::from_terms(&terms);
        assert_eq!(policy.pivot_index(terms[0].tokens()), Some(2));
    }

    #[test]
    fn ties_go_to_first_token() {
        let terms = vec![TokenizedTerm::new(1, "myocardial infarction")];
        let policy = TermFrequencyPivot::from_terms(&terms);
        assert_eq!(policy.pivot_index(terms[0].tokens()), Some(0));
    }

    #[test]
    fn no_rarable_token_falls_back_to_first() {
        let policy = TermFrequencyPivot::default();
        assert_eq!(policy.pivot_index(&toks(&["of", "the"])), Some(0));
    }
}
