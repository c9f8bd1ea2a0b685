//! Dictionary term tokenization.
//!
//! Term text is split on whitespace, then each word is split into runs of
//! letters/digits and single punctuation tokens, with three exceptions:
//!
//! - a `-` stays inside the word when the run before it is a known word
//!   prefix (`anti-`, `non-`, …) or the run after it is a known suffix
//!   (`-itis`, `-less`, …);
//! - a trailing `'s` becomes its own token;
//! - a trailing `.N` (single digit) becomes its own token.
//!
//! Example:
//!   "non-small cell lung cancer's" →
//!   [non-small][cell][lung][cancer]['s]

use crate::case::CaseProfile;
use crate::hash::compute_term_hash;

/// Hyphenated word prefixes kept attached to the following run.
const WORD_PREFIXES: &[&str] = &[
    "e", "a", "u", "x", "agro", "ante", "anti", "arch", "be", "bi", "bio", "co", "counter",
    "cross", "cyber", "de", "eco", "ex", "extra", "inter", "intra", "macro", "mega", "micro",
    "mid", "mini", "multi", "neo", "non", "over", "pan", "para", "peri", "post", "pre", "pro",
    "pseudo", "quasi", "re", "semi", "sub", "super", "tri", "ultra", "un", "uni", "vice",
    "electro", "gasto", "homo", "hetero", "ortho", "phospho",
];

/// Hyphenated word suffixes kept attached to the preceding run.
const WORD_SUFFIXES: &[&str] = &[
    "esque", "ette", "fest", "fold", "gate", "itis", "less", "most", "o-torium", "rama", "wise",
];

// ---------------------------------------------------------------------------
// TokenizedTerm
// ---------------------------------------------------------------------------

/// A dictionary synonym split into lookup tokens.
///
/// Equality is on `(concept_code, tokens)`.
#[derive(Debug, Clone)]
pub struct TokenizedTerm {
    concept_code: i64,
    tokens: Vec<String>,
    case: CaseProfile,
    hash: i64,
}

impl TokenizedTerm {
    /// Tokenize `text` for `concept_code`. The case profile is taken over the
    /// whole text.
    pub fn new(concept_code: i64, text: &str) -> Self {
        let tokens = tokenize_term(text);
        let case = CaseProfile::of(text);
        let hash = compute_term_hash(concept_code, &tokens);
        Self {
            concept_code,
            tokens,
            case,
            hash,
        }
    }

    /// Build from tokens that have already been split.
    pub fn from_tokens(concept_code: i64, tokens: Vec<String>) -> Self {
        let case = CaseProfile::of_parts(tokens.iter().map(String::as_str));
        let hash = compute_term_hash(concept_code, &tokens);
        Self {
            concept_code,
            tokens,
            case,
            hash,
        }
    }

    pub fn concept_code(&self) -> i64 {
        self.concept_code
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn case_profile(&self) -> CaseProfile {
        self.case
    }

    pub fn is_all_upper_case(&self) -> bool {
        self.case.all_upper
    }

    pub fn is_all_lower_case(&self) -> bool {
        self.case.all_lower
    }

    pub fn term_hash(&self) -> i64 {
        self.hash
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl PartialEq for TokenizedTerm {
    fn eq(&self, other: &Self) -> bool {
        self.concept_code == other.concept_code && self.tokens == other.tokens
    }
}

impl Eq for TokenizedTerm {}

impl std::hash::Hash for TokenizedTerm {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// Split dictionary term text into lookup tokens.
pub fn tokenize_term(text: &str) -> Vec<String> {
    text.split_whitespace().flat_map(split_word).collect()
}

fn split_word(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_alphanumeric() {
            current.push(ch);
            continue;
        }
        if ch == '-' && (is_word_prefix(&current) || is_word_suffix(&chars[i + 1..])) {
            current.push(ch);
            continue;
        }
        let rest = &chars[i + 1..];
        let owner_apostrophe = ch == '\'' && rest.len() == 1 && rest[0] == 's';
        let number_decimal = ch == '.' && rest.len() == 1 && rest[0].is_ascii_digit();
        if owner_apostrophe || number_decimal {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            current.push(ch);
            continue;
        }
        if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        tokens.push(ch.to_string());
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn is_word_prefix(run: &str) -> bool {
    !run.is_empty()
        && WORD_PREFIXES
            .iter()
            .any(|p| *p == run || p.to_uppercase() == run)
}

fn is_word_suffix(rest: &[char]) -> bool {
    let next: String = rest.iter().take_while(|c| c.is_alphanumeric()).collect();
    if next.is_empty() {
        return false;
    }
    WORD_SUFFIXES
        .iter()
        .any(|s| *s == next || s.to_uppercase() == next)
}

// ---------------------------------------------------------------------------
// Concept codes
// ---------------------------------------------------------------------------

/// Parse a concept code written either as a plain integer (`"27051"`) or as
/// a UMLS-style CUI (`"C0027051"`).
pub fn parse_concept_code(text: &str) -> Option<i64> {
    let text = text.trim();
    let digits = match text.strip_prefix('C').or_else(|| text.strip_prefix('c')) {
        Some(rest) => rest,
        None => text,
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(text: &str) -> Vec<String> {
        tokenize_term(text)
    }

    #[test]
    fn whitespace_splitting() {
        assert_eq!(texts("myocardial  infarction"), vec!["myocardial", "infarction"]);
    }

    #[test]
    fn punctuation_splits_words() {
        assert_eq!(texts("pain, chest"), vec!["pain", ",", "chest"]);
        assert_eq!(texts("(finding)"), vec!["(", "finding", ")"]);
    }

    #[test]
    fn plain_hyphen_splits() {
        assert_eq!(texts("well-known"), vec!["well", "-", "known"]);
    }

    #[test]
    fn known_prefix_keeps_hyphen() {
        assert_eq!(texts("non-small cell"), vec!["non-small", "cell"]);
        assert_eq!(texts("ANTI-INFLAMMATORY"), vec!["ANTI-INFLAMMATORY"]);
    }

    #[test]
    fn known_suffix_keeps_hyphen() {
        assert_eq!(texts("care-less"), vec!["care-less"]);
    }

    #[test]
    fn possessive_is_separate_token() {
        assert_eq!(texts("Parkinson's disease"), vec!["Parkinson", "'s", "disease"]);
    }

    #[test]
    fn trailing_decimal_digit_is_separate_token() {
        assert_eq!(texts("stage 1.5"), vec!["stage", "1", ".5"]);
        assert_eq!(texts("stage 1.25"), vec!["stage", "1", ".", "25"]);
    }

    #[test]
    fn empty_text_has_no_tokens() {
        assert!(texts("").is_empty());
        assert!(texts("   ").is_empty());
    }

    #[test]
    fn tokenized_term_case_is_over_whole_text() {
        assert!(TokenizedTerm::new(1, "HIV INFECTION").is_all_upper_case());
        assert!(TokenizedTerm::new(1, "chest pain").is_all_lower_case());
        let mixed = TokenizedTerm::new(1, "Parkinson's disease");
        assert!(!mixed.is_all_upper_case());
        assert!(!mixed.is_all_lower_case());
    }

    #[test]
    fn tokenized_term_equality_ignores_spacing() {
        let a = TokenizedTerm::new(7, "chest pain");
        let b = TokenizedTerm::new(7, "chest   pain");
        let c = TokenizedTerm::new(8, "chest pain");
        assert_eq!(a, b);
        assert_eq!(a.term_hash(), b.term_hash());
        assert_ne!(a, c);
    }

    #[test]
    fn from_tokens_matches_new() {
        let a = TokenizedTerm::new(3, "chest pain");
        let b = TokenizedTerm::from_tokens(3, vec!["chest".into(), "pain".into()]);
        assert_eq!(a, b);
        assert_eq!(a.case_profile(), b.case_profile());
    }

    #[test]
    fn concept_code_forms() {
        assert_eq!(parse_concept_code("27051"), Some(27051));
        assert_eq!(parse_concept_code("C0027051"), Some(27051));
        assert_eq!(parse_concept_code(" c0000123 "), Some(123));
        assert_eq!(parse_concept_code("C"), None);
        assert_eq!(parse_concept_code("abc"), None);
        assert_eq!(parse_concept_code(""), None);
    }
}
