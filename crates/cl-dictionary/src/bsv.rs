//! Bar-separated term sources.
//!
//! Two flavours feed a [`MemoryDictionary`]:
//!
//! - a file of `CONCEPT_CODE|TERM_TEXT` rows, one term per line;
//! - an inline list of `CODE:TERM` pairs separated by `|`.
//!
//! Neither loader fails. Unreadable files and malformed rows are logged and
//! the dictionary is built from whatever rows were usable.

use std::fs;
use std::path::Path;

use tracing::{error, warn};

use cl_core::{parse_concept_code, TermFrequencyPivot, TokenizedTerm};

use crate::memory::MemoryDictionary;

// ---------------------------------------------------------------------------
// File source
// ---------------------------------------------------------------------------

/// Load a dictionary from a BSV file.
pub fn load_bsv_file(name: &str, path: impl AsRef<Path>) -> MemoryDictionary {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(text) => build(name, parse_bsv_rows(name, &text)),
        Err(e) => {
            error!("Dictionary {name}: cannot read {}: {e}", path.display());
            MemoryDictionary::new(name)
        }
    }
}

/// Parse `CONCEPT_CODE|TERM_TEXT` rows. Blank lines and lines starting with
/// `//` or `#` are ignored; every other row must have exactly two columns.
pub fn parse_bsv_rows(name: &str, text: &str) -> Vec<TokenizedTerm> {
    let mut terms = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") || line.starts_with('#') {
            continue;
        }
        let columns: Vec<&str> = line.split('|').collect();
        if columns.len() != 2 {
            warn!(
                "Dictionary {name}: line {} has {} columns, expected 2: {line}",
                line_no + 1,
                columns.len()
            );
            continue;
        }
        if let Some(term) = parse_term(name, columns[0], columns[1]) {
            terms.push(term);
        }
    }
    terms
}

// ---------------------------------------------------------------------------
// Inline list source
// ---------------------------------------------------------------------------

/// Load a dictionary from an inline `CODE:TERM|CODE:TERM` list.
pub fn load_bsv_list(name: &str, list: &str) -> MemoryDictionary {
    if list.trim().is_empty() {
        error!("Dictionary {name}: empty term list");
        return MemoryDictionary::new(name);
    }
    build(name, parse_bsv_list(name, list))
}

/// Parse `CODE:TERM` pairs, splitting each pair on its first `:`.
pub fn parse_bsv_list(name: &str, list: &str) -> Vec<TokenizedTerm> {
    list.split('|')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| match pair.split_once(':') {
            Some((code, text)) => parse_term(name, code, text),
            None => {
                warn!("Dictionary {name}: malformed pair '{pair}', expected CODE:TERM");
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_term(name: &str, code: &str, text: &str) -> Option<TokenizedTerm> {
    let Some(concept_code) = parse_concept_code(code) else {
        warn!("Dictionary {name}: bad concept code '{}'", code.trim());
        return None;
    };
    let term = TokenizedTerm::new(concept_code, text.trim());
    if term.is_empty() {
        warn!("Dictionary {name}: empty term for concept {concept_code}");
        return None;
    }
    Some(term)
}

fn build(name: &str, terms: Vec<TokenizedTerm>) -> MemoryDictionary {
    if terms.is_empty() {
        warn!("Dictionary {name}: no usable terms");
    }
    let pivot = TermFrequencyPivot::from_terms(&terms);
    MemoryDictionary::from_terms(name, &terms, &pivot)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::CasedDictionary;
    use cl_core::{CaseTier, TokenView};
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("terms.bsv");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn file_rows_are_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "55|fever\nC0027051|myocardial infarction\n# comment\n\n1|AIDS\n",
        );
        let d = load_bsv_file("file", &path);
        let counts = d.tier_counts();
        assert_eq!(counts.lower, 2);
        assert_eq!(counts.upper, 1);
        let found = d.candidate_terms(&TokenView::new(0, 5, "fever", true));
        assert_eq!(found[0].concept_code(), 55);
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let terms = parse_bsv_rows("t", "55|fever\n56|too|many\nonly one\nabc|cough\n57|  \n58|cough");
        let codes: Vec<i64> = terms.iter().map(|t| t.concept_code()).collect();
        assert_eq!(codes, vec![55, 58]);
    }

    #[test]
    fn missing_file_gives_empty_dictionary() {
        let dir = tempfile::tempdir().unwrap();
        let d = load_bsv_file("missing", dir.path().join("nope.bsv"));
        assert!(d.is_empty());
        assert_eq!(d.name(), "missing");
    }

    #[test]
    fn list_pairs_are_loaded() {
        let d = load_bsv_list("list", "55:fever|123:myocardial infarction|7:ratio 1:2");
        assert_eq!(d.tier_counts().lower, 3);
        assert_eq!(d.tier_terms(CaseTier::Lower, "fever").len(), 1);
    }

    #[test]
    fn list_splits_on_first_colon() {
        let terms = parse_bsv_list("t", "7:ratio 1:2");
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].concept_code(), 7);
        assert!(terms[0].tokens().iter().any(|t| t == "ratio"));
    }

    #[test]
    fn malformed_pairs_are_skipped() {
        let terms = parse_bsv_list("t", "55:fever|nocolon|x:cough||56:chill");
        let codes: Vec<i64> = terms.iter().map(|t| t.concept_code()).collect();
        assert_eq!(codes, vec![55, 56]);
    }

    #[test]
    fn empty_list_gives_empty_dictionary() {
        assert!(load_bsv_list("empty", "   ").is_empty());
    }
}
