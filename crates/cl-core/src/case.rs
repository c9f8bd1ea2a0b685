//! Letter-case classification shared by lookup tokens and dictionary terms.
//!
//! A text is *all-upper* when it has at least one uppercase letter and no
//! lowercase letters, *all-lower* symmetrically, and *mixed* otherwise. Text
//! without any cased letters (digits, punctuation) is neither all-upper nor
//! all-lower and therefore lands in the mixed tier.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CaseProfile
// ---------------------------------------------------------------------------

/// The pair of case flags computed once for a token or a whole term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseProfile {
    pub all_upper: bool,
    pub all_lower: bool,
}

impl CaseProfile {
    pub const UPPER: CaseProfile = CaseProfile { all_upper: true, all_lower: false };
    pub const MIXED: CaseProfile = CaseProfile { all_upper: false, all_lower: false };
    pub const LOWER: CaseProfile = CaseProfile { all_upper: false, all_lower: true };

    /// Classify a single piece of text.
    pub fn of(text: &str) -> Self {
        Self::of_parts(std::iter::once(text))
    }

    /// Classify the concatenation of several pieces of text, stopping early
    /// once both cases have been seen.
    pub fn of_parts<'a, I>(parts: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut any_upper = false;
        let mut any_lower = false;
        'outer: for part in parts {
            for ch in part.chars() {
                if ch.is_uppercase() {
                    any_upper = true;
                } else if ch.is_lowercase() {
                    any_lower = true;
                }
                if any_upper && any_lower {
                    break 'outer;
                }
            }
        }
        Self {
            all_upper: any_upper && !any_lower,
            all_lower: any_lower && !any_upper,
        }
    }

    /// The dictionary tier a text with this profile is filed under.
    pub fn tier(&self) -> CaseTier {
        if self.all_upper {
            CaseTier::Upper
        } else if self.all_lower {
            CaseTier::Lower
        } else {
            CaseTier::Mixed
        }
    }

    pub fn is_mixed(&self) -> bool {
        !self.all_upper && !self.all_lower
    }
}

// ---------------------------------------------------------------------------
// CaseTier
// ---------------------------------------------------------------------------

/// One of the three buckets a dictionary entry is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseTier {
    Upper,
    Mixed,
    Lower,
}

impl CaseTier {
    pub const ALL: [CaseTier; 3] = [CaseTier::Upper, CaseTier::Mixed, CaseTier::Lower];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseTier::Upper => "upper",
            CaseTier::Mixed => "mixed",
            CaseTier::Lower => "lower",
        }
    }

    /// The canonical case profile of every term stored in this tier.
    pub fn profile(&self) -> CaseProfile {
        match self {
            CaseTier::Upper => CaseProfile::UPPER,
            CaseTier::Mixed => CaseProfile::MIXED,
            CaseTier::Lower => CaseProfile::LOWER,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_upper_text() {
        let p = CaseProfile::of("AIDS");
        assert!(p.all_upper);
        assert!(!p.all_lower);
        assert_eq!(p.tier(), CaseTier::Upper);
    }

    #[test]
    fn all_lower_text() {
        let p = CaseProfile::of("fever");
        assert!(p.all_lower);
        assert_eq!(p.tier(), CaseTier::Lower);
    }

    #[test]
    fn mixed_text() {
        let p = CaseProfile::of("Parkinson");
        assert!(p.is_mixed());
        assert_eq!(p.tier(), CaseTier::Mixed);
    }

    #[test]
    fn digits_and_punctuation_are_uncased() {
        let p = CaseProfile::of("12.5-%");
        assert!(!p.all_upper);
        assert!(!p.all_lower);
        assert_eq!(p.tier(), CaseTier::Mixed);
    }

    #[test]
    fn digits_do_not_break_upper() {
        assert!(CaseProfile::of("COVID19").all_upper);
        assert!(CaseProfile::of("b12").all_lower);
    }

    #[test]
    fn parts_are_classified_together() {
        assert!(CaseProfile::of_parts(["HIV", "POSITIVE"]).all_upper);
        assert!(CaseProfile::of_parts(["HIV", "positive"]).is_mixed());
        assert!(CaseProfile::of_parts(["chest", "pain"]).all_lower);
    }

    #[test]
    fn non_ascii_letters_are_cased() {
        assert!(CaseProfile::of("ÉCLAMPSIE").all_upper);
        assert!(CaseProfile::of("éclampsie").all_lower);
    }

    #[test]
    fn tier_profiles_round_trip() {
        for tier in CaseTier::ALL {
            assert_eq!(tier.profile().tier(), tier);
        }
    }

    #[test]
    fn tier_serializes_to_snake_case() {
        assert_eq!(serde_json::to_string(&CaseTier::Upper).unwrap(), "\"upper\"");
        assert_eq!(serde_json::to_string(&CaseTier::Mixed).unwrap(), "\"mixed\"");
        assert_eq!(serde_json::to_string(&CaseTier::Lower).unwrap(), "\"lower\"");
    }
}
