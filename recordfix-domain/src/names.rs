//! Judge and court name cleanup rules.
//!
//! Each rule has a detection half (used by the snapshot generator to count
//! standardization issues) and a transformation half (used by the engine).
//! Transformations are only applied when their rule is flagged, so a name
//! that already passes a check is never re-normalized by it.

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static HONORIFIC_PREFIX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(
        r"(?i)^\s*(the\s+honou?rable|honou?rable|hon\.?|chief\s+judge|chief\s+justice|magistrate\s+judge|judge|justice)(\s+|$)",
    )
    .expect("static honorific regex")
});

static REPEATED_WHITESPACE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\s{2,}|\t|\n").expect("static whitespace regex"));

const ROMAN_SUFFIXES: &[&str] = &["II", "III", "IV", "VI", "VII", "VIII"];

/// Cleanup rules flagged for one name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameFlags {
    pub honorific_prefix: bool,
    pub all_uppercase: bool,
    pub all_lowercase: bool,
    pub extra_whitespace: bool,
}

impl NameFlags {
    /// Parse validator tags. Unknown tags are ignored.
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Self {
        let mut flags = Self::default();
        for tag in tags {
            match tag.as_ref().trim().to_ascii_lowercase().as_str() {
                "honorific_prefix" | "prefix" | "title_prefix" => flags.honorific_prefix = true,
                "all_uppercase" | "all_caps" | "uppercase" => flags.all_uppercase = true,
                "all_lowercase" | "lowercase" => flags.all_lowercase = true,
                "extra_whitespace" | "whitespace" | "repeated_whitespace" => {
                    flags.extra_whitespace = true
                }
                _ => {}
            }
        }
        flags
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn tags(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.honorific_prefix {
            out.push("honorific_prefix");
        }
        if self.all_uppercase {
            out.push("all_uppercase");
        }
        if self.all_lowercase {
            out.push("all_lowercase");
        }
        if self.extra_whitespace {
            out.push("extra_whitespace");
        }
        out
    }
}

/// Which cleanup rules a name currently fails.
pub fn detect_name_issues(name: &str) -> NameFlags {
    let letters: Vec<char> = name.chars().filter(|c| c.is_alphabetic()).collect();
    NameFlags {
        honorific_prefix: HONORIFIC_PREFIX.is_match(name),
        all_uppercase: letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()),
        all_lowercase: !letters.is_empty() && letters.iter().all(|c| c.is_lowercase()),
        extra_whitespace: name != name.trim() || REPEATED_WHITESPACE.is_match(name),
    }
}

/// Apply the flagged rules in order: prefix, whitespace, case.
pub fn standardize_name(name: &str, flags: &NameFlags) -> String {
    let mut out = name.to_string();

    if flags.honorific_prefix {
        while let Some(m) = HONORIFIC_PREFIX.find(&out) {
            if m.end() == 0 {
                break;
            }
            out = out[m.end()..].trim_start().to_string();
        }
    }

    if flags.extra_whitespace {
        out = out.split_whitespace().collect::<Vec<_>>().join(" ");
    }

    if flags.all_uppercase || flags.all_lowercase {
        out = title_case(&out);
    }

    out
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let bare = word.trim_end_matches([',', '.']);
            if ROMAN_SUFFIXES.contains(&bare.to_ascii_uppercase().as_str()) {
                return word.to_ascii_uppercase();
            }
            title_case_word(word)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut at_boundary = true;
    let mut segment_len = 0usize;
    for c in word.chars() {
        if at_boundary {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        if c.is_alphabetic() {
            at_boundary = false;
            segment_len += 1;
        }
        // O'Brien, Smith-Jones
        if c == '-' || (c == '\'' && segment_len == 1) {
            at_boundary = true;
            segment_len = 0;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefix_and_title_cases_uppercase() {
        let flags = NameFlags::from_tags(&["prefix", "all_uppercase"]);
        assert_eq!(standardize_name("HON. JOHN SMITH", &flags), "John Smith");
    }

    #[test]
    fn applies_only_flagged_rules() {
        let only_prefix = NameFlags::from_tags(&["honorific_prefix"]);
        assert_eq!(
            standardize_name("Judge MARY  ANN Jones", &only_prefix),
            "MARY  ANN Jones"
        );

        let only_ws = NameFlags::from_tags(&["extra_whitespace"]);
        assert_eq!(
            standardize_name("  Judge mary   jones ", &only_ws),
            "Judge mary jones"
        );
    }

    #[test]
    fn strips_stacked_prefixes() {
        let flags = NameFlags::from_tags(&["honorific_prefix"]);
        assert_eq!(standardize_name("Hon. Judge Ruth Bader", &flags), "Ruth Bader");
        assert_eq!(
            standardize_name("The Honorable Chief Justice Amy Coe", &flags),
            "Amy Coe"
        );
    }

    #[test]
    fn title_case_handles_hyphens_apostrophes_and_suffixes() {
        let flags = NameFlags::from_tags(&["all_caps"]);
        assert_eq!(
            standardize_name("MARY O'BRIEN-SMITH III", &flags),
            "Mary O'Brien-Smith III"
        );
        let lower = NameFlags::from_tags(&["lowercase"]);
        assert_eq!(standardize_name("john smith jr.", &lower), "John Smith Jr.");
    }

    #[test]
    fn does_not_strip_names_that_merely_start_with_a_prefix_word() {
        let flags = NameFlags::from_tags(&["prefix"]);
        assert_eq!(standardize_name("Judgeman Wells", &flags), "Judgeman Wells");
    }

    #[test]
    fn detection_matches_rules() {
        let flags = detect_name_issues("HON.  JOHN SMITH");
        assert!(flags.honorific_prefix);
        assert!(flags.all_uppercase);
        assert!(!flags.all_lowercase);
        assert!(flags.extra_whitespace);

        assert!(detect_name_issues("John Smith").is_empty());
        assert!(detect_name_issues("john smith").all_lowercase);
    }

    #[test]
    fn unknown_tags_are_ignored() {
        let flags = NameFlags::from_tags(&["mojibake", "ALL_CAPS"]);
        assert_eq!(flags.tags(), vec!["all_uppercase"]);
    }
}
