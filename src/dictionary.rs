//! Vocabulary & Dictionary Store (C1).
//!
//! Loads the first-name, surname, hospital, and insurance-company corpora
//! from newline-delimited UTF-8 files (`#`-prefixed lines are comments,
//! blank lines are skipped) and wires them into the name scanner (`name.rs`),
//! the phonetic index (`phonetic.rs`), and the fuzzy matchers (`fuzzy.rs`).
//! A missing or unreadable file degrades to an empty list with a `tracing`
//! warning - this module never panics or returns an error from a load
//! failure, since the filter set must still run on whatever vocabulary made
//! it in.

use crate::fuzzy::VulpesFuzzyMatcher;
use crate::name::VulpesNameScanner;
use crate::phonetic::VulpesPhoneticMatcher;
use crate::postfilter::{FIELD_LABELS, GEO_TERMS, MEDICAL_PHRASES, SECTION_HEADINGS, SINGLE_WORD_HEADINGS};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalises a dictionary key: NFKD decomposition, combining-mark removal
/// (diacritic stripping), then lower-casing. Equivalent in effect to NFKC
/// plus diacritic stripping, since the combining marks NFKD exposes are
/// dropped before any recomposition would reintroduce them.
pub fn normalize_key(s: &str) -> String {
    s.nfkd().filter(|c| !is_combining_mark(*c)).collect::<String>().to_lowercase()
}

fn load_lines(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => contents
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(normalize_key)
            .collect(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "dictionary file unavailable, degrading to empty list");
            Vec::new()
        }
    }
}

/// Result of a phonetic or fuzzy membership test against a named corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub canonical: String,
    pub score: f64,
    pub match_type: String,
}

/// The category a span of non-PHI text was classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonPhiCategory {
    SectionHeading,
    MedicalPhrase,
    GeoTerm,
    FieldLabel,
}

impl NonPhiCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NonPhiCategory::SectionHeading => "SECTION_HEADING",
            NonPhiCategory::MedicalPhrase => "MEDICAL_PHRASE",
            NonPhiCategory::GeoTerm => "GEO_TERM",
            NonPhiCategory::FieldLabel => "FIELD_LABEL",
        }
    }
}

/// Where the five corpora live on disk. Each field is a bare filename
/// resolved under `dir`; any of them may be absent.
pub struct DictionaryPaths {
    pub dir: PathBuf,
    pub first_names: &'static str,
    pub surnames: &'static str,
    pub hospitals: &'static str,
    pub insurance: &'static str,
}

impl DictionaryPaths {
    pub fn under(dir: impl Into<PathBuf>) -> Self {
        DictionaryPaths {
            dir: dir.into(),
            first_names: "first_names.txt",
            surnames: "surnames.txt",
            hospitals: "hospitals.txt",
            insurance: "insurance.txt",
        }
    }
}

/// The loaded vocabulary plus the name/phonetic/fuzzy matchers built from it.
/// Construction never fails: every corpus that can't be read degrades to an
/// empty set and the matchers simply never match against it.
pub struct Vocabulary {
    hospitals: HashSet<String>,
    insurance: HashSet<String>,
    name_scanner: VulpesNameScanner,
    phonetic: VulpesPhoneticMatcher,
    first_name_fuzzy: VulpesFuzzyMatcher,
    surname_fuzzy: VulpesFuzzyMatcher,
}

impl Vocabulary {
    pub fn load(paths: &DictionaryPaths) -> Self {
        let first_names = load_lines(&paths.dir.join(paths.first_names));
        let surnames = load_lines(&paths.dir.join(paths.surnames));
        let hospitals: HashSet<String> = load_lines(&paths.dir.join(paths.hospitals)).into_iter().collect();
        let insurance: HashSet<String> = load_lines(&paths.dir.join(paths.insurance)).into_iter().collect();

        let mut name_scanner = VulpesNameScanner::new();
        name_scanner.initialize(first_names.clone(), surnames.clone());

        let mut phonetic = VulpesPhoneticMatcher::new();
        phonetic.initialize(first_names.clone(), surnames.clone());

        let first_name_fuzzy = crate::fuzzy::create_first_name_matcher(first_names);
        let surname_fuzzy = crate::fuzzy::create_surname_matcher(surnames);

        Vocabulary {
            hospitals,
            insurance,
            name_scanner,
            phonetic,
            first_name_fuzzy,
            surname_fuzzy,
        }
    }

    /// An empty vocabulary - every membership test is a miss. Used when no
    /// dictionary directory is configured.
    pub fn empty() -> Self {
        let mut name_scanner = VulpesNameScanner::new();
        name_scanner.initialize(Vec::new(), Vec::new());
        let mut phonetic = VulpesPhoneticMatcher::new();
        phonetic.initialize(Vec::new(), Vec::new());
        Vocabulary {
            hospitals: HashSet::new(),
            insurance: HashSet::new(),
            name_scanner,
            phonetic,
            first_name_fuzzy: crate::fuzzy::create_first_name_matcher(Vec::new()),
            surname_fuzzy: crate::fuzzy::create_surname_matcher(Vec::new()),
        }
    }

    pub fn name_scanner(&self) -> &VulpesNameScanner {
        &self.name_scanner
    }

    /// `containsExact(term) -> bool` against the hospital corpus.
    pub fn is_hospital(&self, term: &str) -> bool {
        self.hospitals.contains(&normalize_key(term))
    }

    /// `containsExact(term) -> bool` against the insurance-company corpus.
    pub fn is_insurance(&self, term: &str) -> bool {
        self.insurance.contains(&normalize_key(term))
    }

    /// `classifyAsNonPHI(text) -> {category} | none`. Checks the document
    /// structure, medical-phrase, geographic-term, and field-label
    /// vocabularies built into the field-label whitelist (C3).
    pub fn classify_as_non_phi(&self, text: &str) -> Option<NonPhiCategory> {
        let trimmed = text.trim();
        let lower = trimmed.to_ascii_lowercase();

        if SECTION_HEADINGS.contains(trimmed) {
            return Some(NonPhiCategory::SectionHeading);
        }
        let words: Vec<&str> = trimmed.split_whitespace().collect();
        if words.len() == 1 && SINGLE_WORD_HEADINGS.contains(words[0]) {
            return Some(NonPhiCategory::SectionHeading);
        }
        if MEDICAL_PHRASES.contains(lower.as_str()) {
            return Some(NonPhiCategory::MedicalPhrase);
        }
        if lower.split_whitespace().any(|w| GEO_TERMS.contains(w)) {
            return Some(NonPhiCategory::GeoTerm);
        }
        if FIELD_LABELS.contains(lower.as_str()) {
            return Some(NonPhiCategory::FieldLabel);
        }
        None
    }

    /// `phoneticMatch(token, list) -> {canonical, score, matchType} | none`,
    /// Double Metaphone via `phonetic.rs`, floored at `min_score` (default
    /// 0.8 per the vocabulary contract).
    pub fn phonetic_match(&self, token: &str, min_score: f64) -> Option<MatchResult> {
        let best = self.phonetic.match_any_name(token.to_string())?;
        if best.confidence < min_score {
            return None;
        }
        Some(MatchResult {
            canonical: best.matched,
            score: best.confidence,
            match_type: best.match_type,
        })
    }

    /// `fuzzyMatch(token, list, maxEditDistance) -> {canonical, distance,
    /// confidence} | none`. Tries the first-name index, then the surname
    /// index, keeping the closer (lower edit distance) match.
    pub fn fuzzy_match(&self, token: &str) -> Option<MatchResult> {
        let first = self.first_name_fuzzy.lookup(token.to_string());
        let surname = self.surname_fuzzy.lookup(token.to_string());

        let pick = match (first.matched, surname.matched) {
            (true, true) => {
                if first.distance <= surname.distance {
                    Some(first)
                } else {
                    Some(surname)
                }
            }
            (true, false) => Some(first),
            (false, true) => Some(surname),
            (false, false) => None,
        }?;

        Some(MatchResult {
            canonical: pick.term.unwrap_or_default(),
            score: pick.confidence,
            match_type: pick.match_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_degrades_to_empty_vocabulary() {
        let paths = DictionaryPaths::under("/nonexistent/path/for/vulpes-redact-tests");
        let vocab = Vocabulary::load(&paths);
        assert!(!vocab.is_hospital("Mercy General"));
        assert!(vocab.name_scanner().is_initialized());
    }

    #[test]
    fn normalize_key_strips_diacritics_and_lowercases() {
        assert_eq!(normalize_key("José"), "jose");
        assert_eq!(normalize_key("MÜLLER"), "muller");
    }

    #[test]
    fn classify_as_non_phi_recognises_section_heading() {
        let vocab = Vocabulary::empty();
        assert_eq!(
            vocab.classify_as_non_phi("CLINICAL INFORMATION"),
            Some(NonPhiCategory::SectionHeading)
        );
        assert_eq!(vocab.classify_as_non_phi("Jordan Lake"), None);
    }

    #[test]
    fn empty_vocabulary_has_no_hospital_or_insurance_hits() {
        let vocab = Vocabulary::empty();
        assert!(!vocab.is_hospital("St Mary's"));
        assert!(!vocab.is_insurance("Acme Health Plan"));
    }
}
