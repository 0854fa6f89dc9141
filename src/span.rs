use crate::interval::SpanIntervalTree;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Closed enumeration of Safe Harbor identifier categories a span can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterType {
    Name,
    ProviderName,
    Email,
    Ssn,
    Phone,
    Fax,
    Address,
    Zipcode,
    City,
    State,
    County,
    Date,
    RelativeDate,
    Age,
    CreditCard,
    Account,
    Bitcoin,
    Iban,
    Mrn,
    HealthPlan,
    Device,
    License,
    Passport,
    Ip,
    Url,
    MacAddress,
    Biometric,
    Vehicle,
    Occupation,
    Custom,
}

impl FilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::Name => "NAME",
            FilterType::ProviderName => "PROVIDER_NAME",
            FilterType::Email => "EMAIL",
            FilterType::Ssn => "SSN",
            FilterType::Phone => "PHONE",
            FilterType::Fax => "FAX",
            FilterType::Address => "ADDRESS",
            FilterType::Zipcode => "ZIPCODE",
            FilterType::City => "CITY",
            FilterType::State => "STATE",
            FilterType::County => "COUNTY",
            FilterType::Date => "DATE",
            FilterType::RelativeDate => "RELATIVE_DATE",
            FilterType::Age => "AGE",
            FilterType::CreditCard => "CREDIT_CARD",
            FilterType::Account => "ACCOUNT",
            FilterType::Bitcoin => "BITCOIN",
            FilterType::Iban => "IBAN",
            FilterType::Mrn => "MRN",
            FilterType::HealthPlan => "HEALTH_PLAN",
            FilterType::Device => "DEVICE",
            FilterType::License => "LICENSE",
            FilterType::Passport => "PASSPORT",
            FilterType::Ip => "IP",
            FilterType::Url => "URL",
            FilterType::MacAddress => "MAC_ADDRESS",
            FilterType::Biometric => "BIOMETRIC",
            FilterType::Vehicle => "VEHICLE",
            FilterType::Occupation => "OCCUPATION",
            FilterType::Custom => "CUSTOM",
        }
    }

    pub fn from_str_lenient(s: &str) -> Option<FilterType> {
        let norm = s.trim().to_ascii_uppercase().replace(' ', "_");
        Some(match norm.as_str() {
            "NAME" => FilterType::Name,
            "PROVIDER_NAME" => FilterType::ProviderName,
            "EMAIL" => FilterType::Email,
            "SSN" => FilterType::Ssn,
            "PHONE" => FilterType::Phone,
            "FAX" => FilterType::Fax,
            "ADDRESS" => FilterType::Address,
            "ZIPCODE" | "ZIP" => FilterType::Zipcode,
            "CITY" => FilterType::City,
            "STATE" => FilterType::State,
            "COUNTY" => FilterType::County,
            "DATE" => FilterType::Date,
            "RELATIVE_DATE" => FilterType::RelativeDate,
            "AGE" => FilterType::Age,
            "CREDIT_CARD" | "CREDITCARD" => FilterType::CreditCard,
            "ACCOUNT" => FilterType::Account,
            "BITCOIN" => FilterType::Bitcoin,
            "IBAN" => FilterType::Iban,
            "MRN" => FilterType::Mrn,
            "HEALTH_PLAN" | "HEALTHPLAN" => FilterType::HealthPlan,
            "DEVICE" => FilterType::Device,
            "LICENSE" => FilterType::License,
            "PASSPORT" => FilterType::Passport,
            "IP" => FilterType::Ip,
            "URL" => FilterType::Url,
            "MAC_ADDRESS" | "MAC" => FilterType::MacAddress,
            "BIOMETRIC" => FilterType::Biometric,
            "VEHICLE" | "UNIQUE_ID" => FilterType::Vehicle,
            "OCCUPATION" => FilterType::Occupation,
            _ => FilterType::Custom,
        })
    }

    /// The closed enumeration, in declaration order. Used by
    /// `from_public_name` to validate a string against the public contract
    /// rather than the lenient detector-tag aliases `from_str_lenient`
    /// additionally accepts.
    pub const ALL: &'static [FilterType] = &[
        FilterType::Name,
        FilterType::ProviderName,
        FilterType::Email,
        FilterType::Ssn,
        FilterType::Phone,
        FilterType::Fax,
        FilterType::Address,
        FilterType::Zipcode,
        FilterType::City,
        FilterType::State,
        FilterType::County,
        FilterType::Date,
        FilterType::RelativeDate,
        FilterType::Age,
        FilterType::CreditCard,
        FilterType::Account,
        FilterType::Bitcoin,
        FilterType::Iban,
        FilterType::Mrn,
        FilterType::HealthPlan,
        FilterType::Device,
        FilterType::License,
        FilterType::Passport,
        FilterType::Ip,
        FilterType::Url,
        FilterType::MacAddress,
        FilterType::Biometric,
        FilterType::Vehicle,
        FilterType::Occupation,
        FilterType::Custom,
    ];

    /// Strict lookup against the public `filterType` contract (§6): matches
    /// only a variant's own `as_str()` spelling (case-insensitive), unlike
    /// `from_str_lenient`'s detector-tag aliases and open-ended `Custom`
    /// fallback. Returns `None` for anything not in the closed enumeration,
    /// which is what policy validation needs to reject an unknown filter
    /// type rather than silently accepting it as `Custom`.
    pub fn from_public_name(s: &str) -> Option<FilterType> {
        let norm = s.trim().to_ascii_uppercase().replace(' ', "_");
        FilterType::ALL.iter().copied().find(|ft| ft.as_str() == norm)
    }

    /// Filter-level priority, used as a tie-breaker by the overlap resolver and
    /// the vector disambiguator.
    pub fn priority(&self) -> u32 {
        match self {
            FilterType::Ssn => 100,
            FilterType::Mrn => 95,
            FilterType::CreditCard => 90,
            FilterType::Account
            | FilterType::License
            | FilterType::Passport
            | FilterType::Iban
            | FilterType::HealthPlan => 85,
            FilterType::Email => 80,
            FilterType::Phone
            | FilterType::Fax
            | FilterType::Ip
            | FilterType::Url
            | FilterType::MacAddress
            | FilterType::Bitcoin => 75,
            FilterType::Vehicle | FilterType::Device | FilterType::Biometric => 70,
            FilterType::Date => 60,
            FilterType::Zipcode => 55,
            FilterType::Address => 50,
            FilterType::City | FilterType::State | FilterType::County => 45,
            FilterType::Age | FilterType::RelativeDate => 40,
            FilterType::ProviderName => 36,
            FilterType::Name => 35,
            FilterType::Occupation => 30,
            FilterType::Custom => 20,
        }
    }

    /// Type specificity: how structured the category is. Used by the overlap
    /// resolver's composite score and by the disambiguator's priority tie-break.
    pub fn type_specificity(&self) -> u32 {
        type_specificity(self.as_str())
    }
}

/// The central detection record. See the data model: `start`/`end` are
/// half-open code-unit positions (UTF-16 throughout this crate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
    pub text: String,
    pub filter_type: FilterType,
    pub confidence: f64,
    pub priority: u32,
    pub window: Vec<String>,
    pub pattern: String,
    pub applied: bool,
    pub ignored: bool,
    pub ambiguous_with: HashSet<String>,
    pub replacement: Option<String>,
    pub salt: Option<String>,
}

impl Span {
    pub fn new(start: u32, end: u32, text: impl Into<String>, filter_type: FilterType, confidence: f64, pattern: impl Into<String>) -> Self {
        let priority = filter_type.priority();
        Self {
            start,
            end,
            text: text.into(),
            filter_type,
            confidence,
            priority,
            window: Vec::new(),
            pattern: pattern.into(),
            applied: false,
            ignored: false,
            ambiguous_with: HashSet::new(),
            replacement: None,
            salt: None,
        }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }
}

/// Type specificity lookup table, shared by the overlap resolver (C5) and the
/// per-filter compile-time constants referenced in the filter set (C2).
pub fn type_specificity(filter_type: &str) -> u32 {
    match filter_type {
        "SSN" => 100,
        "MRN" => 95,
        "CREDIT_CARD" | "CREDITCARD" => 90,
        "ACCOUNT" | "LICENSE" | "PASSPORT" | "IBAN" | "HEALTH_PLAN" | "HEALTHPLAN" => 85,
        "EMAIL" => 80,
        "PHONE" | "FAX" | "IP" | "URL" | "MAC_ADDRESS" | "BITCOIN" => 75,
        "VEHICLE" | "DEVICE" | "BIOMETRIC" | "UNIQUE_ID" => 70,
        "DATE" => 60,
        "ZIPCODE" => 55,
        "ADDRESS" => 50,
        "CITY" | "STATE" | "COUNTY" => 45,
        "AGE" | "RELATIVE_DATE" => 40,
        "PROVIDER_NAME" => 36,
        "NAME" => 35,
        "OCCUPATION" => 30,
        "CUSTOM" => 20,
        _ => 25,
    }
}

/// Structure words that indicate a NAME span likely swallowed adjacent,
/// non-name text ("John Smith DOB" grabbed a field label).
const NAME_STRUCTURE_WORDS: &[&str] = &[
    "DATE", "BIRTH", "RECORD", "NUMBER", "PHONE", "ADDRESS", "EMAIL", "MEMBER", "ACCOUNT",
    "STATUS", "DOB", "MRN", "SSN", "ID",
];

fn contains_structure_word(text: &str) -> bool {
    let upper = text.to_uppercase();
    upper
        .split_whitespace()
        .any(|word| NAME_STRUCTURE_WORDS.contains(&word.trim_matches(|c: char| !c.is_alphanumeric())))
}

/// The §4.4 composite score: `0.4*length + 0.3*confidence + 0.2*specificity + 0.1*priority`,
/// each term normalised to a 0-100 scale before weighting.
pub fn calculate_score(span: &Span) -> f64 {
    let mut length_score = ((span.len() as f64 / 50.0).min(1.0)) * 100.0 * 0.4;

    if matches!(span.filter_type, FilterType::Name) && contains_structure_word(&span.text) {
        length_score = 0.0;
    }

    let confidence_score = span.confidence * 100.0 * 0.3;
    let type_score = ((span.filter_type.type_specificity() as f64 / 100.0).min(1.0)) * 100.0 * 0.2;
    let priority_score = ((span.priority as f64 / 100.0).min(1.0)) * 100.0 * 0.1;
    length_score + confidence_score + type_score + priority_score
}

fn contains(a_start: u32, a_end: u32, b_start: u32, b_end: u32) -> bool {
    a_start <= b_start && a_end >= b_end
}

#[derive(Clone)]
struct Scored {
    index: usize,
    start: u32,
    end: u32,
    length: u32,
    confidence: f64,
    score: f64,
    type_spec: u32,
    filter_type: FilterType,
    text: String,
}

impl Scored {
    /// A throwaway `Span` carrying just enough of this entry's identity for
    /// `SpanIntervalTree` bookkeeping (insertion key, overlap queries).
    fn as_lookup_span(&self) -> Span {
        Span::new(self.start, self.end, self.text.clone(), self.filter_type, self.confidence, "overlap-index")
    }
}

/// Resolves overlaps among a candidate span set (C5), returning the indices
/// (into the input slice) of the spans that survive, sorted by `start`.
///
/// Implements the decision table in §4.4: disjoint spans are both kept;
/// a more-specific, high-confidence (>=0.9) span wins containment against a
/// less specific one in either direction; any other overlap drops the
/// lower-scored candidate (spans are processed in descending score order, so
/// "the candidate" is always the later, lower-scored one).
pub fn drop_overlapping_spans(spans: &[Span]) -> Vec<usize> {
    if spans.is_empty() {
        return vec![];
    }
    if spans.len() == 1 {
        return vec![0];
    }

    // STEP 1: collapse exact duplicates (same position + type), keep highest confidence.
    let mut unique_map: HashMap<String, usize> = HashMap::new();
    for (i, s) in spans.iter().enumerate() {
        let key = format!("{}-{}-{}", s.start, s.end, s.filter_type.as_str());
        match unique_map.get(&key) {
            None => {
                unique_map.insert(key, i);
            }
            Some(&existing_idx) => {
                if spans[existing_idx].confidence < s.confidence {
                    unique_map.insert(key, i);
                }
            }
        }
    }

    let mut scored: Vec<Scored> = Vec::with_capacity(unique_map.len());
    for idx in unique_map.values().copied() {
        let s = &spans[idx];
        scored.push(Scored {
            index: idx,
            start: s.start,
            end: s.end,
            length: s.len(),
            confidence: s.confidence,
            score: calculate_score(s),
            type_spec: s.filter_type.type_specificity(),
            filter_type: s.filter_type,
            text: s.text.clone(),
        });
    }

    if scored.len() == 1 {
        return vec![scored[0].index];
    }

    // STEP 2: sort by score (desc), then position (asc), then length (desc) -
    // a stable sort preserves insertion order as the final tie-break.
    scored.sort_by(|a, b| {
        if (a.score - b.score).abs() > 0.001 {
            return b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal);
        }
        if a.start != b.start {
            return a.start.cmp(&b.start);
        }
        b.length.cmp(&a.length)
    });

    // STEP 3: greedy overlap removal with containment-aware swapping, using
    // the Span Index (C4) to find which already-kept spans a candidate
    // overlaps instead of scanning every kept span in turn.
    let index = SpanIntervalTree::new();
    let mut kept: Vec<Scored> = Vec::new();
    let mut kept_idx_by_key: HashMap<String, usize> = HashMap::new();

    'outer: for cand in scored.into_iter() {
        let hits = index.find_overlaps(cand.start, cand.end);

        let mut should_keep = true;
        let mut replace_idx: Option<usize> = None;

        for (e_start, e_end, e_filter_type, _e_confidence, _e_priority, e_text) in hits {
            let e_type_spec = type_specificity(e_filter_type);
            let cand_contains_existing = contains(cand.start, cand.end, e_start, e_end);
            let existing_contains_cand = contains(e_start, e_end, cand.start, cand.end);

            if cand_contains_existing {
                // Containment override only ever favours the *contained*
                // span when it is more specific (see the `existing_contains_cand`
                // arm below); being the bigger container is never itself
                // grounds to bump a more-specific existing span, regardless
                // of how `cand` and `existing` compare on specificity.
                should_keep = false;
                break;
            } else if existing_contains_cand {
                if cand.type_spec > e_type_spec && cand.confidence >= 0.9 {
                    let key = format!("{}-{}-{}-{}", e_start, e_end, e_filter_type, e_text);
                    replace_idx = kept_idx_by_key.get(&key).copied();
                    break;
                }
                should_keep = false;
                break;
            } else {
                should_keep = false;
                break;
            }
        }

        if let Some(i) = replace_idx {
            let old = &kept[i];
            let old_key = format!("{}-{}-{}-{}", old.start, old.end, old.filter_type.as_str(), old.text);
            index.remove_by_key(&old_key);
            kept_idx_by_key.remove(&old_key);

            let new_key = index.insert(&cand.as_lookup_span());
            kept_idx_by_key.insert(new_key, i);
            kept[i] = cand;
            continue 'outer;
        }

        if should_keep {
            let key = index.insert(&cand.as_lookup_span());
            kept_idx_by_key.insert(key, kept.len());
            kept.push(cand);
        }
    }

    kept.sort_by(|a, b| a.start.cmp(&b.start));
    kept.into_iter().map(|s| s.index).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_span(start: u32, end: u32, filter_type: FilterType, confidence: f64) -> Span {
        Span::new(start, end, "x".repeat((end - start) as usize), filter_type, confidence, "test")
    }

    #[test]
    fn disjoint_spans_both_kept() {
        let spans = vec![
            make_span(0, 5, FilterType::Ssn, 0.9),
            make_span(10, 15, FilterType::Name, 0.8),
        ];
        let kept = drop_overlapping_spans(&spans);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn more_specific_containing_span_wins() {
        let spans = vec![
            make_span(0, 11, FilterType::Account, 0.95),
            make_span(0, 11, FilterType::Ssn, 0.95),
        ];
        let kept = drop_overlapping_spans(&spans);
        assert_eq!(kept.len(), 1);
        assert_eq!(spans[kept[0]].filter_type, FilterType::Ssn);
    }

    #[test]
    fn exact_duplicate_keeps_highest_confidence() {
        let spans = vec![
            make_span(0, 5, FilterType::Name, 0.6),
            make_span(0, 5, FilterType::Name, 0.9),
        ];
        let kept = drop_overlapping_spans(&spans);
        assert_eq!(kept.len(), 1);
        assert!((spans[kept[0]].confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn single_span_is_kept() {
        let spans = vec![make_span(0, 3, FilterType::Age, 0.9)];
        assert_eq!(drop_overlapping_spans(&spans), vec![0]);
    }

    #[test]
    fn containing_span_never_overrides_a_kept_contained_span() {
        // The NAME span scores higher overall (short, confident) and is kept
        // first. The larger ACCOUNT-typed span that contains it is more
        // specific, but being the *container* earns it no override - only a
        // more-specific *contained* span (the `existing_contains_cand` arm)
        // can replace a kept span. Both surviving would violate the
        // no-overlap invariant.
        let spans = vec![
            make_span(2, 6, FilterType::Name, 0.9),
            make_span(0, 20, FilterType::Account, 0.1),
        ];
        let kept = drop_overlapping_spans(&spans);
        assert_eq!(kept.len(), 1);
        assert_eq!(spans[kept[0]].filter_type, FilterType::Name);
    }

    #[test]
    fn name_span_with_structure_word_loses_length_score() {
        let structured = Span::new(0, 20, "John Smith DOB Number", FilterType::Name, 0.8, "test");
        let clean = Span::new(0, 10, "John Smith", FilterType::Name, 0.8, "test");
        assert!(calculate_score(&clean) > calculate_score(&structured));
    }
}
