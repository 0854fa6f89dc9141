//! Token Manager (C8): mints reversible tokens, applies them to text, and
//! reinserts originals on return.

use crate::crypto::hmac_sha256_hex;
use crate::policy::{Policy, TokenFormat};
use crate::span::{FilterType, Span};
use regex::Regex;
use std::collections::HashMap;
use zeroize::Zeroize;

/// A session is the scope of one redaction request: it owns a token counter
/// per type and the bijective token -> original map.
pub struct Session {
    pub salt: String,
    counters: HashMap<&'static str, u32>,
    /// token -> original substring
    token_map: HashMap<String, String>,
    /// (filter_type, original substring) -> already-minted token, so that
    /// repeated PHI within a session reuses its first token (P5/scenario 6).
    minted: HashMap<(&'static str, String), String>,
    date_shift_days: Option<i64>,
}

impl Session {
    pub fn new(salt: impl Into<String>) -> Self {
        Session {
            salt: salt.into(),
            counters: HashMap::new(),
            token_map: HashMap::new(),
            minted: HashMap::new(),
            date_shift_days: None,
        }
    }

    /// Deterministic `[-maxDays, +maxDays]` offset derived from the session
    /// salt, computed once and memoised for the life of the session so every
    /// DATE span shifts by the same amount (interval-preserving).
    fn date_shift_offset(&mut self, max_days: u32) -> i64 {
        if let Some(days) = self.date_shift_days {
            return days;
        }
        let digest = hmac_sha256_hex(&self.salt, "dateshift").unwrap_or_default();
        let sample = u32::from_str_radix(&digest[0..8.min(digest.len())], 16).unwrap_or(0);
        let span = (max_days as i64) * 2 + 1;
        let offset = (sample as i64 % span) - max_days as i64;
        self.date_shift_days = Some(offset);
        offset
    }

    fn next_counter(&mut self, filter_type: &'static str) -> u32 {
        let counter = self.counters.entry(filter_type).or_insert(0);
        *counter += 1;
        *counter
    }

    fn format_token(&self, filter_type: &'static str, n: u32, token_format: TokenFormat) -> String {
        match token_format {
            TokenFormat::Braced => format!("{{{{{}_{}_{}}}}}", filter_type, self.salt, n),
            TokenFormat::Bracketed => format!("[{}_{}_{}]", filter_type, self.salt, n),
        }
    }

    /// Mints (or reuses) a token for `span`, recording the bijection.
    ///
    /// AGE is the one category minted without a bijective entry: per the
    /// Safe Harbor age rule, any age >= 90 is replaced by the literal
    /// "90+", which is not reversible to the original value by design, so
    /// it is never added to the token map.
    pub fn mint(&mut self, span: &Span, policy: &Policy) -> String {
        if span.filter_type == FilterType::Age && policy.age_over_89_as_90_plus {
            return "90+".to_string();
        }

        let filter_type = span.filter_type.as_str();
        let dedup_key = (filter_type, span.text.clone());

        if let Some(existing) = self.minted.get(&dedup_key) {
            return existing.clone();
        }

        let token = if span.filter_type == FilterType::Date && policy.date_shift.enabled {
            self.mint_shifted_date(span, policy)
        } else {
            let n = self.next_counter(filter_type);
            self.format_token(filter_type, n, policy.token_format)
        };

        self.token_map.insert(token.clone(), span.text.clone());
        self.minted.insert(dedup_key, token.clone());
        token
    }

    fn mint_shifted_date(&mut self, span: &Span, policy: &Policy) -> String {
        let n = self.next_counter("SHIFTED_DATE");
        let offset = self.date_shift_offset(policy.date_shift.max_days);
        let year = extract_year(&span.text).unwrap_or_else(|| "0000".to_string());
        let direction = if offset < 0 { "earlier" } else { "later" };
        format!("[{} days {}, SHIFTED_DATE_{}: {}]", offset.abs(), direction, n, year)
    }

    pub fn token_map(&self) -> &HashMap<String, String> {
        &self.token_map
    }

    pub fn into_token_map(self) -> HashMap<String, String> {
        self.token_map
    }
}

fn extract_year(text: &str) -> Option<String> {
    static YEAR_RE: once_cell::sync::Lazy<Regex> =
        once_cell::sync::Lazy::new(|| Regex::new(r"(?:19|20)\d{2}").unwrap());
    YEAR_RE.find(text).map(|m| m.as_str().to_string())
}

fn build_utf16_to_byte_map(text: &str) -> Vec<(u32, usize)> {
    let mut map: Vec<(u32, usize)> = Vec::with_capacity(text.len().min(1024));
    let mut u16_pos: u32 = 0;
    map.push((0, 0));
    for (byte_pos, ch) in text.char_indices() {
        map.push((u16_pos, byte_pos));
        u16_pos = u16_pos.saturating_add(ch.len_utf16() as u32);
    }
    map.push((u16_pos, text.len()));
    map.sort_by_key(|(u, _)| *u);
    map.dedup_by_key(|(u, _)| *u);
    map
}

fn utf16_to_byte(map: &[(u32, usize)], u16_pos: u32) -> usize {
    match map.binary_search_by_key(&u16_pos, |(u, _)| *u) {
        Ok(i) => map[i].1,
        Err(i) => {
            if i == 0 {
                0
            } else {
                map[i - 1].1
            }
        }
    }
}

/// Mints a token per span (in `spans` order) and substitutes it into `text`,
/// sorting by descending `start` so earlier offsets stay valid. The
/// extracted PHI segment is zeroized once substituted. Returns the redacted
/// text; the session's token map is populated as a side effect.
pub fn apply_tokens(text: &str, spans: &[Span], policy: &Policy, session: &mut Session) -> String {
    if text.is_empty() || spans.is_empty() {
        return text.to_string();
    }

    let map = build_utf16_to_byte_map(text);
    let mut out = text.to_string();

    let mut order: Vec<&Span> = spans.iter().collect();
    order.sort_by(|a, b| b.start.cmp(&a.start));

    for span in order {
        let token = session.mint(span, policy);

        let start_b = utf16_to_byte(&map, span.start).min(out.len());
        let end_b = utf16_to_byte(&map, span.end).min(out.len());
        if end_b <= start_b || !out.is_char_boundary(start_b) || !out.is_char_boundary(end_b) {
            continue;
        }

        let mut phi_segment = out[start_b..end_b].to_string();
        out.replace_range(start_b..end_b, &token);
        phi_segment.zeroize();
    }

    out
}

/// Matches a whole decorated date-shift token tolerantly: the surrounding
/// bracket, the "<n> days earlier/later" prefix, punctuation, spacing, and
/// trailing year are all optional/loosely spaced, since a downstream system
/// may reformat them - only the `SHIFTED_DATE_<n>` marker itself is load
/// bearing, and it alone identifies which original value to restore.
static SHIFTED_DATE_MARKER_RE: once_cell::sync::Lazy<Regex> = once_cell::sync::Lazy::new(|| {
    Regex::new(r"\[?\s*\d+\s*days?\s*(?:earlier|later)\s*,?\s*SHIFTED_DATE_(\d+)\s*:?\s*\d{4}\s*\]?").unwrap()
});

/// Reinserts originals into `response_text`.
///
/// Ordinary tokens (`{{TYPE_salt_n}}` / `[TYPE_salt_n]`) are matched by exact
/// literal - a downstream system is expected to echo those back verbatim.
/// Date-shift tokens are decorated with human-readable filler (the day
/// count, direction, and year) that a downstream system may reformat or
/// re-punctuate, so those are matched tolerantly by their `SHIFTED_DATE_<n>`
/// marker alone and restored by index rather than by exact text. Unknown
/// token-shaped substrings are left verbatim. Returns `(text, restored_count)`.
pub fn reinsert(response_text: &str, token_map: &HashMap<String, String>) -> (String, usize) {
    if token_map.is_empty() || response_text.is_empty() {
        return (response_text.to_string(), 0);
    }

    let mut shifted_date_by_index: HashMap<String, &String> = HashMap::new();
    let mut exact_alternatives: Vec<&String> = Vec::with_capacity(token_map.len());

    for (token, original) in token_map.iter() {
        if let Some(caps) = SHIFTED_DATE_MARKER_RE.captures(token) {
            shifted_date_by_index.insert(caps[1].to_string(), original);
        } else {
            exact_alternatives.push(token);
        }
    }

    // Longest-first so a token that is a prefix of another doesn't shadow it.
    exact_alternatives.sort_by_key(|k| std::cmp::Reverse(k.len()));

    let mut restored_count = 0usize;

    let text_after_exact = if exact_alternatives.is_empty() {
        response_text.to_string()
    } else {
        let pattern = exact_alternatives
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        match Regex::new(&pattern) {
            Ok(re) => re
                .replace_all(response_text, |caps: &regex::Captures| {
                    let matched = &caps[0];
                    if let Some(original) = token_map.get(matched) {
                        restored_count += 1;
                        original.clone()
                    } else {
                        matched.to_string()
                    }
                })
                .into_owned(),
            Err(_) => response_text.to_string(),
        }
    };

    if shifted_date_by_index.is_empty() {
        return (text_after_exact, restored_count);
    }

    let result = SHIFTED_DATE_MARKER_RE
        .replace_all(&text_after_exact, |caps: &regex::Captures| {
            let index = &caps[1];
            if let Some(original) = shifted_date_by_index.get(index) {
                restored_count += 1;
                original.to_string()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned();

    (result, restored_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::FilterType;

    fn span(start: u32, end: u32, text: &str, ft: FilterType) -> Span {
        Span::new(start, end, text, ft, 0.9, "test")
    }

    #[test]
    fn mint_is_deterministic_for_same_session() {
        let policy = Policy::default();
        let mut session = Session::new("A1B2C3D4");
        let s = span(0, 4, "John", FilterType::Name);
        let t1 = session.mint(&s, &policy);
        assert_eq!(t1, "{{NAME_A1B2C3D4_1}}");
    }

    #[test]
    fn repeated_phi_reuses_token() {
        let policy = Policy::default();
        let mut session = Session::new("A1B2C3D4");
        let s1 = span(0, 4, "John", FilterType::Name);
        let s2 = span(50, 54, "John", FilterType::Name);
        let t1 = session.mint(&s1, &policy);
        let t2 = session.mint(&s2, &policy);
        assert_eq!(t1, t2);
    }

    #[test]
    fn apply_tokens_and_reinsert_round_trip() {
        let policy = Policy::default();
        let mut session = Session::new("A1B2C3D4");
        let text = "Patient John Smith, SSN 123-45-6789.";
        let spans = vec![
            span(8, 18, "John Smith", FilterType::Name),
            span(25, 36, "123-45-6789", FilterType::Ssn),
        ];
        let redacted = apply_tokens(text, &spans, &policy, &mut session);
        assert!(redacted.contains("{{NAME_A1B2C3D4_1}}"));
        assert!(redacted.contains("{{SSN_A1B2C3D4_1}}"));

        let (restored, count) = reinsert(&redacted, session.token_map());
        assert_eq!(restored, text);
        assert_eq!(count, 2);
    }

    #[test]
    fn reinsert_leaves_unknown_tokens_verbatim() {
        let map = HashMap::new();
        let (restored, count) = reinsert("Hello {{UNKNOWN_X_1}}", &map);
        assert_eq!(restored, "Hello {{UNKNOWN_X_1}}");
        assert_eq!(count, 0);
    }

    #[test]
    fn date_shift_token_preserves_year() {
        let mut policy = Policy::default();
        policy.date_shift.enabled = true;
        policy.date_shift.max_days = 30;
        let mut session = Session::new("A1B2C3D4");
        let s = span(0, 10, "03/14/1980", FilterType::Date);
        let token = session.mint(&s, &policy);
        assert!(token.contains("SHIFTED_DATE_1"));
        assert!(token.contains("1980"));
    }

    #[test]
    fn shifted_date_token_restores_despite_reformatted_decoration() {
        let mut policy = Policy::default();
        policy.date_shift.enabled = true;
        policy.date_shift.max_days = 30;
        let mut session = Session::new("A1B2C3D4");
        let s = span(0, 10, "03/14/1980", FilterType::Date);
        let token = session.mint(&s, &policy);

        // Simulate a downstream system echoing the token back with
        // different punctuation/spacing than what was minted, but keeping
        // the SHIFTED_DATE_<n> marker intact.
        let reformatted = token.replace(", ", " ").replace(':', "");
        assert_ne!(reformatted, token);

        let text = format!("Visit occurred on {}.", reformatted);
        let (restored, count) = reinsert(&text, session.token_map());
        assert_eq!(restored, "Visit occurred on 03/14/1980.");
        assert_eq!(count, 1);
    }

    #[test]
    fn age_90_plus_mints_literal_and_is_not_in_token_map() {
        let policy = Policy::default();
        let mut session = Session::new("A1B2C3D4");
        let s = span(0, 2, "92", FilterType::Age);
        let token = session.mint(&s, &policy);
        assert_eq!(token, "90+");
        assert!(!session.token_map().contains_key("90+"));
    }
}
