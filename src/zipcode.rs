//! Safe-Harbor ZIP-code population guard, part of C2's geographic family and
//! consulted by C7 via `policy.zipcode.strictSafeHarbor`.
//!
//! HIPAA Safe Harbor (45 CFR 164.514(b)(2)(i)(B)) permits disclosure of the
//! initial three digits of a ZIP code *unless* the combined population of
//! all ZIP codes sharing that prefix is 20,000 or fewer, per the Census
//! Bureau geography in effect at de-identification time - in which case the
//! prefix itself must be suppressed. The restricted-prefix list below is the
//! short, publicly published enumeration (there are only a few dozen such
//! prefixes nationwide); any prefix not on it is treated as population
//! >20,000, matching the rule's "unless" framing.

/// Three-digit ZIP prefixes whose combined population is <= 20,000 per the
/// Census Bureau geography HHS cites for Safe Harbor. Table shipped with the
/// core; not hot-reloadable (it changes only with a new Census release).
const RESTRICTED_ZIP3: &[&str] = &[
    "036", "059", "063", "102", "203", "556", "692", "790", "821", "823", "830", "831", "878",
    "879", "884", "890", "893",
];

pub fn is_zip3_restricted(zip3: &str) -> bool {
    RESTRICTED_ZIP3.contains(&zip3)
}

/// Given the full matched ZIP text (`"02134"`, `"02134-5678"`, ...), returns
/// the three leading ASCII digits if present.
fn leading_zip3(text: &str) -> Option<&str> {
    let mut end = 0usize;
    let mut digits = 0u32;
    for (i, c) in text.char_indices() {
        if c.is_ascii_digit() {
            digits += 1;
            end = i + c.len_utf8();
            if digits == 3 {
                return Some(&text[..end]);
            }
        } else if digits > 0 {
            break;
        }
    }
    None
}

/// Decides how much of a detected ZIPCODE span must be redacted under
/// `strictSafeHarbor`. Returns `None` when the whole span stays exactly as
/// detected (either the policy doesn't ask for the narrower treatment, or
/// the prefix is restricted and the full span remains PHI). Returns
/// `Some(skip_chars)` when the leading `skip_chars` *code units* of the span
/// are Safe-Harbor-disclosable geography and should be excluded from
/// redaction - only the remainder (if any) is still PHI.
///
/// All ZIP text is ASCII, so code units, UTF-16 units, and bytes coincide;
/// `skip_chars` is directly usable against the span's `start`/`end`.
pub fn population_guard_skip(span_text: &str, strict_safe_harbor: bool) -> Option<usize> {
    if !strict_safe_harbor {
        return None;
    }
    let zip3 = leading_zip3(span_text)?;
    if is_zip3_restricted(zip3) {
        return None;
    }
    Some(zip3.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restricted_prefix_is_recognised() {
        assert!(is_zip3_restricted("036"));
        assert!(!is_zip3_restricted("021"));
    }

    #[test]
    fn non_strict_policy_never_skips() {
        assert_eq!(population_guard_skip("02134", false), None);
    }

    #[test]
    fn strict_policy_skips_populous_prefix() {
        assert_eq!(population_guard_skip("02134", true), Some(3));
        assert_eq!(population_guard_skip("02134-5678", true), Some(3));
    }

    #[test]
    fn strict_policy_keeps_restricted_prefix_whole() {
        assert_eq!(population_guard_skip("03601", true), None);
    }

    #[test]
    fn short_or_non_numeric_text_has_no_prefix() {
        assert_eq!(population_guard_skip("ab", true), None);
    }
}
