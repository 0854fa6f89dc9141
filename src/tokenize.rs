//! Whitespace/word tokenizer with byte positions, used to build the ±W
//! context window around a candidate span for scoring (C2) and vector
//! disambiguation (C6).

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenWithPosition {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

pub fn tokenize_with_positions(text: &str, include_punctuation: bool) -> Vec<TokenWithPosition> {
    let bytes = text.as_bytes();
    let mut out: Vec<TokenWithPosition> = Vec::new();

    let mut i: usize = 0;
    while i < bytes.len() {
        let b = bytes[i];

        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if is_word_byte(b) {
            let start = i;
            i += 1;
            while i < bytes.len() && is_word_byte(bytes[i]) {
                i += 1;
            }
            out.push(TokenWithPosition {
                text: text[start..i].to_string(),
                start,
                end: i,
            });
            continue;
        }

        if include_punctuation {
            let start = i;
            i += 1;
            out.push(TokenWithPosition {
                text: text[start..i].to_string(),
                start,
                end: i,
            });
            continue;
        }

        i += 1;
    }

    out
}

/// Returns the up-to-`window` tokens immediately before and after the byte
/// range `[start, end)`, in left-to-right order - the Span `window` field.
pub fn context_window(text: &str, start: usize, end: usize, window: usize) -> Vec<String> {
    let tokens = tokenize_with_positions(text, false);
    let before: Vec<String> = tokens
        .iter()
        .filter(|t| t.end <= start)
        .rev()
        .take(window)
        .map(|t| t.text.clone())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let after: Vec<String> = tokens
        .iter()
        .filter(|t| t.start >= end)
        .take(window)
        .map(|t| t.text.clone())
        .collect();

    let mut out = before;
    out.extend(after);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_words_only_by_default() {
        let tokens = tokenize_with_positions("Dr. Jordan examined Jordan Lake.", false);
        let words: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(words, vec!["Dr", "Jordan", "examined", "Jordan", "Lake"]);
    }

    #[test]
    fn context_window_picks_tokens_on_both_sides() {
        let text = "a b c TARGET d e f";
        let start = text.find("TARGET").unwrap();
        let end = start + "TARGET".len();
        let window = context_window(text, start, end, 2);
        assert_eq!(window, vec!["b", "c", "d", "e"]);
    }
}
