//! Vector Disambiguator (C6): resolves same-position ties between spans of
//! different `filterType` using hashed context-window vectors and cosine
//! similarity against a running-mean prototype per type.
//!
//! Grounded on the hashing/cache idioms already present in this crate's
//! fuzzy-matching and OCR-chaos utilities (bounded caches, deletion-neighbour
//! style indexing), generalised here into a small vector space model - there
//! is no teacher module for this component because the teacher never needed
//! same-position tie-breaking between independent detector families.

use crate::span::{FilterType, Span};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

const DEFAULT_DIMS: usize = 512;
const DEFAULT_MIN_CONFIDENCE: f64 = 0.3;
const DEFAULT_CACHE_SIZE: usize = 32;

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "of", "to", "in", "on", "at", "by", "for", "and", "or", "is", "was", "were",
    "be", "been", "with", "as", "that", "this",
];

/// A 32-bit mix function in the spirit of Murmur3's finalizer - cheap,
/// well-distributed, and deterministic across runs (required for P4).
fn murmur_like_hash(bytes: &[u8]) -> u32 {
    let mut h: u32 = 0x9747_b28c;
    for &b in bytes {
        h ^= b as u32;
        h = h.wrapping_mul(0x85eb_ca6b);
        h ^= h >> 13;
    }
    h ^= h >> 16;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

/// Builds an L2-normalised `dims`-coordinate vector from a stop-word-filtered
/// context window by hashing each surviving token into a coordinate index.
pub fn build_context_vector(window: &[String], dims: usize) -> Vec<f64> {
    let mut vector = vec![0.0f64; dims];
    for token in window {
        let lower = token.to_ascii_lowercase();
        if lower.is_empty() || STOP_WORDS.contains(&lower.as_str()) {
            continue;
        }
        let idx = (murmur_like_hash(lower.as_bytes()) as usize) % dims;
        vector[idx] += 1.0;
    }

    let norm: f64 = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
    vector
}

fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|v| v * v).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

struct PrototypeState {
    /// Bounded history of confirmed context vectors per type; the prototype
    /// is their running mean.
    history: HashMap<FilterType, VecDeque<Vec<f64>>>,
}

/// Disambiguates spans that share an identical `[start, end)` range. Holds
/// the read-shared, single-writer prototype cache described in the
/// concurrency model: reads take a snapshot copy, writes go through the same
/// lock (the teacher's codebase has no equivalent mutable global that isn't
/// guarded the same way, e.g. the OCR chaos analysis cache).
pub struct VectorDisambiguator {
    dims: usize,
    min_confidence: f64,
    cache_size: usize,
    prototypes: Mutex<PrototypeState>,
}

pub struct Decision {
    /// Index into the candidate slice passed to `resolve`.
    pub winner: Option<usize>,
    pub score: f64,
}

impl VectorDisambiguator {
    pub fn new() -> Self {
        Self::with_params(DEFAULT_DIMS, DEFAULT_MIN_CONFIDENCE, DEFAULT_CACHE_SIZE)
    }

    pub fn with_params(dims: usize, min_confidence: f64, cache_size: usize) -> Self {
        VectorDisambiguator {
            dims,
            min_confidence,
            cache_size,
            prototypes: Mutex::new(PrototypeState { history: HashMap::new() }),
        }
    }

    fn prototype_for(&self, filter_type: FilterType) -> Option<Vec<f64>> {
        let state = self.prototypes.lock().unwrap();
        let history = state.history.get(&filter_type)?;
        if history.is_empty() {
            return None;
        }
        let mut mean = vec![0.0f64; self.dims];
        for vector in history.iter() {
            for (m, v) in mean.iter_mut().zip(vector.iter()) {
                *m += v;
            }
        }
        let n = history.len() as f64;
        for m in mean.iter_mut() {
            *m /= n;
        }
        Some(mean)
    }

    /// Records `vector` as a confirmed observation for `filter_type`,
    /// trimming the history to the `cache_size` most recent entries.
    pub fn confirm(&self, filter_type: FilterType, vector: Vec<f64>) {
        let mut state = self.prototypes.lock().unwrap();
        let history = state.history.entry(filter_type).or_default();
        history.push_back(vector);
        while history.len() > self.cache_size {
            history.pop_front();
        }
    }

    /// Picks the winning candidate among `candidates`, all of which must
    /// share the same `[start, end)` range. Each candidate's context vector
    /// is compared against its type's prototype by cosine similarity; the
    /// type with the highest similarity wins. If the winning similarity is
    /// below `min_confidence`, or every candidate's vector is zero (no
    /// prototype history, empty window after stop-word filtering), or two
    /// candidates are otherwise indistinguishable, ties go to the candidate
    /// with the highest `priority`.
    pub fn resolve(&self, candidates: &[&Span]) -> Decision {
        if candidates.is_empty() {
            return Decision { winner: None, score: 0.0 };
        }
        if candidates.len() == 1 {
            return Decision { winner: Some(0), score: 1.0 };
        }

        let mut best_idx: Option<usize> = None;
        let mut best_score = f64::MIN;
        let mut any_prototype_signal = false;

        for (i, span) in candidates.iter().enumerate() {
            let vector = build_context_vector(&span.window, self.dims);
            let score = match self.prototype_for(span.filter_type) {
                Some(prototype) => {
                    any_prototype_signal = true;
                    cosine_similarity(&vector, &prototype)
                }
                None => 0.0,
            };
            if score > best_score {
                best_score = score;
                best_idx = Some(i);
            }
        }

        if best_score < self.min_confidence {
            if !any_prototype_signal {
                // Genuine edge case: nothing has a prototype yet, so there is
                // no signal at all to distinguish the candidates - fall back
                // to highest priority rather than dropping every span.
                let fallback = candidates
                    .iter()
                    .enumerate()
                    .max_by_key(|(_, s)| s.priority)
                    .map(|(i, _)| i);
                return Decision {
                    winner: fallback,
                    score: best_score,
                };
            }

            // Prototype signal exists but every candidate still scored below
            // the confidence floor: this is a genuinely ambiguous position,
            // not a signal-free one. Drop all candidates rather than guess.
            return Decision { winner: None, score: best_score };
        }

        Decision {
            winner: best_idx,
            score: best_score,
        }
    }
}

impl Default for VectorDisambiguator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::FilterType;

    fn candidate(filter_type: FilterType, window: &[&str]) -> Span {
        let mut s = Span::new(10, 16, "Jordan", filter_type, 0.8, "test");
        s.window = window.iter().map(|w| w.to_string()).collect();
        s
    }

    #[test]
    fn single_candidate_wins_trivially() {
        let disambiguator = VectorDisambiguator::new();
        let span = candidate(FilterType::Name, &["examined", "patient"]);
        let refs = vec![&span];
        let decision = disambiguator.resolve(&refs);
        assert_eq!(decision.winner, Some(0));
    }

    #[test]
    fn no_prototype_history_falls_back_to_priority() {
        let disambiguator = VectorDisambiguator::new();
        let low = candidate(FilterType::Occupation, &["a", "b"]);
        let high = candidate(FilterType::Name, &["a", "b"]);
        let refs = vec![&low, &high];
        let decision = disambiguator.resolve(&refs);
        assert_eq!(decision.winner, Some(1));
    }

    #[test]
    fn matching_prototype_outscores_unrelated_type() {
        let disambiguator = VectorDisambiguator::new();
        let provider_window = vec!["dr".to_string(), "examined".to_string(), "patient".to_string()];
        disambiguator.confirm(FilterType::ProviderName, build_context_vector(&provider_window, DEFAULT_DIMS));

        let provider_candidate = candidate(FilterType::ProviderName, &["dr", "examined", "patient"]);
        let name_candidate = candidate(FilterType::Name, &["lake", "near", "shore"]);
        let refs = vec![&provider_candidate, &name_candidate];
        let decision = disambiguator.resolve(&refs);
        assert_eq!(decision.winner, Some(0));
        assert!(decision.score >= DEFAULT_MIN_CONFIDENCE);
    }

    #[test]
    fn low_confidence_with_prototype_signal_drops_all_candidates() {
        let disambiguator = VectorDisambiguator::new();
        let provider_window = vec!["dr".to_string(), "examined".to_string(), "patient".to_string()];
        disambiguator.confirm(FilterType::ProviderName, build_context_vector(&provider_window, DEFAULT_DIMS));

        // Unrelated context: the ProviderName candidate has a prototype to
        // compare against but scores far below it, and the Name candidate
        // has no prototype at all. There IS signal (ProviderName matched
        // against something), so this must not be treated as the "no
        // signal whatsoever" carve-out - both candidates should be dropped.
        let provider_candidate = candidate(FilterType::ProviderName, &["lake", "near", "shore"]);
        let name_candidate = candidate(FilterType::Name, &["lake", "near", "shore"]);
        let refs = vec![&provider_candidate, &name_candidate];
        let decision = disambiguator.resolve(&refs);
        assert_eq!(decision.winner, None);
    }

    #[test]
    fn murmur_like_hash_is_deterministic() {
        assert_eq!(murmur_like_hash(b"jordan"), murmur_like_hash(b"jordan"));
    }
}
