//! Augmented interval tree for O((n+k) log n) span overlap queries.
//!
//! This is the Span Index (C4): it answers "what already-kept spans overlap
//! this candidate" for the overlap resolver (C5, see `span.rs`) and groups
//! same-position candidates for the vector disambiguator (C6, see
//! `disambiguate.rs`). It does not itself decide which span wins; composite
//! scoring lives in `span.rs`.

use crate::span::Span;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Clone, Debug)]
struct StoredSpan {
    key: String,
    start: u32,
    end: u32,
    filter_type: &'static str,
    confidence: f64,
    priority: u32,
    text: String,
}

#[derive(Clone, Debug)]
struct IntervalNode {
    start: u32,
    end: u32,
    max_end: u32,
    spans: Vec<StoredSpan>,
    left: Option<Box<IntervalNode>>,
    right: Option<Box<IntervalNode>>,
}

impl IntervalNode {
    fn new(start: u32, end: u32, span: StoredSpan) -> Self {
        IntervalNode {
            start,
            end,
            max_end: end,
            spans: vec![span],
            left: None,
            right: None,
        }
    }

    fn update_max(&mut self) {
        self.max_end = self.end;
        if let Some(ref left) = self.left {
            self.max_end = self.max_end.max(left.max_end);
        }
        if let Some(ref right) = self.right {
            self.max_end = self.max_end.max(right.max_end);
        }
    }

    fn insert(&mut self, start: u32, end: u32, span: StoredSpan) {
        if start == self.start && end == self.end {
            self.spans.push(span);
            return;
        }

        if start < self.start || (start == self.start && end < self.end) {
            if let Some(ref mut left) = self.left {
                left.insert(start, end, span);
            } else {
                self.left = Some(Box::new(IntervalNode::new(start, end, span)));
            }
        } else if let Some(ref mut right) = self.right {
            right.insert(start, end, span);
        } else {
            self.right = Some(Box::new(IntervalNode::new(start, end, span)));
        }

        self.update_max();
    }

    fn find_overlaps(&self, query_start: u32, query_end: u32, results: &mut Vec<StoredSpan>) {
        if self.start < query_end && self.end > query_start {
            results.extend(self.spans.iter().cloned());
        }

        if let Some(ref left) = self.left {
            if left.max_end > query_start {
                left.find_overlaps(query_start, query_end, results);
            }
        }

        if let Some(ref right) = self.right {
            if query_end > self.start {
                right.find_overlaps(query_start, query_end, results);
            }
        }
    }

    fn remove(&mut self, start: u32, end: u32, key: &str) -> bool {
        if start == self.start && end == self.end {
            let initial_len = self.spans.len();
            self.spans.retain(|s| s.key != key);
            return self.spans.len() < initial_len;
        }

        let removed = if start < self.start || (start == self.start && end < self.end) {
            self.left.as_mut().map_or(false, |left| left.remove(start, end, key))
        } else {
            self.right.as_mut().map_or(false, |right| right.remove(start, end, key))
        };

        if removed {
            self.update_max();
        }
        removed
    }
}

struct IntervalTreeState {
    root: Option<IntervalNode>,
    span_map: HashMap<String, StoredSpan>,
    size: usize,
}

impl IntervalTreeState {
    fn new() -> Self {
        IntervalTreeState {
            root: None,
            span_map: HashMap::new(),
            size: 0,
        }
    }
}

/// Insert/query index over the current candidate span set. O(log n) insert
/// and remove, O(log n + k) overlap queries.
pub struct SpanIntervalTree {
    state: Mutex<IntervalTreeState>,
}

fn generate_key(span: &Span) -> String {
    format!("{}-{}-{}-{}", span.start, span.end, span.filter_type.as_str(), span.text)
}

impl SpanIntervalTree {
    pub fn new() -> Self {
        SpanIntervalTree {
            state: Mutex::new(IntervalTreeState::new()),
        }
    }

    pub fn insert(&self, span: &Span) -> String {
        let key = generate_key(span);
        let stored = StoredSpan {
            key: key.clone(),
            start: span.start,
            end: span.end,
            filter_type: span.filter_type.as_str(),
            confidence: span.confidence,
            priority: span.priority,
            text: span.text.clone(),
        };

        let mut state = self.state.lock().unwrap();
        state.span_map.insert(key.clone(), stored.clone());
        if let Some(ref mut root) = state.root {
            root.insert(stored.start, stored.end, stored);
        } else {
            state.root = Some(IntervalNode::new(stored.start, stored.end, stored));
        }
        state.size += 1;
        key
    }

    pub fn insert_all(&self, spans: &[Span]) {
        for span in spans {
            self.insert(span);
        }
    }

    /// Returns `(start, end, filter_type, confidence, priority, text)` tuples
    /// for every distinct span overlapping `[start, end)`.
    pub fn find_overlaps(&self, start: u32, end: u32) -> Vec<(u32, u32, &'static str, f64, u32, String)> {
        let state = self.state.lock().unwrap();
        let mut results: Vec<StoredSpan> = Vec::new();
        if let Some(ref root) = state.root {
            root.find_overlaps(start, end, &mut results);
        }
        let mut seen: HashSet<String> = HashSet::new();
        results
            .into_iter()
            .filter(|s| seen.insert(s.key.clone()))
            .map(|s| (s.start, s.end, s.filter_type, s.confidence, s.priority, s.text))
            .collect()
    }

    pub fn has_overlap(&self, start: u32, end: u32) -> bool {
        !self.find_overlaps(start, end).is_empty()
    }

    pub fn remove(&self, span: &Span) -> bool {
        self.remove_by_key(&generate_key(span))
    }

    pub fn remove_by_key(&self, key: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        if let Some(stored) = state.span_map.remove(key) {
            if let Some(ref mut root) = state.root {
                root.remove(stored.start, stored.end, key);
            }
            state.size -= 1;
            return true;
        }
        false
    }

    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        state.root = None;
        state.span_map.clear();
        state.size = 0;
    }

    pub fn size(&self) -> usize {
        self.state.lock().unwrap().size
    }

    pub fn has(&self, span: &Span) -> bool {
        self.state.lock().unwrap().span_map.contains_key(&generate_key(span))
    }
}

impl Default for SpanIntervalTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Groups spans sharing an identical `[start, end)` range - the precondition
/// for the vector disambiguator (C6) to engage on a set of candidates.
pub fn identical_span_groups(spans: &[Span]) -> Vec<Vec<usize>> {
    let mut groups: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
    for (idx, span) in spans.iter().enumerate() {
        groups.entry((span.start, span.end)).or_default().push(idx);
    }
    groups.into_values().filter(|g| g.len() > 1).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::FilterType;

    fn make_span(start: u32, end: u32, filter_type: FilterType, text: &str) -> Span {
        Span::new(start, end, text, filter_type, 0.9, "test")
    }

    #[test]
    fn insert_and_size() {
        let tree = SpanIntervalTree::new();
        assert_eq!(tree.size(), 0);
        tree.insert(&make_span(0, 10, FilterType::Name, "John"));
        assert_eq!(tree.size(), 1);
        tree.insert(&make_span(20, 30, FilterType::Email, "test@example.com"));
        assert_eq!(tree.size(), 2);
    }

    #[test]
    fn find_overlaps_returns_only_overlapping() {
        let tree = SpanIntervalTree::new();
        tree.insert(&make_span(0, 10, FilterType::Name, "John"));
        tree.insert(&make_span(20, 30, FilterType::Email, "test@example.com"));
        tree.insert(&make_span(5, 15, FilterType::Phone, "555-1234"));

        assert_eq!(tree.find_overlaps(8, 12).len(), 2);

        let hits = tree.find_overlaps(25, 35);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].2, "EMAIL");

        assert_eq!(tree.find_overlaps(40, 50).len(), 0);
    }

    #[test]
    fn has_overlap() {
        let tree = SpanIntervalTree::new();
        tree.insert(&make_span(0, 10, FilterType::Name, "John"));
        assert!(tree.has_overlap(5, 15));
        assert!(!tree.has_overlap(20, 30));
    }

    #[test]
    fn remove_then_not_found() {
        let tree = SpanIntervalTree::new();
        let span = make_span(0, 10, FilterType::Name, "John");
        tree.insert(&span);
        assert_eq!(tree.size(), 1);
        assert!(tree.remove(&span));
        assert_eq!(tree.size(), 0);
        assert!(!tree.remove(&span));
    }

    #[test]
    fn clear_empties_tree() {
        let tree = SpanIntervalTree::new();
        tree.insert(&make_span(0, 10, FilterType::Name, "John"));
        tree.insert(&make_span(20, 30, FilterType::Email, "test@example.com"));
        tree.clear();
        assert_eq!(tree.size(), 0);
    }

    #[test]
    fn identical_position_groups_detected() {
        let spans = vec![
            make_span(0, 10, FilterType::Phone, "555-1234"),
            make_span(0, 10, FilterType::Ssn, "555123456"),
            make_span(20, 25, FilterType::Name, "Jordan"),
        ];
        let groups = identical_span_groups(&spans);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }
}
