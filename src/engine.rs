//! Parallel Engine (C7): fans the filter set out across the same input text,
//! joins results, and drives them through C3 (postfilter) -> C6
//! (disambiguation) -> C4/C5 (span index + overlap resolution) -> C8
//! (tokenisation).
//!
//! The state machine is `Init -> PolicyReady -> Detecting -> Resolving ->
//! Tokenizing -> Done`, with an unrecoverable internal error short-circuiting
//! to an empty token map and the original text rather than ever returning a
//! half-redacted document.

use crate::crypto::sha256_hex_string;
use crate::dictionary::Vocabulary;
use crate::disambiguate::{build_context_vector, VectorDisambiguator};
use crate::error::{RedactionError, RedactionResult};
use crate::interval::identical_span_groups;
use crate::name::NameDetection;
use crate::policy::Policy;
use crate::postfilter::{postfilter_decisions, PostFilterSpan};
use crate::scan;
use crate::scorer::{ScoringWeights, SpanInput, VulpesPHIScorer};
use crate::span::{drop_overlapping_spans, FilterType, Span};
use crate::token::{apply_tokens, reinsert, Session};
use crate::tokenize;
use crate::zipcode::population_guard_skip;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Init,
    PolicyReady,
    Detecting,
    Resolving,
    Tokenizing,
    Done,
    Failed,
}

/// Cooperative cancellation handle for a single `redact` call (§5
/// "Cancellation"). Checked at the safe points between pipeline stages -
/// never mid-filter - so a cancelled request always discards partial state
/// rather than returning a half-redacted document. Cloning shares the same
/// underlying flag, so a caller can hold one end and pass the other into
/// `redact_cancellable`.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct FilterTiming {
    pub filter: String,
    pub duration_ms: u64,
    pub overrun: bool,
}

#[derive(Debug, Clone)]
pub struct RedactionStats {
    pub execution_time_ms: u64,
    pub redaction_count: usize,
    pub breakdown: HashMap<String, usize>,
    pub filter_timings: Vec<FilterTiming>,
    /// SHA-256 hex digest of the input text, handed to the optional
    /// provenance hook rather than the text itself.
    pub fingerprint: String,
}

/// The result of a single `redact` call. `error` is populated only when this
/// outcome was produced by `process_batch` recovering from a per-document
/// failure - in that case `text` is the untouched original and `tokens` is
/// empty.
#[derive(Debug, Clone)]
pub struct RedactionOutcome {
    pub text: String,
    pub tokens: HashMap<String, String>,
    pub spans: Vec<Span>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RedactionDetails {
    pub outcome: RedactionOutcome,
    pub stats: RedactionStats,
}

#[derive(Debug, Clone)]
pub struct RestoreOutcome {
    pub text: String,
    pub restored_count: usize,
}

#[derive(Debug, Clone)]
pub struct BatchStats {
    pub documents: usize,
    pub failed: usize,
    pub total_spans: usize,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub results: Vec<RedactionOutcome>,
    pub stats: BatchStats,
}

enum FamilyOutcome<T> {
    Ok(T, u64),
    TimedOut(u64),
    Failed,
}

async fn run_family<T, F>(timeout_ms: u64, f: F) -> FamilyOutcome<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let start = Instant::now();
    let handle = tokio::task::spawn_blocking(move || std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)));

    match tokio::time::timeout(Duration::from_millis(timeout_ms.max(1)), handle).await {
        Ok(Ok(Ok(value))) => FamilyOutcome::Ok(value, start.elapsed().as_millis() as u64),
        Ok(Ok(Err(_panic))) => FamilyOutcome::Failed,
        Ok(Err(_join_err)) => FamilyOutcome::Failed,
        Err(_elapsed) => FamilyOutcome::TimedOut(start.elapsed().as_millis() as u64),
    }
}

/// Runs the three name sub-scanners (C2 "dictionary + context filters", name
/// family) and deduplicates their output by span range, keeping the
/// highest-confidence detection - the same rule each sub-scanner already
/// applies internally.
fn run_name_family(text: &str, vocabulary: &Vocabulary) -> Vec<NameDetection> {
    let scanner = vocabulary.name_scanner();
    let (last_first, (first_last, smart)) = rayon::join(
        || scanner.detect_last_first(text.to_string()),
        || rayon::join(|| scanner.detect_first_last(text.to_string()), || scanner.detect_smart(text.to_string())),
    );
    let mut all = last_first;
    all.extend(first_last);
    all.extend(smart);

    dedupe_name_detections(all)
}

/// Clinical-title/role-context name candidates (PROVIDER_NAME, §4.2), run as
/// its own filter so it gets its own timing/failure isolation rather than
/// riding along with the NAME family.
fn run_provider_name_family(text: &str, vocabulary: &Vocabulary) -> Vec<NameDetection> {
    let scanner = vocabulary.name_scanner();
    dedupe_name_detections(scanner.detect_provider(text.to_string()))
}

fn dedupe_name_detections(detections: Vec<NameDetection>) -> Vec<NameDetection> {
    let mut best: HashMap<u64, NameDetection> = HashMap::new();
    for d in detections {
        let key = ((d.character_start as u64) << 32) | (d.character_end as u64);
        match best.get(&key) {
            None => {
                best.insert(key, d);
            }
            Some(existing) => {
                if d.confidence > existing.confidence {
                    best.insert(key, d);
                }
            }
        }
    }
    let mut out: Vec<NameDetection> = best.into_values().collect();
    out.sort_by_key(|d| d.character_start);
    out
}

type ScanFn = fn(&str) -> Vec<scan::IdentifierDetection>;

/// One entry per regex-backed filter (C2), each run as its own task in
/// `detect()` so a single detector's panic or timeout only ever discards
/// that detector's spans, and `FilterTiming` carries a real per-filter name.
const FILTER_REGISTRY: &[(&str, ScanFn)] = &[
    ("EMAIL", scan::scan_email),
    ("IP", scan::scan_ip),
    ("URL", scan::scan_url),
    ("PHONE", scan::scan_phone),
    ("SSN", scan::scan_ssn),
    ("NPI", scan::scan_npi),
    ("ZIPCODE", scan::scan_zipcode),
    ("FAX", scan::scan_fax),
    ("MRN", scan::scan_mrn),
    ("DEA", scan::scan_dea),
    ("CREDITCARD", scan::scan_creditcard),
    ("ACCOUNT", scan::scan_account),
    ("LICENSE", scan::scan_license),
    ("HEALTHPLAN", scan::scan_healthplan),
    ("PASSPORT", scan::scan_passport),
    ("DATE", scan::scan_date),
    ("ADDRESS", scan::scan_address),
    ("VEHICLE", scan::scan_vehicle),
    ("MAC_ADDRESS", scan::scan_mac),
    ("BITCOIN", scan::scan_bitcoin),
    ("IBAN", scan::scan_iban),
    ("DEVICE", scan::scan_device),
    ("UNIQUE_ID", scan::scan_unique_id),
    ("AGE", scan::scan_age),
    ("BIOMETRIC", scan::scan_biometric),
    ("RELATIVE_DATE", scan::scan_relative_date),
    ("HOSPITAL", scan::scan_hospital),
];

fn convert_identifier(d: scan::IdentifierDetection) -> Option<Span> {
    let ft = FilterType::from_str_lenient(&d.filter_type)?;
    Some(Span::new(d.character_start, d.character_end, d.text, ft, d.confidence, d.pattern))
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

/// One successful redaction's provenance, handed to the optional hook
/// registered via `with_provenance_hook`. Only hashes and the final span set
/// travel through this callback - never the raw text.
#[derive(Debug, Clone)]
pub struct ProvenanceEvent {
    pub original_hash: String,
    pub redacted_hash: String,
    pub manifest_hash: String,
    pub spans: Vec<Span>,
}

pub type ProvenanceHook = Arc<dyn Fn(&ProvenanceEvent) + Send + Sync>;

/// Pre- and post-filter transformations an external collaborator may plug
/// into the pipeline (§6 "Plugin hook"): `pre_filter` sees the text before
/// any detector runs, `post_filter` sees the fully resolved span set before
/// tokenization. Both default to the identity transform so a plugin can
/// implement only the stage it cares about. A plugin that exceeds its
/// timeout or panics is disabled for the remainder of the request that
/// tripped it - not engine-wide, since the engine outlives any one request.
pub trait FilterPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn pre_filter(&self, text: &str) -> String {
        text.to_string()
    }
    fn post_filter(&self, spans: Vec<Span>) -> Vec<Span> {
        spans
    }
}

const DEFAULT_PLUGIN_TIMEOUT_MS: u64 = 50;

/// Owns the long-lived, read-shared state a session's redaction calls draw
/// on: the loaded vocabulary, the name-confidence scorer, and the C6
/// prototype cache. None of this is mutated per-request except through the
/// single-writer paths each component already exposes.
pub struct RedactionEngine {
    vocabulary: Arc<Vocabulary>,
    disambiguator: VectorDisambiguator,
    name_scorer: VulpesPHIScorer,
    plugins: Vec<Arc<dyn FilterPlugin>>,
    plugin_timeout_ms: u64,
    provenance_hook: Option<ProvenanceHook>,
}

impl RedactionEngine {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        RedactionEngine {
            vocabulary,
            disambiguator: VectorDisambiguator::new(),
            name_scorer: VulpesPHIScorer::new(Some(ScoringWeights::default()), Some(0.5)),
            plugins: Vec::new(),
            plugin_timeout_ms: DEFAULT_PLUGIN_TIMEOUT_MS,
            provenance_hook: None,
        }
    }

    /// Registers pre-/post-filter plugins, each subject to `timeout_ms`
    /// (falls back to a 50ms default when `None`, mirroring the filter
    /// soft-deadline default in `Policy`).
    pub fn with_plugins(mut self, plugins: Vec<Arc<dyn FilterPlugin>>, timeout_ms: Option<u64>) -> Self {
        self.plugins = plugins;
        if let Some(ms) = timeout_ms {
            self.plugin_timeout_ms = ms.max(1);
        }
        self
    }

    /// Registers the provenance callback invoked once per successful
    /// redaction; a panicking hook is caught and ignored (errors swallowed).
    pub fn with_provenance_hook(mut self, hook: ProvenanceHook) -> Self {
        self.provenance_hook = Some(hook);
        self
    }

    /// `redact(text, policy) -> { redactedText, spans, tokenMap, stats }`.
    pub async fn redact(&self, text: &str, policy: &Arc<Policy>, salt: &str) -> RedactionResult<RedactionOutcome> {
        Ok(self.redact_with_details(text, policy, salt).await?.outcome)
    }

    /// `redactWithDetails`: same as `redact`, plus per-filter timings and a
    /// breakdown of the kept span count per `filterType`. Never itself
    /// cancellable - callers who need §5 cancellation should call
    /// `redact_with_details_cancellable` with their own `CancellationToken`.
    pub async fn redact_with_details(&self, text: &str, policy: &Arc<Policy>, salt: &str) -> RedactionResult<RedactionDetails> {
        self.redact_with_details_cancellable(text, policy, salt, &CancellationToken::new()).await
    }

    /// Same contract as `redact_with_details`, but checked against `cancel`
    /// at each safe point between pipeline stages (§5 "Cancellation"): a
    /// request cancelled between filters discards whatever partial spans,
    /// timings, or plugin state it had accumulated and returns
    /// `RedactionError::Cancelled` rather than completing.
    pub async fn redact_with_details_cancellable(
        &self,
        text: &str,
        policy: &Arc<Policy>,
        salt: &str,
        cancel: &CancellationToken,
    ) -> RedactionResult<RedactionDetails> {
        let mut state = EngineState::Init;
        policy.validate()?;
        state = EngineState::PolicyReady;

        if cancel.is_cancelled() {
            return Err(RedactionError::Cancelled);
        }

        let started = Instant::now();
        let original_hash = sha256_hex_string(text);

        let mut plugin_disabled = vec![false; self.plugins.len()];
        let text_owned = self.run_pre_filter_plugins(text, &mut plugin_disabled).await;
        let text: &str = &text_owned;

        state = EngineState::Detecting;
        let (mut spans, filter_timings) = self.detect(text, policy).await;

        if cancel.is_cancelled() {
            return Err(RedactionError::Cancelled);
        }

        self.apply_zipcode_population_guard(&mut spans, policy);

        let byte_map = build_utf16_to_byte_map(text);
        for span in spans.iter_mut() {
            let start_b = utf16_to_byte(&byte_map, span.start);
            let end_b = utf16_to_byte(&byte_map, span.end).max(start_b);
            span.window = tokenize::context_window(text, start_b, end_b, 5);
        }

        self.refine_name_confidence(&mut spans, text, &byte_map);

        spans.retain(|s| policy.is_enabled(s.filter_type) && s.confidence >= policy.min_confidence_for(s.filter_type));

        state = EngineState::Resolving;
        let spans = self.apply_postfilter(spans);
        let spans = self.disambiguate(spans);

        let kept = drop_overlapping_spans(&spans);
        let mut final_spans: Vec<Span> = kept.into_iter().map(|i| spans[i].clone()).collect();
        final_spans.sort_by_key(|s| s.start);

        final_spans = self.run_post_filter_plugins(final_spans, &mut plugin_disabled).await;

        if cancel.is_cancelled() {
            return Err(RedactionError::Cancelled);
        }

        state = EngineState::Tokenizing;
        let mut session = Session::new(salt);
        let redacted_text = apply_tokens(text, &final_spans, policy, &mut session);
        let token_map = session.into_token_map();
        state = EngineState::Done;
        debug_assert_eq!(state, EngineState::Done);

        let mut breakdown: HashMap<String, usize> = HashMap::new();
        for s in &final_spans {
            *breakdown.entry(s.filter_type.as_str().to_string()).or_insert(0) += 1;
        }

        if let Some(hook) = &self.provenance_hook {
            let event = ProvenanceEvent {
                original_hash: original_hash.clone(),
                redacted_hash: sha256_hex_string(&redacted_text),
                manifest_hash: sha256_hex_string(&format!("{}:{}", final_spans.len(), salt)),
                spans: final_spans.clone(),
            };
            let hook = Arc::clone(hook);
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| hook(&event)));
        }

        Ok(RedactionDetails {
            outcome: RedactionOutcome {
                text: redacted_text,
                tokens: token_map,
                spans: final_spans.clone(),
                error: None,
            },
            stats: RedactionStats {
                execution_time_ms: started.elapsed().as_millis() as u64,
                redaction_count: final_spans.len(),
                breakdown,
                filter_timings,
                fingerprint: original_hash,
            },
        })
    }

    async fn run_pre_filter_plugins(&self, text: &str, disabled: &mut [bool]) -> String {
        let mut working = text.to_string();
        for (i, plugin) in self.plugins.iter().enumerate() {
            if disabled[i] {
                continue;
            }
            let plugin = Arc::clone(plugin);
            let input = working.clone();
            match run_family(self.plugin_timeout_ms, move || plugin.pre_filter(&input)).await {
                FamilyOutcome::Ok(out, _) => working = out,
                FamilyOutcome::TimedOut(_) | FamilyOutcome::Failed => disabled[i] = true,
            }
        }
        working
    }

    async fn run_post_filter_plugins(&self, spans: Vec<Span>, disabled: &mut [bool]) -> Vec<Span> {
        let mut working = spans;
        for (i, plugin) in self.plugins.iter().enumerate() {
            if disabled[i] {
                continue;
            }
            let plugin = Arc::clone(plugin);
            let input = working.clone();
            match run_family(self.plugin_timeout_ms, move || plugin.post_filter(input)).await {
                FamilyOutcome::Ok(out, _) => working = out,
                FamilyOutcome::TimedOut(_) | FamilyOutcome::Failed => disabled[i] = true,
            }
        }
        working
    }

    /// `restore(responseText, tokenMap) -> { text, restoredCount }`. Never
    /// fails: a reinsertion miss just leaves the token verbatim.
    pub fn restore(&self, response_text: &str, token_map: &HashMap<String, String>) -> RestoreOutcome {
        let (text, restored_count) = reinsert(response_text, token_map);
        RestoreOutcome { text, restored_count }
    }

    /// `processBatch(texts, config) -> { results[], stats }`. A document
    /// that errors is recorded with its original text, an empty token map,
    /// and the error's `Display` string; the batch continues regardless.
    pub async fn process_batch(&self, texts: &[String], policy: &Arc<Policy>, salt_for: impl Fn(usize) -> String) -> BatchOutcome {
        let batch_size = policy.batch_size.max(1);
        let mut results = Vec::with_capacity(texts.len());
        let mut failed = 0usize;
        let mut total_spans = 0usize;

        for chunk in texts.chunks(batch_size) {
            for (offset, text) in chunk.iter().enumerate() {
                let idx = results.len() + offset;
                let salt = salt_for(idx);
                match self.redact(text, policy, &salt).await {
                    Ok(outcome) => {
                        total_spans += outcome.spans.len();
                        results.push(outcome);
                    }
                    Err(e) => {
                        failed += 1;
                        results.push(RedactionOutcome {
                            text: text.clone(),
                            tokens: HashMap::new(),
                            spans: Vec::new(),
                            error: Some(e.to_string()),
                        });
                    }
                }
            }
        }

        BatchOutcome {
            stats: BatchStats {
                documents: results.len(),
                failed,
                total_spans,
            },
            results,
        }
    }

    /// Creates one task per enabled detector (§5) and joins the results: a
    /// detector that panics or overruns `policy.filterTimeoutMs` only drops
    /// its own spans, and `filter_timings` carries one entry per filter
    /// rather than a couple of coarse buckets.
    async fn detect(&self, text: &str, policy: &Arc<Policy>) -> (Vec<Span>, Vec<FilterTiming>) {
        let timeout_ms = policy.filter_timeout_ms;
        let mut join_set: tokio::task::JoinSet<(&'static str, FamilyOutcome<Vec<Span>>)> = tokio::task::JoinSet::new();

        for &(name, scan_fn) in FILTER_REGISTRY {
            let t = text.to_string();
            join_set.spawn(async move {
                let outcome =
                    run_family(timeout_ms, move || scan_fn(&t).into_iter().filter_map(convert_identifier).collect::<Vec<Span>>())
                        .await;
                (name, outcome)
            });
        }

        {
            let t = text.to_string();
            let vocabulary = Arc::clone(&self.vocabulary);
            join_set.spawn(async move {
                let outcome = run_family(timeout_ms, move || {
                    run_name_family(&t, &vocabulary)
                        .into_iter()
                        .map(|d| Span::new(d.character_start, d.character_end, d.text, FilterType::Name, d.confidence, d.pattern))
                        .collect::<Vec<Span>>()
                })
                .await;
                ("NAME", outcome)
            });
        }

        {
            let t = text.to_string();
            let vocabulary = Arc::clone(&self.vocabulary);
            join_set.spawn(async move {
                let outcome = run_family(timeout_ms, move || {
                    run_provider_name_family(&t, &vocabulary)
                        .into_iter()
                        .map(|d| Span::new(d.character_start, d.character_end, d.text, FilterType::ProviderName, d.confidence, d.pattern))
                        .collect::<Vec<Span>>()
                })
                .await;
                ("PROVIDER_NAME", outcome)
            });
        }

        let mut spans = Vec::new();
        let mut timings = Vec::new();

        while let Some(joined) = join_set.join_next().await {
            let (name, outcome) = match joined {
                Ok(v) => v,
                Err(_join_err) => continue,
            };
            match outcome {
                FamilyOutcome::Ok(mut detected, ms) => {
                    timings.push(FilterTiming { filter: name.to_string(), duration_ms: ms, overrun: false });
                    spans.append(&mut detected);
                }
                FamilyOutcome::TimedOut(ms) => {
                    timings.push(FilterTiming { filter: name.to_string(), duration_ms: ms, overrun: true });
                }
                FamilyOutcome::Failed => {
                    timings.push(FilterTiming { filter: name.to_string(), duration_ms: 0, overrun: true });
                }
            }
        }

        timings.sort_by(|a, b| a.filter.cmp(&b.filter));
        spans.sort_by_key(|s| s.start);
        (spans, timings)
    }

    /// Refines NAME-span confidence with the ensemble scorer (a wider
    /// context window than the detector itself sees), dropping spans the
    /// scorer recommends as NOT_PHI.
    fn refine_name_confidence(&self, spans: &mut Vec<Span>, text: &str, byte_map: &[(u32, usize)]) {
        spans.retain_mut(|span| {
            if span.filter_type != FilterType::Name {
                return true;
            }

            let start_b = utf16_to_byte(byte_map, span.start).saturating_sub(80);
            let end_b = (utf16_to_byte(byte_map, span.end) + 80).min(text.len());
            let start_b = text.floor_char_boundary_lenient(start_b);
            let end_b = text.floor_char_boundary_lenient(end_b);
            let context = if start_b < end_b { &text[start_b..end_b] } else { "" };

            let input = SpanInput {
                text: span.text.clone(),
                filter_type: span.filter_type.as_str().to_string(),
                confidence: span.confidence,
                pattern: Some(span.pattern.clone()),
                character_start: span.start,
                character_end: span.end,
            };
            let result = self.name_scorer.score(input, context.to_string());
            span.confidence = result.final_score;
            result.recommendation != "NOT_PHI"
        });
    }

    /// §4.8 `zipcode.strictSafeHarbor`: narrows a detected ZIPCODE span to
    /// just the portion past the disclosable three-digit prefix when that
    /// prefix's population exceeds the Safe-Harbor threshold, dropping the
    /// span entirely once nothing PHI-bearing remains.
    fn apply_zipcode_population_guard(&self, spans: &mut Vec<Span>, policy: &Policy) {
        let strict = policy.zipcode.strict_safe_harbor;
        spans.retain_mut(|span| {
            if span.filter_type != FilterType::Zipcode {
                return true;
            }
            match population_guard_skip(&span.text, strict) {
                None => true,
                Some(skip) => {
                    let skip = skip as u32;
                    if skip >= span.len() {
                        false
                    } else {
                        span.start += skip;
                        span.text = span.text[skip as usize..].to_string();
                        true
                    }
                }
            }
        });
    }

    /// C3: the field-label whitelist. Dictionary+context spans (NAME,
    /// PROVIDER_NAME, ADDRESS, CITY, STATE, COUNTY, HOSPITAL, OCCUPATION)
    /// are checked against section headings, structure words, medical
    /// phrases, and field labels; pattern-matched identifier spans pass
    /// through unchanged (see `postfilter::should_keep`).
    fn apply_postfilter(&self, spans: Vec<Span>) -> Vec<Span> {
        let inputs: Vec<PostFilterSpan> = spans
            .iter()
            .map(|s| PostFilterSpan {
                filter_type: s.filter_type.as_str().to_string(),
                text: s.text.clone(),
                confidence: s.confidence,
            })
            .collect();
        let decisions = postfilter_decisions(inputs);
        spans
            .into_iter()
            .zip(decisions.into_iter())
            .filter_map(|(span, decision)| if decision.keep { Some(span) } else { None })
            .collect()
    }

    /// C6: resolves same-position, different-`filterType` candidates. The
    /// surviving span in each group records the filter types it beat in
    /// `ambiguous_with`, so a caller can tell a clean single-interpretation
    /// span from one that won a tie.
    fn disambiguate(&self, mut spans: Vec<Span>) -> Vec<Span> {
        let groups = identical_span_groups(&spans);
        if groups.is_empty() {
            return spans;
        }

        let mut dropped: HashSet<usize> = HashSet::new();
        let mut confirmations: Vec<(FilterType, Vec<f64>)> = Vec::new();
        let mut winner_alternatives: Vec<(usize, HashSet<String>)> = Vec::new();

        for group in &groups {
            let refs: Vec<&Span> = group.iter().map(|&i| &spans[i]).collect();
            let decision = self.disambiguator.resolve(&refs);
            for (pos, &idx) in group.iter().enumerate() {
                if Some(pos) != decision.winner {
                    dropped.insert(idx);
                }
            }
            if let Some(pos) = decision.winner {
                let winner_idx = group[pos];
                let alternatives: HashSet<String> = group
                    .iter()
                    .enumerate()
                    .filter(|&(p, _)| p != pos)
                    .map(|(_, &idx)| spans[idx].filter_type.as_str().to_string())
                    .collect();
                winner_alternatives.push((winner_idx, alternatives));

                let winner = &spans[winner_idx];
                confirmations.push((winner.filter_type, build_context_vector(&winner.window, 512)));
            }
        }

        for (idx, alternatives) in winner_alternatives {
            spans[idx].ambiguous_with = alternatives;
        }

        for (filter_type, vector) in confirmations {
            self.disambiguator.confirm(filter_type, vector);
        }

        spans.into_iter().enumerate().filter(|(i, _)| !dropped.contains(i)).map(|(_, s)| s).collect()
    }
}

/// `str::floor_char_boundary` is nightly-only; this is the stable
/// equivalent used nowhere else in the crate's hot path except here, where
/// an approximate context window is being carved out of arbitrary byte
/// offsets.
trait FloorCharBoundary {
    fn floor_char_boundary_lenient(&self, index: usize) -> usize;
}

impl FloorCharBoundary for str {
    fn floor_char_boundary_lenient(&self, index: usize) -> usize {
        let mut i = index.min(self.len());
        while i > 0 && !self.is_char_boundary(i) {
            i -= 1;
        }
        i
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::load_policy;

    fn engine() -> RedactionEngine {
        RedactionEngine::new(Arc::new(Vocabulary::empty()))
    }

    #[tokio::test]
    async fn redact_tokenizes_an_ssn_and_restores_it() {
        let engine = engine();
        let policy = load_policy(r#"{"version":"1"}"#).unwrap();
        let text = "Patient SSN: 123-45-6789, contact test@example.com";

        let outcome = engine.redact(text, &policy, "A1B2C3D4").await.unwrap();
        assert!(!outcome.tokens.is_empty());
        assert_ne!(outcome.text, text);

        let restored = engine.restore(&outcome.text, &outcome.tokens);
        assert_eq!(restored.text, text);
        assert_eq!(restored.restored_count, outcome.tokens.len());
    }

    #[tokio::test]
    async fn pre_cancelled_token_short_circuits_before_detection() {
        let engine = engine();
        let policy = load_policy(r#"{"version":"1"}"#).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = engine
            .redact_with_details_cancellable("SSN 123-45-6789", &policy, "SALT0009", &cancel)
            .await;
        assert!(matches!(result, Err(RedactionError::Cancelled)));
    }

    #[tokio::test]
    async fn cancellation_after_detection_discards_partial_spans() {
        let engine = engine();
        let policy = load_policy(r#"{"version":"1"}"#).unwrap();
        let cancel = CancellationToken::new();

        // Flip the flag from a concurrent task once detection is underway;
        // the post-detection checkpoint should observe it and bail out.
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            cancel_clone.cancel();
        });

        let result = engine
            .redact_with_details_cancellable(
                "Patient SSN 123-45-6789, DOB 03/14/1980.",
                &policy,
                "SALT000A",
                &cancel,
            )
            .await;

        // Either the cancellation was observed (Cancelled) or the spawned
        // task lost the race and the request completed normally - both are
        // valid outcomes of a cooperative checkpoint, but a cancelled run
        // must never produce a half-tokenized result.
        match result {
            Err(RedactionError::Cancelled) => {}
            Ok(details) => assert!(!details.outcome.text.is_empty()),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn redact_with_details_reports_timings_and_breakdown() {
        let engine = engine();
        let policy = load_policy(r#"{"version":"1"}"#).unwrap();
        let details = engine
            .redact_with_details("Email me at patient@example.com", &policy, "SALT0001")
            .await
            .unwrap();
        assert!(!details.stats.filter_timings.is_empty());
        assert!(details.stats.breakdown.contains_key("EMAIL"));
    }

    #[tokio::test]
    async fn process_batch_records_per_document_results() {
        let engine = engine();
        let policy = load_policy(r#"{"version":"1"}"#).unwrap();
        let texts = vec!["Call 555-123-4567.".to_string(), "No PHI here.".to_string()];
        let batch = engine.process_batch(&texts, &policy, |i| format!("SALT{:04}", i)).await;
        assert_eq!(batch.stats.documents, 2);
        assert_eq!(batch.stats.failed, 0);
        assert_eq!(batch.results.len(), 2);
    }

    #[tokio::test]
    async fn age_90_plus_is_redacted_to_literal_90_plus() {
        let engine = engine();
        let policy = load_policy(r#"{"version":"1"}"#).unwrap();
        let outcome = engine.redact("The patient is 92 years old.", &policy, "SALT0002").await.unwrap();
        assert!(outcome.text.contains("90+"));
    }

    #[tokio::test]
    async fn strict_safe_harbor_leaves_populous_zip3_prefix_in_the_clear() {
        let engine = engine();
        let policy = load_policy(r#"{"version":"1","zipcode":{"strictSafeHarbor":true}}"#).unwrap();
        let outcome = engine.redact("Lives in zip 02134.", &policy, "SALT0003").await.unwrap();
        assert!(outcome.text.contains("021"));
        assert!(!outcome.text.contains("02134"));
    }

    #[tokio::test]
    async fn strict_safe_harbor_fully_redacts_a_restricted_zip3_prefix() {
        let engine = engine();
        let policy = load_policy(r#"{"version":"1","zipcode":{"strictSafeHarbor":true}}"#).unwrap();
        let outcome = engine.redact("Lives in zip 03601.", &policy, "SALT0004").await.unwrap();
        assert!(!outcome.text.contains("036"));
    }

    struct UppercasingPlugin;
    impl FilterPlugin for UppercasingPlugin {
        fn name(&self) -> &str {
            "uppercasing"
        }
        fn pre_filter(&self, text: &str) -> String {
            text.to_uppercase()
        }
    }

    #[tokio::test]
    async fn pre_filter_plugin_transforms_text_before_detection() {
        let engine = engine().with_plugins(vec![Arc::new(UppercasingPlugin)], None);
        let policy = load_policy(r#"{"version":"1"}"#).unwrap();
        let outcome = engine.redact("contact me at test@example.com", &policy, "SALT0005").await.unwrap();
        assert_eq!(outcome.tokens.values().next().map(String::as_str), Some("TEST@EXAMPLE.COM"));
    }

    struct DropAllPlugin;
    impl FilterPlugin for DropAllPlugin {
        fn name(&self) -> &str {
            "drop-all"
        }
        fn post_filter(&self, _spans: Vec<Span>) -> Vec<Span> {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn post_filter_plugin_can_drop_final_spans() {
        let engine = engine().with_plugins(vec![Arc::new(DropAllPlugin)], None);
        let policy = load_policy(r#"{"version":"1"}"#).unwrap();
        let outcome = engine.redact("SSN 123-45-6789", &policy, "SALT0006").await.unwrap();
        assert!(outcome.spans.is_empty());
        assert!(outcome.tokens.is_empty());
        assert_eq!(outcome.text, "SSN 123-45-6789");
    }

    #[tokio::test]
    async fn provenance_hook_fires_once_per_successful_redaction() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let engine = engine().with_provenance_hook(Arc::new(move |event: &ProvenanceEvent| {
            assert!(!event.original_hash.is_empty());
            assert!(!event.redacted_hash.is_empty());
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));
        let policy = load_policy(r#"{"version":"1"}"#).unwrap();
        engine.redact("Call 555-123-4567.", &policy, "SALT0007").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn filter_timings_carry_one_entry_per_filter_not_coarse_buckets() {
        let engine = engine();
        let policy = load_policy(r#"{"version":"1"}"#).unwrap();
        let details = engine
            .redact_with_details("Email test@example.com, SSN 123-45-6789, fax (617) 555-0100 fax.", &policy, "SALT000B")
            .await
            .unwrap();
        let names: HashSet<&str> = details.stats.filter_timings.iter().map(|t| t.filter.as_str()).collect();
        assert!(names.contains("EMAIL"));
        assert!(names.contains("SSN"));
        assert!(names.contains("FAX"));
        assert!(!names.contains("regex_filters"));
        assert!(!names.contains("name_filters"));
    }

    #[tokio::test]
    async fn provider_name_is_distinguished_from_a_plain_name_mention() {
        let engine = RedactionEngine::new(Arc::new(Vocabulary::empty()));
        let policy = load_policy(r#"{"version":"1"}"#).unwrap();
        let details = engine
            .redact_with_details("Dr. Jordan examined Jordan Lake yesterday.", &policy, "SALT000C")
            .await
            .unwrap();
        assert!(details.stats.breakdown.contains_key("PROVIDER_NAME"));
    }

    #[tokio::test]
    async fn stats_expose_a_fingerprint_of_the_input() {
        let engine = engine();
        let policy = load_policy(r#"{"version":"1"}"#).unwrap();
        let details = engine.redact_with_details("No PHI here.", &policy, "SALT0008").await.unwrap();
        assert_eq!(details.stats.fingerprint.len(), 64);
    }
}
