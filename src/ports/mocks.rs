//! Recording mocks for the port traits
//!
//! Deterministic in-memory implementations used by unit and integration
//! tests. Each mock records the calls it receives and plays back scripted
//! responses, so tests can assert on exactly which boundaries were touched.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Candidate, ScoreResult, TokenId, VerifierReport};

use super::alerts::{Alert, AlertError, AlertSink};
use super::cache::{CacheEntry, CacheError, DedupCache};
use super::journal::{EventJournal, JournalError, JournalRecord};
use super::scorer::{AiScorer, ScorerError};
use super::source::{CandidateSource, SourceError};
use super::verifier::{OnChainVerifier, VerifierError};

/// Source that plays back one scripted batch per fetch, then empties.
#[derive(Default)]
pub struct MockSource {
    batches: Mutex<VecDeque<Result<Vec<Candidate>, String>>>,
    fetch_count: Mutex<u32>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_batch(&self, batch: Vec<Candidate>) {
        self.batches.lock().unwrap().push_back(Ok(batch));
    }

    pub fn push_failure(&self, message: &str) {
        self.batches
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn fetch_count(&self) -> u32 {
        *self.fetch_count.lock().unwrap()
    }
}

#[async_trait]
impl CandidateSource for MockSource {
    fn name(&self) -> &str {
        "mock-source"
    }

    async fn fetch_new(&self) -> Result<Vec<Candidate>, SourceError> {
        *self.fetch_count.lock().unwrap() += 1;
        match self.batches.lock().unwrap().pop_front() {
            Some(Ok(batch)) => Ok(batch),
            Some(Err(msg)) => Err(SourceError::Http(msg)),
            None => Ok(vec![]),
        }
    }
}

/// Verifier with a default report, per-token overrides, and per-token
/// scripted failures. Records every verified token.
pub struct MockVerifier {
    default_report: VerifierReport,
    overrides: Mutex<HashMap<TokenId, VerifierReport>>,
    failures: Mutex<HashMap<TokenId, String>>,
    calls: Arc<Mutex<Vec<TokenId>>>,
}

impl MockVerifier {
    pub fn new(default_report: VerifierReport) -> Self {
        Self {
            default_report,
            overrides: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn all_clear() -> Self {
        Self::new(VerifierReport {
            honeypot: Some(false),
            lp_locked: Some(true),
            mintable: Some(false),
            dev_concentration_pct: Some(5.0),
            buy_tax_pct: Some(0.0),
            sell_tax_pct: Some(0.0),
            confidence: 0.9,
        })
    }

    pub fn set_report(&self, id: TokenId, report: VerifierReport) {
        self.overrides.lock().unwrap().insert(id, report);
    }

    /// Make verification fail (transport-style) for one token.
    pub fn fail_for(&self, id: TokenId, message: &str) {
        self.failures.lock().unwrap().insert(id, message.to_string());
    }

    pub fn calls(&self) -> Vec<TokenId> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl OnChainVerifier for MockVerifier {
    fn name(&self) -> &str {
        "mock-verifier"
    }

    async fn verify(&self, candidate: &Candidate) -> Result<VerifierReport, VerifierError> {
        self.calls.lock().unwrap().push(candidate.id.clone());
        if let Some(msg) = self.failures.lock().unwrap().get(&candidate.id) {
            return Err(VerifierError::Http(msg.clone()));
        }
        Ok(self
            .overrides
            .lock()
            .unwrap()
            .get(&candidate.id)
            .cloned()
            .unwrap_or_else(|| self.default_report.clone()))
    }
}

/// Scorer with a default score, per-token overrides and scripted failures.
pub struct MockScorer {
    default_score: ScoreResult,
    overrides: Mutex<HashMap<TokenId, ScoreResult>>,
    failures: Mutex<HashMap<TokenId, String>>,
    calls: Arc<Mutex<Vec<TokenId>>>,
}

impl MockScorer {
    pub fn new(default_score: ScoreResult) -> Self {
        Self {
            default_score,
            overrides: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_score(&self, id: TokenId, score: ScoreResult) {
        self.overrides.lock().unwrap().insert(id, score);
    }

    pub fn fail_for(&self, id: TokenId, message: &str) {
        self.failures.lock().unwrap().insert(id, message.to_string());
    }

    pub fn calls(&self) -> Vec<TokenId> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl AiScorer for MockScorer {
    fn name(&self) -> &str {
        "mock-scorer"
    }

    async fn score(
        &self,
        candidate: &Candidate,
        _report: &VerifierReport,
    ) -> Result<ScoreResult, ScorerError> {
        self.calls.lock().unwrap().push(candidate.id.clone());
        if let Some(msg) = self.failures.lock().unwrap().get(&candidate.id) {
            return Err(ScorerError::Http(msg.clone()));
        }
        Ok(self
            .overrides
            .lock()
            .unwrap()
            .get(&candidate.id)
            .cloned()
            .unwrap_or_else(|| self.default_score.clone()))
    }
}

/// Sink that records alerts and can fail the first N sends per alert batch.
#[derive(Default)]
pub struct MockSink {
    sent: Arc<Mutex<Vec<Alert>>>,
    failures_remaining: Mutex<u32>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` sends before succeeding again.
    pub fn fail_next(&self, n: u32) {
        *self.failures_remaining.lock().unwrap() = n;
    }

    pub fn sent(&self) -> Vec<Alert> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl AlertSink for MockSink {
    fn name(&self) -> &str {
        "mock-sink"
    }

    async fn send(&self, alert: &Alert) -> Result<(), AlertError> {
        let mut remaining = self.failures_remaining.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(AlertError::Delivery("scripted failure".to_string()));
        }
        self.sent.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

/// Journal that keeps records in memory.
#[derive(Default)]
pub struct MockJournal {
    records: Arc<Mutex<Vec<JournalRecord>>>,
}

impl MockJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<JournalRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl EventJournal for MockJournal {
    async fn append(&self, record: &JournalRecord) -> Result<(), JournalError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Cache that always errors, for exercising the treat-as-miss degradation.
pub struct FailingCache;

#[async_trait]
impl DedupCache for FailingCache {
    async fn lookup(&self, _id: &TokenId) -> Result<Option<CacheEntry>, CacheError> {
        Err(CacheError::Unreachable("scripted outage".to_string()))
    }

    async fn record(
        &self,
        _id: &TokenId,
        _entry: CacheEntry,
        _ttl: Duration,
    ) -> Result<(), CacheError> {
        Err(CacheError::Unreachable("scripted outage".to_string()))
    }
}
