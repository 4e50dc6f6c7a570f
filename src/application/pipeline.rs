//! Candidate Pipeline
//!
//! The per-candidate flow from raw feed entry to terminal verdict:
//! dedup gate, fast filter, on-chain verifier, AI scorer, then both
//! strategies. Stage order is strictly cheapest-first so paid boundaries
//! only see the handful of candidates that earn them.
//!
//! The dedup entry is written last. A crash mid-candidate leaves no cache
//! record, so the token is re-evaluated next cycle instead of being
//! silently skipped on a half-finished decision.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, warn};

use crate::adapters::retry::RetryPolicy;
use crate::domain::{
    Candidate, FastFilter, FilterVerdict, RejectReason, ScoreResult, VerifierReport,
};
use crate::ports::alerts::{AcceptAlert, Alert};
use crate::ports::cache::{CacheEntry, CachedDecision, DedupCache};
use crate::ports::journal::{EventJournal, JournalRecord};
use crate::ports::scorer::AiScorer;
use crate::ports::verifier::OnChainVerifier;
use crate::strategy::{evaluate, StrategyParams, StrategyVerdict};

use super::dispatcher::AlertDispatcher;

/// Where a candidate's journey through the pipeline ended.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// A live dedup entry short-circuited everything
    AlreadySeen,
    /// Died in the fast filter
    FilterRejected(RejectReason),
    /// Reached the strategy engine; verdicts are per strategy
    Evaluated {
        verdicts: Vec<StrategyVerdict>,
        score: ScoreResult,
    },
}

pub struct Pipeline {
    filter: FastFilter,
    cache: Arc<dyn DedupCache>,
    verifier: Arc<dyn OnChainVerifier>,
    scorer: Arc<dyn AiScorer>,
    dispatcher: Arc<AlertDispatcher>,
    journal: Arc<dyn EventJournal>,
    strategies: Vec<StrategyParams>,
    boundary_retry: RetryPolicy,
    /// TTL for fast-filter rejects; short so thresholds re-apply soon
    reject_ttl: Duration,
    /// TTL for strategy verdicts; long so tokens are not re-scored
    verdict_ttl: Duration,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        filter: FastFilter,
        cache: Arc<dyn DedupCache>,
        verifier: Arc<dyn OnChainVerifier>,
        scorer: Arc<dyn AiScorer>,
        dispatcher: Arc<AlertDispatcher>,
        journal: Arc<dyn EventJournal>,
        strategies: Vec<StrategyParams>,
        boundary_retry: RetryPolicy,
        reject_ttl: Duration,
        verdict_ttl: Duration,
    ) -> Self {
        Self {
            filter,
            cache,
            verifier,
            scorer,
            dispatcher,
            journal,
            strategies,
            boundary_retry,
            reject_ttl,
            verdict_ttl,
        }
    }

    /// Run one candidate through every stage. Never returns an error:
    /// boundary failures degrade to fail-closed defaults and store outages
    /// degrade to redundant work.
    pub async fn process(&self, candidate: &Candidate) -> PipelineOutcome {
        // Dedup gate. An unreachable store is a miss: re-evaluating a
        // token is wasteful but never wrong.
        match self.cache.lookup(&candidate.id).await {
            Ok(Some(_)) => {
                debug!(token = %candidate.id, "dedup hit, skipping");
                return PipelineOutcome::AlreadySeen;
            }
            Ok(None) => {}
            Err(err) => {
                warn!(token = %candidate.id, error = %err, "cache lookup failed, treating as miss");
            }
        }

        // Fast filter. Rejects are remembered briefly so the same listing
        // is not re-inspected every poll, but long enough thresholds can
        // change its fate later.
        if let FilterVerdict::Reject(reason) = self.filter.inspect(candidate, Utc::now()) {
            debug!(token = %candidate.id, %reason, "fast filter reject");
            self.journal_record(&JournalRecord::filter_reject(
                candidate.id.clone(),
                candidate.symbol.clone(),
                reason,
            ))
            .await;
            self.record_cache(candidate, CacheEntry::new(CachedDecision::Rejected), self.reject_ttl)
                .await;
            return PipelineOutcome::FilterRejected(reason);
        }

        let report = self.verify(candidate).await;
        let score = self.score(candidate, &report).await;

        let mut verdicts = Vec::with_capacity(self.strategies.len());
        let mut entry = CacheEntry::new(CachedDecision::Rejected);
        for params in &self.strategies {
            let verdict = evaluate(params, candidate, &report, &score);
            if verdict.accepted() {
                entry.decision = CachedDecision::Accepted;
                self.dispatcher
                    .dispatch(&Alert::Accept(self.accept_alert(candidate, &verdict, &score)))
                    .await;
            }
            entry = entry.with_outcome(verdict.strategy.clone(), verdict.decision);
            self.journal_record(&JournalRecord::Verdict(verdict.clone())).await;
            verdicts.push(verdict);
        }

        // Terminal write, deliberately last.
        self.record_cache(candidate, entry, self.verdict_ttl).await;

        PipelineOutcome::Evaluated { verdicts, score }
    }

    /// Verifier call with bounded retry; exhaustion degrades the report.
    async fn verify(&self, candidate: &Candidate) -> VerifierReport {
        let result = self
            .boundary_retry
            .run(self.verifier.name(), || async {
                self.verifier.verify(candidate).await
            })
            .await;
        match result {
            Ok(report) => report,
            Err(err) => {
                warn!(token = %candidate.id, error = %err, "verifier unavailable, degrading report");
                VerifierReport::degraded()
            }
        }
    }

    /// Scorer call with bounded retry; exhaustion fails closed.
    async fn score(&self, candidate: &Candidate, report: &VerifierReport) -> ScoreResult {
        let result = self
            .boundary_retry
            .run(self.scorer.name(), || async {
                self.scorer.score(candidate, report).await
            })
            .await;
        match result {
            Ok(score) => score,
            Err(err) => {
                warn!(token = %candidate.id, error = %err, "scorer unavailable, failing closed");
                ScoreResult::fail_closed(err.to_string())
            }
        }
    }

    fn accept_alert(
        &self,
        candidate: &Candidate,
        verdict: &StrategyVerdict,
        score: &ScoreResult,
    ) -> AcceptAlert {
        AcceptAlert {
            strategy: verdict.strategy.clone(),
            token: candidate.id.clone(),
            symbol: candidate.symbol.clone(),
            name: candidate.name.clone(),
            liquidity_usd: candidate.liquidity_usd,
            allocation_usd: verdict.allocation_usd.unwrap_or(0.0),
            score: score.clone(),
            links: candidate.links.clone(),
        }
    }

    async fn journal_record(&self, record: &JournalRecord) {
        if let Err(err) = self.journal.append(record).await {
            error!(error = %err, "journal append failed");
        }
    }

    async fn record_cache(&self, candidate: &Candidate, entry: CacheEntry, ttl: Duration) {
        if let Err(err) = self.cache.record(&candidate.id, entry, ttl).await {
            warn!(token = %candidate.id, error = %err, "cache record failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::domain::{FilterConfig, Sentiment, TokenId};
    use crate::ports::mocks::{FailingCache, MockJournal, MockScorer, MockSink, MockVerifier};

    fn candidate(address: &str) -> Candidate {
        Candidate {
            id: TokenId::new("solana", address),
            symbol: "MOON".to_string(),
            name: "Mooncoin".to_string(),
            pair_address: format!("pair-{address}"),
            price_usd: Some(0.01),
            liquidity_usd: Some(30_000.0),
            volume_24h_usd: Some(120_000.0),
            market_cap_usd: Some(400_000.0),
            pair_created_at_ms: None,
            buys_h1: Some(120),
            sells_h1: Some(60),
            mintable: Some(false),
            links: vec![],
        }
    }

    fn good_score() -> ScoreResult {
        ScoreResult {
            scam_probability: 0.05,
            meme_potential: 80.0,
            sentiment: Sentiment::Bullish,
            confidence: 0.8,
            summary: "clean".to_string(),
            flags: vec![],
        }
    }

    struct Harness {
        pipeline: Pipeline,
        verifier: Arc<MockVerifier>,
        scorer: Arc<MockScorer>,
        sink: Arc<MockSink>,
        journal: Arc<MockJournal>,
    }

    fn harness_with_cache(cache: Arc<dyn DedupCache>) -> Harness {
        let verifier = Arc::new(MockVerifier::all_clear());
        let scorer = Arc::new(MockScorer::new(good_score()));
        let sink = Arc::new(MockSink::new());
        let journal = Arc::new(MockJournal::new());
        let dispatcher = Arc::new(AlertDispatcher::new(
            vec![sink.clone()],
            RetryPolicy::none(),
        ));
        let pipeline = Pipeline::new(
            FastFilter::new(FilterConfig::default()),
            cache,
            verifier.clone(),
            scorer.clone(),
            dispatcher,
            journal.clone(),
            vec![StrategyParams::safe_shield(), StrategyParams::degen_sword()],
            RetryPolicy::none(),
            Duration::from_secs(3600),
            Duration::from_secs(86_400),
        );
        Harness {
            pipeline,
            verifier,
            scorer,
            sink,
            journal,
        }
    }

    fn harness() -> Harness {
        harness_with_cache(Arc::new(MemoryCache::new()))
    }

    #[tokio::test]
    async fn test_clean_candidate_accepted_and_alerted() {
        let h = harness();
        let outcome = h.pipeline.process(&candidate("clean")).await;
        match outcome {
            PipelineOutcome::Evaluated { verdicts, .. } => {
                assert_eq!(verdicts.len(), 2);
                assert!(verdicts.iter().all(StrategyVerdict::accepted));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        // One accept alert per strategy, one journal row per verdict.
        assert_eq!(h.sink.sent_count(), 2);
        assert_eq!(h.journal.record_count(), 2);
    }

    #[tokio::test]
    async fn test_second_sighting_is_deduped() {
        let h = harness();
        let c = candidate("repeat");
        h.pipeline.process(&c).await;
        let outcome = h.pipeline.process(&c).await;
        assert!(matches!(outcome, PipelineOutcome::AlreadySeen));
        // Boundaries were charged exactly once.
        assert_eq!(h.verifier.call_count(), 1);
        assert_eq!(h.scorer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_filter_reject_skips_paid_boundaries() {
        let h = harness();
        let mut c = candidate("thin");
        c.liquidity_usd = Some(500.0);
        let outcome = h.pipeline.process(&c).await;
        assert!(matches!(
            outcome,
            PipelineOutcome::FilterRejected(RejectReason::LiquidityBelowFloor)
        ));
        assert_eq!(h.verifier.call_count(), 0);
        assert_eq!(h.scorer.call_count(), 0);
        assert_eq!(h.sink.sent_count(), 0);
        // The reject still leaves an audit row and a dedup entry.
        assert_eq!(h.journal.record_count(), 1);
        let again = h.pipeline.process(&c).await;
        assert!(matches!(again, PipelineOutcome::AlreadySeen));
    }

    #[tokio::test]
    async fn test_verifier_outage_degrades_and_rejects() {
        let h = harness();
        let c = candidate("darkchain");
        h.verifier.fail_for(c.id.clone(), "rpc down");
        let outcome = h.pipeline.process(&c).await;
        match outcome {
            PipelineOutcome::Evaluated { verdicts, .. } => {
                assert!(verdicts.iter().all(|v| !v.accepted()));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        // Scorer still ran (against the degraded report), no alerts fired.
        assert_eq!(h.scorer.call_count(), 1);
        assert_eq!(h.sink.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_scorer_outage_fails_closed() {
        let h = harness();
        let c = candidate("mute-model");
        h.scorer.fail_for(c.id.clone(), "model down");
        let outcome = h.pipeline.process(&c).await;
        match outcome {
            PipelineOutcome::Evaluated { verdicts, score } => {
                assert!(score.scam_probability >= 1.0);
                assert!(verdicts.iter().all(|v| !v.accepted()));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(h.sink.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_cache_outage_degrades_to_rework() {
        let h = harness_with_cache(Arc::new(FailingCache));
        let c = candidate("no-cache");
        h.pipeline.process(&c).await;
        let outcome = h.pipeline.process(&c).await;
        // Both sightings do the full walk: redundant, never wrong.
        assert!(matches!(outcome, PipelineOutcome::Evaluated { .. }));
        assert_eq!(h.verifier.call_count(), 2);
    }

    #[tokio::test]
    async fn test_split_verdict_alerts_only_accepting_strategy() {
        let h = harness();
        let mut c = candidate("mint-exception");
        c.mintable = Some(true);
        let mut score = good_score();
        score.meme_potential = 85.0;
        score.scam_probability = 0.1;
        h.scorer.set_score(c.id.clone(), score);

        let outcome = h.pipeline.process(&c).await;
        match outcome {
            PipelineOutcome::Evaluated { verdicts, .. } => {
                let accepted: Vec<&str> = verdicts
                    .iter()
                    .filter(|v| v.accepted())
                    .map(|v| v.strategy.as_str())
                    .collect();
                assert_eq!(accepted, vec!["degen_sword"]);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(h.sink.sent_count(), 1);
    }
}
