//! Pipeline Integration Tests
//!
//! End-to-end tests of the discovery pipeline wired with the in-memory
//! cache and recording mocks: dedup gating, filter ordering, boundary
//! degradation, the dual-strategy split and paper book lifecycle.
//!
//! All tests are deterministic (no real network calls).

use std::sync::Arc;
use std::time::Duration;

use gemscout::adapters::RetryPolicy;
use gemscout::application::{AlertDispatcher, PaperBook, Pipeline, PipelineOutcome, Scheduler, ShutdownHandle};
use gemscout::cache::MemoryCache;
use gemscout::domain::{
    Candidate, FastFilter, FilterConfig, RejectReason, ScoreResult, Sentiment, TokenId,
    VerifierReport,
};
use gemscout::ports::alerts::Alert;
use gemscout::ports::journal::JournalRecord;
use gemscout::ports::mocks::{MockJournal, MockScorer, MockSink, MockSource, MockVerifier};
use gemscout::ports::source::SourceError;
use gemscout::strategy::{Decision, StrategyParams};

use async_trait::async_trait;
use gemscout::adapters::PairRefresher;

// ============================================================================
// Test Fixtures
// ============================================================================

fn candidate(address: &str) -> Candidate {
    Candidate {
        id: TokenId::new("solana", address),
        symbol: "GEM".to_string(),
        name: "Gem Token".to_string(),
        pair_address: format!("pair-{address}"),
        price_usd: Some(0.005),
        liquidity_usd: Some(45_000.0),
        volume_24h_usd: Some(180_000.0),
        market_cap_usd: Some(100_000.0),
        pair_created_at_ms: None,
        buys_h1: Some(150),
        sells_h1: Some(70),
        mintable: Some(false),
        links: vec!["https://t.me/gemtoken".to_string()],
    }
}

fn bullish_score() -> ScoreResult {
    ScoreResult {
        scam_probability: 0.08,
        meme_potential: 82.0,
        sentiment: Sentiment::Bullish,
        confidence: 0.85,
        summary: "active community, fair launch".to_string(),
        flags: vec![],
    }
}

struct Rig {
    pipeline: Arc<Pipeline>,
    verifier: Arc<MockVerifier>,
    scorer: Arc<MockScorer>,
    sink: Arc<MockSink>,
    journal: Arc<MockJournal>,
}

fn build_rig() -> Rig {
    let verifier = Arc::new(MockVerifier::all_clear());
    let scorer = Arc::new(MockScorer::new(bullish_score()));
    let sink = Arc::new(MockSink::new());
    let journal = Arc::new(MockJournal::new());
    let dispatcher = Arc::new(AlertDispatcher::new(vec![sink.clone()], RetryPolicy::none()));

    let pipeline = Arc::new(Pipeline::new(
        FastFilter::new(FilterConfig::default()),
        Arc::new(MemoryCache::new()),
        verifier.clone(),
        scorer.clone(),
        dispatcher,
        journal.clone(),
        vec![StrategyParams::safe_shield(), StrategyParams::degen_sword()],
        RetryPolicy::none(),
        Duration::from_secs(3600),
        Duration::from_secs(86_400),
    ));

    Rig {
        pipeline,
        verifier,
        scorer,
        sink,
        journal,
    }
}

// ============================================================================
// Dedup and filter ordering
// ============================================================================

#[tokio::test]
async fn test_token_charged_against_boundaries_once_per_ttl() {
    let rig = build_rig();
    let c = candidate("once");

    let first = rig.pipeline.process(&c).await;
    assert!(matches!(first, PipelineOutcome::Evaluated { .. }));

    for _ in 0..3 {
        let again = rig.pipeline.process(&c).await;
        assert!(matches!(again, PipelineOutcome::AlreadySeen));
    }
    assert_eq!(rig.verifier.call_count(), 1);
    assert_eq!(rig.scorer.call_count(), 1);
}

#[tokio::test]
async fn test_filter_rejects_never_reach_paid_boundaries() {
    let rig = build_rig();

    let mut wrong_chain = candidate("chain");
    wrong_chain.id = TokenId::new("dogechain", "0x1");
    let mut illiquid = candidate("illiquid");
    illiquid.liquidity_usd = Some(900.0);
    let mut dumped = candidate("dumped");
    dumped.buys_h1 = Some(10);
    dumped.sells_h1 = Some(80);

    for (c, reason) in [
        (wrong_chain, RejectReason::UnsupportedChain),
        (illiquid, RejectReason::LiquidityBelowFloor),
        (dumped, RejectReason::SellPressure),
    ] {
        let outcome = rig.pipeline.process(&c).await;
        match outcome {
            PipelineOutcome::FilterRejected(r) => assert_eq!(r, reason),
            other => panic!("expected filter reject, got {other:?}"),
        }
    }
    assert_eq!(rig.verifier.call_count(), 0);
    assert_eq!(rig.scorer.call_count(), 0);
    assert_eq!(rig.sink.sent_count(), 0);
    // Every reject left an audit row.
    assert_eq!(rig.journal.record_count(), 3);
}

#[tokio::test]
async fn test_filter_reject_is_remembered() {
    let rig = build_rig();
    let mut c = candidate("thin");
    c.liquidity_usd = Some(100.0);

    rig.pipeline.process(&c).await;
    let again = rig.pipeline.process(&c).await;
    assert!(matches!(again, PipelineOutcome::AlreadySeen));
    assert_eq!(rig.journal.record_count(), 1);
}

// ============================================================================
// Boundary degradation
// ============================================================================

#[tokio::test]
async fn test_verifier_outage_yields_unanimous_reject() {
    let rig = build_rig();
    let c = candidate("dark");
    rig.verifier.fail_for(c.id.clone(), "rpc down");

    match rig.pipeline.process(&c).await {
        PipelineOutcome::Evaluated { verdicts, .. } => {
            assert_eq!(verdicts.len(), 2);
            assert!(verdicts.iter().all(|v| v.decision == Decision::Reject));
        }
        other => panic!("expected evaluation, got {other:?}"),
    }
    assert_eq!(rig.sink.sent_count(), 0);
}

#[tokio::test]
async fn test_scorer_outage_fails_closed() {
    let rig = build_rig();
    let c = candidate("mute");
    rig.scorer.fail_for(c.id.clone(), "model down");

    match rig.pipeline.process(&c).await {
        PipelineOutcome::Evaluated { verdicts, score } => {
            assert!(score.scam_probability >= 1.0);
            assert!(verdicts.iter().all(|v| v.decision == Decision::Reject));
        }
        other => panic!("expected evaluation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unconfident_verifier_rejected_even_with_clean_flags() {
    let rig = build_rig();
    let c = candidate("lowconf");
    let mut report = VerifierReport::degraded();
    report.honeypot = Some(false);
    report.lp_locked = Some(true);
    report.mintable = Some(false);
    report.confidence = 0.1;
    rig.verifier.set_report(c.id.clone(), report);

    match rig.pipeline.process(&c).await {
        PipelineOutcome::Evaluated { verdicts, .. } => {
            assert!(verdicts.iter().all(|v| v.decision == Decision::Reject));
        }
        other => panic!("expected evaluation, got {other:?}"),
    }
}

// ============================================================================
// Dual-strategy split
// ============================================================================

#[tokio::test]
async fn test_mintable_token_splits_the_strategies() {
    let rig = build_rig();
    let mut c = candidate("mint");
    c.mintable = Some(true);
    let mut score = bullish_score();
    score.meme_potential = 85.0;
    score.scam_probability = 0.1;
    rig.scorer.set_score(c.id.clone(), score);

    match rig.pipeline.process(&c).await {
        PipelineOutcome::Evaluated { verdicts, .. } => {
            let safe = verdicts.iter().find(|v| v.strategy == "safe_shield").unwrap();
            let degen = verdicts.iter().find(|v| v.strategy == "degen_sword").unwrap();
            assert_eq!(safe.decision, Decision::Reject);
            assert_eq!(degen.decision, Decision::Accept);
        }
        other => panic!("expected evaluation, got {other:?}"),
    }
    // Only the accepting strategy alerted.
    assert_eq!(rig.sink.sent_count(), 1);
    match &rig.sink.sent()[0] {
        Alert::Accept(a) => assert_eq!(a.strategy, "degen_sword"),
        other => panic!("expected accept alert, got {other:?}"),
    }
}

#[tokio::test]
async fn test_verdicts_and_outcomes_are_journaled() {
    let rig = build_rig();
    rig.pipeline.process(&candidate("audit")).await;

    let records = rig.journal.records();
    let verdicts: Vec<_> = records
        .iter()
        .filter_map(|r| match r {
            JournalRecord::Verdict(v) => Some(v),
            _ => None,
        })
        .collect();
    assert_eq!(verdicts.len(), 2);
    assert!(verdicts.iter().all(|v| v.decision == Decision::Accept));
}

// ============================================================================
// Scheduler and paper books
// ============================================================================

struct ScriptedRefresher {
    caps: std::sync::Mutex<std::collections::HashMap<String, f64>>,
}

impl ScriptedRefresher {
    fn new() -> Self {
        Self {
            caps: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }

    fn set(&self, pair_address: &str, market_cap: f64) {
        self.caps
            .lock()
            .unwrap()
            .insert(pair_address.to_string(), market_cap);
    }
}

#[async_trait]
impl PairRefresher for ScriptedRefresher {
    async fn fetch_market_cap(
        &self,
        _chain: &str,
        pair_address: &str,
    ) -> Result<Option<f64>, SourceError> {
        Ok(self.caps.lock().unwrap().get(pair_address).copied())
    }
}

struct LoopRig {
    scheduler: Arc<Scheduler>,
    source: Arc<MockSource>,
    sink: Arc<MockSink>,
    refresher: Arc<ScriptedRefresher>,
    verifier: Arc<MockVerifier>,
}

fn build_loop_rig() -> LoopRig {
    let source = Arc::new(MockSource::new());
    let sink = Arc::new(MockSink::new());
    let journal = Arc::new(MockJournal::new());
    let refresher = Arc::new(ScriptedRefresher::new());
    let verifier = Arc::new(MockVerifier::all_clear());
    let dispatcher = Arc::new(AlertDispatcher::new(vec![sink.clone()], RetryPolicy::none()));

    let pipeline = Arc::new(Pipeline::new(
        FastFilter::new(FilterConfig::default()),
        Arc::new(MemoryCache::new()),
        verifier.clone(),
        Arc::new(MockScorer::new(bullish_score())),
        dispatcher.clone(),
        journal.clone(),
        vec![StrategyParams::safe_shield(), StrategyParams::degen_sword()],
        RetryPolicy::none(),
        Duration::from_secs(3600),
        Duration::from_secs(86_400),
    ));

    let scheduler = Arc::new(Scheduler::new(
        source.clone(),
        pipeline,
        refresher.clone(),
        dispatcher,
        journal,
        vec![
            PaperBook::new("safe_shield", 200.0),
            PaperBook::new("degen_sword", 200.0),
        ],
        Duration::from_millis(5),
        4,
        ShutdownHandle::new(),
    ));

    LoopRig {
        scheduler,
        source,
        sink,
        refresher,
        verifier,
    }
}

#[tokio::test]
async fn test_full_cycle_from_feed_to_paper_position() {
    let rig = build_loop_rig();
    rig.source.push_batch(vec![candidate("fullcycle")]);

    rig.scheduler.run_cycle().await;

    // Both strategies accepted the clean candidate and alerted.
    let accepts = rig
        .sink
        .sent()
        .into_iter()
        .filter(|a| matches!(a, Alert::Accept(_)))
        .count();
    assert_eq!(accepts, 2);
}

#[tokio::test]
async fn test_stop_loss_fires_on_market_cap_collapse() {
    let rig = build_loop_rig();
    let c = candidate("crash");
    rig.source.push_batch(vec![c.clone()]);
    rig.scheduler.run_cycle().await;

    // Market cap collapses 40% before the next cycle.
    rig.refresher.set(&c.pair_address, 60_000.0);
    rig.source.push_batch(vec![]);
    rig.scheduler.run_cycle().await;

    let stop_losses: Vec<_> = rig
        .sink
        .sent()
        .into_iter()
        .filter_map(|a| match a {
            Alert::TradeUpdate(t) if t.event == "stop_loss" => Some(t),
            _ => None,
        })
        .collect();
    // One per book, both underwater.
    assert_eq!(stop_losses.len(), 2);
    assert!(stop_losses.iter().all(|t| t.realized_pnl_usd < 0.0));
}

#[tokio::test]
async fn test_batch_survives_per_token_verifier_failures() {
    let rig = build_loop_rig();
    let batch: Vec<Candidate> = (0..12).map(|i| candidate(&format!("tok{i}"))).collect();
    // A third of the batch hits verifier transport errors.
    for c in batch.iter().take(4) {
        rig.verifier.fail_for(c.id.clone(), "rpc down");
    }
    rig.source.push_batch(batch);

    rig.scheduler.run_cycle().await;

    // The failed tokens degrade and reject; the clean eight still pass
    // both strategies, two accept alerts each.
    let accepts = rig
        .sink
        .sent()
        .into_iter()
        .filter(|a| matches!(a, Alert::Accept(_)))
        .count();
    assert_eq!(accepts, 16);
}

#[tokio::test]
async fn test_feed_outage_skips_cycle_then_recovers() {
    let rig = build_loop_rig();
    rig.source.push_failure("502 from feed");
    rig.scheduler.run_cycle().await;
    assert_eq!(rig.sink.sent_count(), 0);

    rig.source.push_batch(vec![candidate("recovered")]);
    rig.scheduler.run_cycle().await;
    let accepts = rig
        .sink
        .sent()
        .into_iter()
        .filter(|a| matches!(a, Alert::Accept(_)))
        .count();
    assert_eq!(accepts, 2);
}

#[tokio::test]
async fn test_shutdown_stops_the_loop() {
    let rig = build_loop_rig();
    let handle = rig.scheduler.shutdown_handle();
    let task = tokio::spawn(rig.scheduler.clone().run());

    tokio::time::sleep(Duration::from_millis(20)).await;
    handle.trigger().await;

    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("loop did not stop after shutdown")
        .unwrap();
}
