//! Strategy Evaluation Engine
//!
//! One pure function maps (params, candidate, verifier report, AI score) to
//! a verdict. Both configured strategies run it independently for every
//! candidate that survives the cheap gates; a candidate can be accepted by
//! one and rejected by the other in the same cycle.
//!
//! Ordering inside the function is safety-first: the scam ceiling and the
//! verifier gates fire before the mintable exception, so no amount of meme
//! potential can rescue a token the model calls a scam.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Candidate, ScoreResult, TokenId, VerifierReport};

use super::params::StrategyParams;

/// Terminal decision for one (strategy, candidate) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Reject,
}

/// Why the decision came out the way it did. One code per rule so the
/// journal can be grepped by cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    Accepted,
    ScamProbability,
    VerifierUnconfident,
    Honeypot,
    LpUnlocked,
    Mintable,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::Accepted => "accepted",
            ReasonCode::ScamProbability => "scam_probability",
            ReasonCode::VerifierUnconfident => "verifier_unconfident",
            ReasonCode::Honeypot => "honeypot",
            ReasonCode::LpUnlocked => "lp_unlocked",
            ReasonCode::Mintable => "mintable",
        }
    }
}

/// Output of one strategy evaluation. Consumed immediately by the alert
/// dispatcher, then archived to the journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyVerdict {
    pub strategy: String,
    pub token: TokenId,
    pub symbol: String,
    pub decision: Decision,
    pub reason: ReasonCode,
    /// Notional budget for an accept, absent on reject
    pub allocation_usd: Option<f64>,
    pub decided_at: DateTime<Utc>,
}

impl StrategyVerdict {
    pub fn accepted(&self) -> bool {
        self.decision == Decision::Accept
    }

    fn reject(params: &StrategyParams, candidate: &Candidate, reason: ReasonCode) -> Self {
        Self {
            strategy: params.name.clone(),
            token: candidate.id.clone(),
            symbol: candidate.symbol.clone(),
            decision: Decision::Reject,
            reason,
            allocation_usd: None,
            decided_at: Utc::now(),
        }
    }
}

/// Evaluate one candidate against one strategy's rule set.
pub fn evaluate(
    params: &StrategyParams,
    candidate: &Candidate,
    report: &VerifierReport,
    score: &ScoreResult,
) -> StrategyVerdict {
    // 1. Scam ceiling. Monotonic: nothing below can override this.
    if score.scam_probability > params.max_scam_probability {
        return StrategyVerdict::reject(params, candidate, ReasonCode::ScamProbability);
    }

    // 2. Verifier trust gate. A degraded report has confidence 0.0 and
    // always lands here - the fail-closed path for verifier outages.
    if report.confidence < params.min_verifier_confidence {
        return StrategyVerdict::reject(params, candidate, ReasonCode::VerifierUnconfident);
    }

    // 3. Hard on-chain flags. Unknown is unsafe: a verifier confident
    // enough to pass the gate but silent on a flag does not earn a pass.
    if report.honeypot.unwrap_or(true) {
        return StrategyVerdict::reject(params, candidate, ReasonCode::Honeypot);
    }
    if !report.lp_locked.unwrap_or(false) {
        return StrategyVerdict::reject(params, candidate, ReasonCode::LpUnlocked);
    }

    // 4. Mintable supply. The feed flag or the verifier flag counts; the
    // Degen Sword exception trades the risk against AI meme potential.
    let mintable = candidate.mintable.or(report.mintable).unwrap_or(false);
    if mintable {
        let exception = params.allow_mintable
            && score.meme_potential >= params.min_ai_score_if_mintable;
        if !exception {
            return StrategyVerdict::reject(params, candidate, ReasonCode::Mintable);
        }
    }

    StrategyVerdict {
        strategy: params.name.clone(),
        token: candidate.id.clone(),
        symbol: candidate.symbol.clone(),
        decision: Decision::Accept,
        reason: ReasonCode::Accepted,
        allocation_usd: Some(params.fixed_balance_usd),
        decided_at: Utc::now(),
    }
}
