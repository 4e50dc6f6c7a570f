//! Scoring and Verification Result Types
//!
//! Value types produced by the two expensive boundaries (on-chain verifier,
//! AI scorer). Both carry explicit fail-closed constructors so the pipeline
//! never has to branch on error types - a dead collaborator just yields the
//! worst-case value.

use serde::{Deserialize, Serialize};

/// On-chain verification verdict for one candidate.
///
/// Risk flags are `Option<bool>`: `None` means "unknown", which downstream
/// strategy logic treats as unsafe. A degraded report (timeout, transport
/// failure) is all-unknown with zero confidence, never all-safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierReport {
    pub honeypot: Option<bool>,
    pub lp_locked: Option<bool>,
    pub mintable: Option<bool>,
    /// Largest non-pool holder's share of supply, in percent
    pub dev_concentration_pct: Option<f64>,
    pub buy_tax_pct: Option<f64>,
    pub sell_tax_pct: Option<f64>,
    /// How much the verifier trusts its own flags, 0.0 - 1.0
    pub confidence: f64,
}

impl VerifierReport {
    /// Fail-closed fallback when the verifier is unreachable or timed out.
    pub fn degraded() -> Self {
        Self {
            honeypot: None,
            lp_locked: None,
            mintable: None,
            dev_concentration_pct: None,
            buy_tax_pct: None,
            sell_tax_pct: None,
            confidence: 0.0,
        }
    }

    /// Combined round-trip tax, when both sides are known.
    pub fn total_tax_pct(&self) -> Option<f64> {
        Some(self.buy_tax_pct? + self.sell_tax_pct?)
    }
}

/// Sentiment label attached by the AI scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Neutral,
    Bearish,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Bullish => "bullish",
            Sentiment::Neutral => "neutral",
            Sentiment::Bearish => "bearish",
        }
    }
}

/// AI score for one candidate. Produced once per candidate per cache-TTL
/// window; consumed by the strategy engine and then dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Probability this is a rug or scam, 0.0 - 1.0
    pub scam_probability: f64,
    /// Viral upside estimate, 0 - 100
    pub meme_potential: f64,
    pub sentiment: Sentiment,
    /// Model self-reported confidence, 0.0 - 1.0
    pub confidence: f64,
    /// Short human-readable summary for the alert body
    pub summary: String,
    /// Model-flagged risk markers (e.g. "copy_paste_website")
    pub flags: Vec<String>,
}

impl ScoreResult {
    /// Fail-closed sentinel: model unavailable or response unparseable.
    /// Maximum scam probability guarantees every strategy rejects.
    pub fn fail_closed(reason: impl Into<String>) -> Self {
        Self {
            scam_probability: 1.0,
            meme_potential: 0.0,
            sentiment: Sentiment::Bearish,
            confidence: 0.0,
            summary: format!("AI scoring unavailable: {}", reason.into()),
            flags: vec!["ai_unavailable".to_string()],
        }
    }

    /// Clamp model output into documented ranges. LLMs occasionally return
    /// 150/100 enthusiasm.
    pub fn clamped(mut self) -> Self {
        self.scam_probability = self.scam_probability.clamp(0.0, 1.0);
        self.meme_potential = self.meme_potential.clamp(0.0, 100.0);
        self.confidence = self.confidence.clamp(0.0, 1.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_degraded_report_is_all_unknown() {
        let report = VerifierReport::degraded();
        assert_eq!(report.honeypot, None);
        assert_eq!(report.lp_locked, None);
        assert_eq!(report.mintable, None);
        assert_relative_eq!(report.confidence, 0.0);
    }

    #[test]
    fn test_total_tax_requires_both_sides() {
        let mut report = VerifierReport::degraded();
        report.buy_tax_pct = Some(3.0);
        assert!(report.total_tax_pct().is_none());

        report.sell_tax_pct = Some(4.5);
        assert_relative_eq!(report.total_tax_pct().unwrap(), 7.5);
    }

    #[test]
    fn test_fail_closed_score() {
        let score = ScoreResult::fail_closed("timeout");
        assert_relative_eq!(score.scam_probability, 1.0);
        assert_relative_eq!(score.meme_potential, 0.0);
        assert_eq!(score.sentiment, Sentiment::Bearish);
        assert!(score.flags.contains(&"ai_unavailable".to_string()));
    }

    #[test]
    fn test_clamping() {
        let score = ScoreResult {
            scam_probability: 1.7,
            meme_potential: 150.0,
            sentiment: Sentiment::Bullish,
            confidence: -0.2,
            summary: String::new(),
            flags: vec![],
        }
        .clamped();

        assert_relative_eq!(score.scam_probability, 1.0);
        assert_relative_eq!(score.meme_potential, 100.0);
        assert_relative_eq!(score.confidence, 0.0);
    }
}
