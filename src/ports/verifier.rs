//! On-Chain Verifier Port
//!
//! Boundary over contract security checks (honeypot, LP lock, mintability,
//! holder concentration). The pipeline, not the implementation, owns the
//! retry-then-degrade policy: a verifier that cannot answer yields
//! `VerifierReport::degraded()` so strategies can fail closed on values
//! instead of branching on error types.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Candidate, VerifierReport};

#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Verification timed out after {0} s")]
    Timeout(u64),
    #[error("Chain not supported by verifier: {0}")]
    UnsupportedChain(String),
    #[error("Verifier response unparseable: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for VerifierError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            VerifierError::Timeout(0)
        } else {
            VerifierError::Http(err.to_string())
        }
    }
}

#[async_trait]
pub trait OnChainVerifier: Send + Sync {
    fn name(&self) -> &str;

    /// Check one candidate's contract. Must complete within the configured
    /// timeout; callers map failures to a degraded report.
    async fn verify(&self, candidate: &Candidate) -> Result<VerifierReport, VerifierError>;
}

/// Fixed-answer verifier for tests and dry runs.
pub struct StubVerifier {
    report: VerifierReport,
}

impl StubVerifier {
    pub fn new(report: VerifierReport) -> Self {
        Self { report }
    }

    /// A stub that calls everything clean with high confidence.
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
}

#[async_trait]
impl OnChainVerifier for StubVerifier {
    fn name(&self) -> &str {
        "stub"
    }

    async fn verify(&self, _candidate: &Candidate) -> Result<VerifierReport, VerifierError> {
        Ok(self.report.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TokenId;

    fn candidate() -> Candidate {
        Candidate {
            id: TokenId::new("solana", "mint"),
            symbol: "X".to_string(),
            name: "X".to_string(),
            pair_address: "p".to_string(),
            price_usd: None,
            liquidity_usd: None,
            volume_24h_usd: None,
            market_cap_usd: None,
            pair_created_at_ms: None,
            buys_h1: None,
            sells_h1: None,
            mintable: None,
            links: vec![],
        }
    }

    #[tokio::test]
    async fn test_stub_verifier_returns_fixed_report() {
        let verifier = StubVerifier::all_clear();
        let report = verifier.verify(&candidate()).await.unwrap();
        assert_eq!(report.honeypot, Some(false));
        assert_eq!(report.lp_locked, Some(true));
    }
}
