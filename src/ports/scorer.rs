//! AI Scorer Port
//!
//! Boundary over the black-box scoring model. Called at most once per
//! candidate per cache-TTL window - the dedup gate enforces that, not the
//! scorer. Failures never propagate past the pipeline: they become
//! `ScoreResult::fail_closed()`.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Candidate, ScoreResult, VerifierReport};

#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Model quota exhausted: {0}")]
    QuotaExhausted(String),
    #[error("Model response malformed: {0}")]
    Malformed(String),
    #[error("Scorer not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for ScorerError {
    fn from(err: reqwest::Error) -> Self {
        ScorerError::Http(err.to_string())
    }
}

#[async_trait]
pub trait AiScorer: Send + Sync {
    fn name(&self) -> &str;

    /// Score one candidate given the verifier's findings.
    async fn score(
        &self,
        candidate: &Candidate,
        report: &VerifierReport,
    ) -> Result<ScoreResult, ScorerError>;
}
