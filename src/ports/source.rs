//! Candidate Source Port
//!
//! Boundary over the exchange discovery feed. Implementations pull a batch
//! of new listings per call; an empty batch is a normal outcome, not an
//! error. The scraping transport behind the feed is an external collaborator.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Candidate;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Rate limited by feed: {0}")]
    RateLimited(String),
    #[error("Feed response unparseable: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Http(err.to_string())
    }
}

/// Periodic pull of raw token-listing records.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch the current batch of new listings. Order is not meaningful.
    async fn fetch_new(&self) -> Result<Vec<Candidate>, SourceError>;
}
