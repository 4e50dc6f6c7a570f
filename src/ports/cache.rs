//! Dedup Cache Port
//!
//! TTL-keyed record of which tokens were already evaluated. The gate sits in
//! front of every expensive step: a live entry short-circuits the pipeline
//! and emits nothing. Backing stores can be in-memory or external (Redis);
//! the core only needs lookup/record with per-key expiry.
//!
//! Writes are last-write-wins and atomic per entry. A store outage degrades
//! to treat-as-miss in the pipeline - redundant work, never a wrong decision.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::TokenId;
use crate::strategy::Decision;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache store unreachable: {0}")]
    Unreachable(String),
    #[error("Cache entry corrupt: {0}")]
    Corrupt(String),
}

/// Terminal state recorded for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachedDecision {
    /// At least one strategy accepted
    Accepted,
    /// Rejected before or during strategy evaluation
    Rejected,
    /// Evaluation started but no terminal decision was committed
    Pending,
}

/// What the cache remembers about one token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub last_seen: DateTime<Utc>,
    pub decision: CachedDecision,
    /// Per-strategy outcome for tokens that reached the engine
    pub outcomes: HashMap<String, Decision>,
}

impl CacheEntry {
    pub fn new(decision: CachedDecision) -> Self {
        Self {
            last_seen: Utc::now(),
            decision,
            outcomes: HashMap::new(),
        }
    }

    pub fn with_outcome(mut self, strategy: impl Into<String>, decision: Decision) -> Self {
        self.outcomes.insert(strategy.into(), decision);
        self
    }
}

#[async_trait]
pub trait DedupCache: Send + Sync {
    /// Fetch the live entry for a token, if any. Expired entries are
    /// logically absent and must not be returned.
    async fn lookup(&self, id: &TokenId) -> Result<Option<CacheEntry>, CacheError>;

    /// Record or overwrite a token's entry with the given TTL.
    async fn record(
        &self,
        id: &TokenId,
        entry: CacheEntry,
        ttl: Duration,
    ) -> Result<(), CacheError>;
}
