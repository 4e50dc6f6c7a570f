//! Event Journal Port
//!
//! Append-only audit boundary. Every terminal decision - per-strategy
//! verdicts and fast-filter rejects - becomes one record. The core's
//! responsibility ends at producing the record; durability and schema are
//! the backend's business. Journal failures are logged, never fatal.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{RejectReason, TokenId};
use crate::strategy::StrategyVerdict;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Journal write failed: {0}")]
    Write(String),
}

impl From<std::io::Error> for JournalError {
    fn from(err: std::io::Error) -> Self {
        JournalError::Write(err.to_string())
    }
}

/// One row in the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JournalRecord {
    /// A candidate died in the fast filter
    FilterReject {
        token: TokenId,
        symbol: String,
        reason: String,
        at: DateTime<Utc>,
    },
    /// A strategy produced a verdict
    Verdict(StrategyVerdict),
    /// A paper-trade lifecycle event
    PaperTrade {
        strategy: String,
        symbol: String,
        event: String,
        realized_pnl_usd: f64,
        at: DateTime<Utc>,
    },
}

impl JournalRecord {
    pub fn filter_reject(token: TokenId, symbol: String, reason: RejectReason) -> Self {
        JournalRecord::FilterReject {
            token,
            symbol,
            reason: reason.as_str().to_string(),
            at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait EventJournal: Send + Sync {
    async fn append(&self, record: &JournalRecord) -> Result<(), JournalError>;
}
