//! Alert Sink Port
//!
//! Outbound notification boundary. The pipeline only produces `Alert`
//! values; formatting templates and delivery transport are the sink's
//! business. Sends must not block the pipeline indefinitely - the
//! dispatcher wraps sinks in bounded retry with drop-and-log.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ScoreResult, TokenId};

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
    #[error("Sink not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for AlertError {
    fn from(err: reqwest::Error) -> Self {
        AlertError::Delivery(err.to_string())
    }
}

/// One accept notification, or a paper-trade lifecycle update.
#[derive(Debug, Clone)]
pub enum Alert {
    /// A strategy accepted a candidate
    Accept(AcceptAlert),
    /// A paper position hit a take-profit level or closed
    TradeUpdate(TradeUpdateAlert),
}

#[derive(Debug, Clone)]
pub struct AcceptAlert {
    pub strategy: String,
    pub token: TokenId,
    pub symbol: String,
    pub name: String,
    pub liquidity_usd: Option<f64>,
    pub allocation_usd: f64,
    pub score: ScoreResult,
    pub links: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TradeUpdateAlert {
    pub strategy: String,
    pub symbol: String,
    /// "tp_30_pct", "stop_loss_30_pct", "time_exit_stagnant"
    pub event: String,
    pub realized_pnl_usd: f64,
}

#[async_trait]
pub trait AlertSink: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, alert: &Alert) -> Result<(), AlertError>;
}

/// Sink used when alerting is disabled; accepts everything silently.
pub struct NoopSink;

#[async_trait]
impl AlertSink for NoopSink {
    fn name(&self) -> &str {
        "noop"
    }

    async fn send(&self, _alert: &Alert) -> Result<(), AlertError> {
        Ok(())
    }
}

/// Sink that writes alerts to the process log instead of delivering them.
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, alert: &Alert) -> Result<(), AlertError> {
        tracing::info!(?alert, "alert");
        Ok(())
    }
}
