//! Candidate Token Model
//!
//! A `Candidate` is one newly observed token listing as reported by the
//! discovery feed. It is an immutable snapshot: every poll cycle fetches
//! fresh copies rather than mutating old ones. Fields that the feed may
//! omit are `Option`s; the fast filter decides what to do about gaps.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Identifier for a token: chain slug plus contract address.
///
/// This is the dedup-cache key and the journal key. Addresses are stored
/// lowercased so that feeds with inconsistent casing map to one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId {
    pub chain: String,
    pub address: String,
}

impl TokenId {
    pub fn new(chain: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            chain: chain.into().to_lowercase(),
            address: address.into().to_lowercase(),
        }
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain, self.address)
    }
}

/// Snapshot of a newly listed token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Chain + base token contract address
    pub id: TokenId,
    /// Base token symbol (e.g. "BONK")
    pub symbol: String,
    /// Base token name
    pub name: String,
    /// DEX pair address the listing was observed on
    pub pair_address: String,
    /// Last trade price in USD
    pub price_usd: Option<f64>,
    /// Pool liquidity in USD
    pub liquidity_usd: Option<f64>,
    /// 24h trading volume in USD
    pub volume_24h_usd: Option<f64>,
    /// Market cap (or FDV fallback) in USD
    pub market_cap_usd: Option<f64>,
    /// Pair creation time, epoch milliseconds
    pub pair_created_at_ms: Option<i64>,
    /// Buy transactions in the last hour
    pub buys_h1: Option<u64>,
    /// Sell transactions in the last hour
    pub sells_h1: Option<u64>,
    /// Whether the token supply is mintable, if the feed knows
    pub mintable: Option<bool>,
    /// Social / site links attached to the listing
    pub links: Vec<String>,
}

impl Candidate {
    /// Age of the pair at `now`, in minutes. `None` when the feed did not
    /// report a creation time.
    pub fn age_minutes(&self, now: DateTime<Utc>) -> Option<f64> {
        let created_ms = self.pair_created_at_ms?;
        let created = Utc.timestamp_millis_opt(created_ms).single()?;
        Some((now - created).num_seconds() as f64 / 60.0)
    }

    /// Market cap with the original's liquidity-based fallback heuristic.
    pub fn market_cap_or_estimate(&self) -> Option<f64> {
        self.market_cap_usd
            .or_else(|| self.liquidity_usd.map(|l| l * 5.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_candidate() -> Candidate {
        Candidate {
            id: TokenId::new("solana", "MintAddr111"),
            symbol: "TEST".to_string(),
            name: "Test Token".to_string(),
            pair_address: "PairAddr111".to_string(),
            price_usd: Some(0.0001),
            liquidity_usd: Some(25_000.0),
            volume_24h_usd: Some(100_000.0),
            market_cap_usd: None,
            pair_created_at_ms: None,
            buys_h1: Some(40),
            sells_h1: Some(10),
            mintable: Some(false),
            links: vec![],
        }
    }

    #[test]
    fn test_token_id_normalizes_case() {
        let a = TokenId::new("Solana", "ABCdef");
        let b = TokenId::new("solana", "abcdef");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "solana:abcdef");
    }

    #[test]
    fn test_age_minutes() {
        let now = Utc::now();
        let mut c = sample_candidate();
        c.pair_created_at_ms = Some((now - Duration::minutes(10)).timestamp_millis());

        let age = c.age_minutes(now).unwrap();
        assert!((age - 10.0).abs() < 0.1);
    }

    #[test]
    fn test_age_minutes_missing() {
        let c = sample_candidate();
        assert!(c.age_minutes(Utc::now()).is_none());
    }

    #[test]
    fn test_market_cap_fallback() {
        let mut c = sample_candidate();
        assert_eq!(c.market_cap_or_estimate(), Some(125_000.0));

        c.market_cap_usd = Some(1_000_000.0);
        assert_eq!(c.market_cap_or_estimate(), Some(1_000_000.0));

        c.market_cap_usd = None;
        c.liquidity_usd = None;
        assert!(c.market_cap_or_estimate().is_none());
    }
}
