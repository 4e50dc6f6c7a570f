//! DexScreener Candidate Source
//!
//! Pulls fresh pair listings from the DexScreener public API and normalizes
//! them into `Candidate` snapshots. The free tier is strictly rate limited,
//! so every call goes through a minimum-interval limiter; the scheduler's
//! bounded concurrency keeps the burst shape sane on top of that.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::{Candidate, TokenId};
use crate::ports::source::{CandidateSource, SourceError};

const DEFAULT_BASE_URL: &str = "https://api.dexscreener.com/latest/dex";
const MIN_REQUEST_INTERVAL_MS: u64 = 1_000;

/// Minimum-interval rate limiter. One permit at a time, spaced at least
/// `interval` apart.
struct RateLimiter {
    last_call: Mutex<Option<Instant>>,
    interval: Duration,
}

impl RateLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            last_call: Mutex::new(None),
            interval,
        }
    }

    async fn acquire(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    pairs: Option<Vec<PairData>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PairData {
    chain_id: Option<String>,
    pair_address: Option<String>,
    base_token: Option<BaseToken>,
    /// DexScreener serializes price as a string
    price_usd: Option<String>,
    liquidity: Option<LiquidityData>,
    volume: Option<VolumeData>,
    market_cap: Option<f64>,
    fdv: Option<f64>,
    pair_created_at: Option<i64>,
    txns: Option<TxnsData>,
    info: Option<InfoData>,
}

#[derive(Debug, Deserialize)]
struct BaseToken {
    address: Option<String>,
    name: Option<String>,
    symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LiquidityData {
    usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct VolumeData {
    h24: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TxnsData {
    h1: Option<TxnWindow>,
}

#[derive(Debug, Deserialize)]
struct TxnWindow {
    buys: Option<u64>,
    sells: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct InfoData {
    #[serde(default)]
    websites: Vec<LinkData>,
    #[serde(default)]
    socials: Vec<LinkData>,
}

#[derive(Debug, Deserialize)]
struct LinkData {
    url: Option<String>,
}

impl PairData {
    /// Normalize one wire pair into a candidate. Pairs without a chain or
    /// base address are unusable and dropped here; everything else missing
    /// stays `None` for the fast filter to judge.
    fn into_candidate(self) -> Option<Candidate> {
        let chain = self.chain_id?;
        let base = self.base_token?;
        let address = base.address?;

        let links = self
            .info
            .map(|info| {
                info.websites
                    .into_iter()
                    .chain(info.socials)
                    .filter_map(|l| l.url)
                    .collect()
            })
            .unwrap_or_default();

        Some(Candidate {
            id: TokenId::new(chain, address),
            symbol: base.symbol.unwrap_or_default(),
            name: base.name.unwrap_or_default(),
            pair_address: self.pair_address.unwrap_or_default(),
            price_usd: self.price_usd.and_then(|p| p.parse().ok()),
            liquidity_usd: self.liquidity.and_then(|l| l.usd),
            volume_24h_usd: self.volume.and_then(|v| v.h24),
            market_cap_usd: self.market_cap.or(self.fdv),
            pair_created_at_ms: self.pair_created_at,
            buys_h1: self.txns.as_ref().and_then(|t| t.h1.as_ref()).and_then(|w| w.buys),
            sells_h1: self.txns.as_ref().and_then(|t| t.h1.as_ref()).and_then(|w| w.sells),
            // The feed does not expose mint authority; the verifier does.
            mintable: None,
            links,
        })
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Refreshes market data for already-discovered pairs (paper book updates).
#[async_trait]
pub trait PairRefresher: Send + Sync {
    async fn fetch_market_cap(
        &self,
        chain: &str,
        pair_address: &str,
    ) -> Result<Option<f64>, SourceError>;
}

pub struct DexScreenerSource {
    http: Client,
    base_url: String,
    /// Broad search term used to surface active fresh pairs
    search_query: String,
    limiter: RateLimiter,
}

impl DexScreenerSource {
    pub fn new(base_url: Option<String>, search_query: String, timeout_secs: u64) -> Result<Self, SourceError> {
        let http = Client::builder()
            .user_agent("gemscout/0.1")
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SourceError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            search_query,
            limiter: RateLimiter::new(Duration::from_millis(MIN_REQUEST_INTERVAL_MS)),
        })
    }

    async fn get_pairs(&self, url: &str) -> Result<Vec<PairData>, SourceError> {
        self.limiter.acquire().await;
        let response = self.http.get(url).send().await?;

        if response.status().as_u16() == 429 {
            return Err(SourceError::RateLimited(url.to_string()));
        }
        let response = response
            .error_for_status()
            .map_err(|e| SourceError::Http(e.to_string()))?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;
        Ok(body.pairs.unwrap_or_default())
    }
}

#[async_trait]
impl CandidateSource for DexScreenerSource {
    fn name(&self) -> &str {
        "dexscreener"
    }

    async fn fetch_new(&self) -> Result<Vec<Candidate>, SourceError> {
        let url = format!("{}/search?q={}", self.base_url, self.search_query);
        let pairs = self.get_pairs(&url).await?;

        let total = pairs.len();
        let candidates: Vec<Candidate> = pairs
            .into_iter()
            .filter_map(PairData::into_candidate)
            .collect();

        if candidates.len() < total {
            debug!(
                dropped = total - candidates.len(),
                "dropped pairs missing chain/address"
            );
        }
        Ok(candidates)
    }
}

#[async_trait]
impl PairRefresher for DexScreenerSource {
    async fn fetch_market_cap(
        &self,
        chain: &str,
        pair_address: &str,
    ) -> Result<Option<f64>, SourceError> {
        let url = format!("{}/pairs/{}/{}", self.base_url, chain, pair_address);
        match self.get_pairs(&url).await {
            Ok(pairs) => Ok(pairs
                .into_iter()
                .next()
                .and_then(|p| p.into_candidate())
                .and_then(|c| c.market_cap_or_estimate())),
            Err(err) => {
                warn!(%chain, %pair_address, error = %err, "pair refresh failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAIR: &str = r#"{
        "chainId": "solana",
        "pairAddress": "PairAddr999",
        "baseToken": {"address": "MintAddr999", "name": "Moon Cat", "symbol": "MCAT"},
        "priceUsd": "0.00042",
        "liquidity": {"usd": 18000.5},
        "volume": {"h24": 92000.0},
        "marketCap": 450000.0,
        "pairCreatedAt": 1700000000000,
        "txns": {"h1": {"buys": 55, "sells": 21}},
        "info": {"websites": [{"url": "https://mooncat.example"}], "socials": [{"url": "https://t.me/mooncat"}]}
    }"#;

    #[test]
    fn test_pair_parses_into_candidate() {
        let pair: PairData = serde_json::from_str(SAMPLE_PAIR).unwrap();
        let c = pair.into_candidate().unwrap();

        assert_eq!(c.id, TokenId::new("solana", "MintAddr999"));
        assert_eq!(c.symbol, "MCAT");
        assert_eq!(c.price_usd, Some(0.00042));
        assert_eq!(c.liquidity_usd, Some(18_000.5));
        assert_eq!(c.volume_24h_usd, Some(92_000.0));
        assert_eq!(c.market_cap_usd, Some(450_000.0));
        assert_eq!(c.buys_h1, Some(55));
        assert_eq!(c.sells_h1, Some(21));
        assert_eq!(c.links.len(), 2);
        assert_eq!(c.mintable, None);
    }

    #[test]
    fn test_pair_without_address_dropped() {
        let pair: PairData =
            serde_json::from_str(r#"{"chainId": "solana", "baseToken": {"symbol": "X"}}"#).unwrap();
        assert!(pair.into_candidate().is_none());
    }

    #[test]
    fn test_sparse_pair_keeps_nones() {
        let pair: PairData = serde_json::from_str(
            r#"{"chainId": "bsc", "baseToken": {"address": "0xabc", "symbol": "Y"}}"#,
        )
        .unwrap();
        let c = pair.into_candidate().unwrap();
        assert!(c.liquidity_usd.is_none());
        assert!(c.pair_created_at_ms.is_none());
        assert!(c.links.is_empty());
    }

    #[test]
    fn test_fdv_fallback_for_market_cap() {
        let pair: PairData = serde_json::from_str(
            r#"{"chainId": "bsc", "baseToken": {"address": "0xabc"}, "fdv": 77000.0}"#,
        )
        .unwrap();
        assert_eq!(pair.into_candidate().unwrap().market_cap_usd, Some(77_000.0));
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_calls() {
        let limiter = RateLimiter::new(Duration::from_millis(30));
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
