//! Fast Filter Cascade
//!
//! Pure, zero-I/O rejection checks applied to every new candidate before any
//! paid or slow boundary is touched. Checks run cheapest-first and the
//! cascade short-circuits on the first failure. The overwhelming majority of
//! fresh listings die here.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::candidate::Candidate;

/// Stable reason codes for filter rejections. These land in logs, the
/// journal and the dedup cache, so codes never change meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    UnsupportedChain,
    IncompleteData,
    TooYoung,
    LiquidityBelowFloor,
    VolumeBelowFloor,
    SellPressure,
    BlacklistedSymbol,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::UnsupportedChain => "unsupported_chain",
            RejectReason::IncompleteData => "incomplete_data",
            RejectReason::TooYoung => "too_young",
            RejectReason::LiquidityBelowFloor => "liquidity_below_floor",
            RejectReason::VolumeBelowFloor => "volume_below_floor",
            RejectReason::SellPressure => "sell_pressure",
            RejectReason::BlacklistedSymbol => "blacklisted_symbol",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the cascade for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterVerdict {
    Pass,
    Reject(RejectReason),
}

impl FilterVerdict {
    pub fn passed(&self) -> bool {
        matches!(self, FilterVerdict::Pass)
    }
}

/// Thresholds for the cascade. Loaded once from config at startup.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Chain slugs the pipeline is willing to evaluate
    pub supported_chains: HashSet<String>,
    /// Pairs younger than this have unreliable feed data
    pub min_age_minutes: f64,
    /// Minimum pool liquidity in USD
    pub min_liquidity_usd: f64,
    /// Minimum 24h volume in USD (0 disables the check)
    pub min_volume_24h_usd: f64,
    /// Symbols rejected outright (uppercased)
    pub symbol_blacklist: HashSet<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            supported_chains: ["ethereum", "solana", "bsc", "base", "arbitrum"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_age_minutes: 2.0,
            min_liquidity_usd: 10_000.0,
            min_volume_24h_usd: 0.0,
            symbol_blacklist: HashSet::new(),
        }
    }
}

/// The cascade itself. Holds only config; `inspect` is a pure function of
/// its inputs so the same candidate always produces the same verdict.
#[derive(Debug, Clone)]
pub struct FastFilter {
    config: FilterConfig,
}

impl FastFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Run the cascade against one candidate at time `now`.
    ///
    /// Missing required fields reject with `IncompleteData` rather than
    /// panicking or passing by default.
    pub fn inspect(&self, candidate: &Candidate, now: DateTime<Utc>) -> FilterVerdict {
        // 1. Chain gate - no point parsing anything else off-chain-set.
        if !self.config.supported_chains.contains(&candidate.id.chain) {
            return FilterVerdict::Reject(RejectReason::UnsupportedChain);
        }

        // 2. Required fields. Liquidity is the one signal everything
        // downstream keys on; a listing without it is unusable.
        let liquidity = match candidate.liquidity_usd {
            Some(l) => l,
            None => return FilterVerdict::Reject(RejectReason::IncompleteData),
        };
        if candidate.symbol.is_empty() || candidate.id.address.is_empty() {
            return FilterVerdict::Reject(RejectReason::IncompleteData);
        }

        // 3. Age window. Unknown creation time passes; the feed only
        // surfaces fresh pairs, and unknown-age data is handled downstream.
        if let Some(age) = candidate.age_minutes(now) {
            if age < self.config.min_age_minutes {
                return FilterVerdict::Reject(RejectReason::TooYoung);
            }
        }

        // 4. Liquidity floor.
        if liquidity < self.config.min_liquidity_usd {
            return FilterVerdict::Reject(RejectReason::LiquidityBelowFloor);
        }

        // 5. Volume floor (disabled when configured to 0).
        if self.config.min_volume_24h_usd > 0.0 {
            match candidate.volume_24h_usd {
                Some(v) if v >= self.config.min_volume_24h_usd => {}
                Some(_) => return FilterVerdict::Reject(RejectReason::VolumeBelowFloor),
                None => return FilterVerdict::Reject(RejectReason::IncompleteData),
            }
        }

        // 6. Sell-pressure heuristic: more h1 sells than buys means the
        // early holders are already dumping.
        if let (Some(buys), Some(sells)) = (candidate.buys_h1, candidate.sells_h1) {
            if sells > buys {
                return FilterVerdict::Reject(RejectReason::SellPressure);
            }
        }

        // 7. Symbol blacklist.
        if self
            .config
            .symbol_blacklist
            .contains(&candidate.symbol.to_uppercase())
        {
            return FilterVerdict::Reject(RejectReason::BlacklistedSymbol);
        }

        FilterVerdict::Pass
    }
}
