//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config.toml
//! structure. Secrets (bot tokens, API keys) prefer environment variables
//! over file values so config files stay committable.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::FilterConfig;
use crate::strategy::StrategyParams;

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scanner: ScannerSection,
    #[serde(default)]
    pub filters: FiltersSection,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub verifier: VerifierSection,
    pub ai: AiSection,
    #[serde(default)]
    pub strategies: StrategiesSection,
    #[serde(default)]
    pub alerts: AlertsSection,
    #[serde(default)]
    pub journal: JournalSection,
    pub logging: LoggingSection,
}

/// Scanner loop configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ScannerSection {
    /// Seconds between poll cycles
    pub poll_interval_secs: u64,
    /// DexScreener search query, e.g. "new" or a chain slug
    pub search_query: String,
    /// Override the DexScreener base URL (mainly for tests)
    #[serde(default)]
    pub dexscreener_url: Option<String>,
    /// Candidates evaluated concurrently within one cycle
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// HTTP timeout for feed requests
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

fn default_max_concurrency() -> usize {
    4
}

fn default_http_timeout() -> u64 {
    10
}

/// Fast-filter thresholds section
#[derive(Debug, Clone, Deserialize)]
pub struct FiltersSection {
    /// Chain slugs the pipeline evaluates
    pub chains: Vec<String>,
    /// Pairs younger than this are skipped (feed data unreliable)
    pub min_age_minutes: f64,
    /// Minimum pool liquidity in USD
    pub min_liquidity_usd: f64,
    /// Minimum 24h volume in USD (0 disables the check)
    #[serde(default)]
    pub min_volume_24h_usd: f64,
    /// Symbols rejected outright
    #[serde(default)]
    pub symbol_blacklist: Vec<String>,
}

impl Default for FiltersSection {
    fn default() -> Self {
        let d = FilterConfig::default();
        Self {
            chains: d.supported_chains.into_iter().collect(),
            min_age_minutes: d.min_age_minutes,
            min_liquidity_usd: d.min_liquidity_usd,
            min_volume_24h_usd: d.min_volume_24h_usd,
            symbol_blacklist: Vec::new(),
        }
    }
}

/// Dedup cache section
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// TTL for fast-filter rejects, in seconds
    pub reject_ttl_secs: u64,
    /// TTL for strategy verdicts, in seconds
    pub verdict_ttl_secs: u64,
    /// Upper bound on cached tokens before oldest-first eviction
    #[serde(default = "default_cache_entries")]
    pub max_entries: usize,
}

fn default_cache_entries() -> usize {
    10_000
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            reject_ttl_secs: 3_600,
            verdict_ttl_secs: 86_400,
            max_entries: default_cache_entries(),
        }
    }
}

/// On-chain verifier section
#[derive(Debug, Clone, Deserialize)]
pub struct VerifierSection {
    /// Override the GoPlus base URL (mainly for tests)
    #[serde(default)]
    pub goplus_url: Option<String>,
    /// API key; prefer the GOPLUS_API_KEY environment variable
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

impl VerifierSection {
    /// Get API key with environment variable override.
    /// Checks GOPLUS_API_KEY env var first, falls back to config value.
    pub fn get_api_key(&self) -> Option<String> {
        if let Ok(key) = std::env::var("GOPLUS_API_KEY") {
            if !key.is_empty() {
                return Some(key);
            }
        }
        self.api_key.clone().filter(|k| !k.is_empty())
    }
}

impl Default for VerifierSection {
    fn default() -> Self {
        Self {
            goplus_url: None,
            api_key: None,
            timeout_secs: default_http_timeout(),
        }
    }
}

/// AI scorer section
#[derive(Debug, Clone, Deserialize)]
pub struct AiSection {
    /// OpenAI-compatible base URL; DeepSeek when unset
    #[serde(default)]
    pub base_url: Option<String>,
    /// Model name; provider default when unset
    #[serde(default)]
    pub model: Option<String>,
    /// API key; prefer the AI_API_KEY environment variable
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
}

fn default_ai_timeout() -> u64 {
    30
}

impl AiSection {
    /// Get API key with environment variable override.
    /// Checks AI_API_KEY env var first, falls back to config value.
    pub fn get_api_key(&self) -> Option<String> {
        if let Ok(key) = std::env::var("AI_API_KEY") {
            if !key.is_empty() {
                return Some(key);
            }
        }
        self.api_key.clone().filter(|k| !k.is_empty())
    }
}

/// One strategy's rule set
#[derive(Debug, Clone, Deserialize)]
pub struct StrategySection {
    pub allow_mintable: bool,
    pub min_ai_score_if_mintable: f64,
    pub max_scam_probability: f64,
    pub min_verifier_confidence: f64,
    pub fixed_balance_usd: f64,
}

impl StrategySection {
    fn from_params(params: &StrategyParams) -> Self {
        Self {
            allow_mintable: params.allow_mintable,
            min_ai_score_if_mintable: params.min_ai_score_if_mintable,
            max_scam_probability: params.max_scam_probability,
            min_verifier_confidence: params.min_verifier_confidence,
            fixed_balance_usd: params.fixed_balance_usd,
        }
    }

    fn into_params(self, name: &str) -> StrategyParams {
        StrategyParams {
            name: name.to_string(),
            allow_mintable: self.allow_mintable,
            min_ai_score_if_mintable: self.min_ai_score_if_mintable,
            max_scam_probability: self.max_scam_probability,
            min_verifier_confidence: self.min_verifier_confidence,
            fixed_balance_usd: self.fixed_balance_usd,
        }
    }
}

/// Both strategies; defaults mirror the built-in rule sets
#[derive(Debug, Clone, Deserialize)]
pub struct StrategiesSection {
    #[serde(default = "default_safe_shield")]
    pub safe_shield: StrategySection,
    #[serde(default = "default_degen_sword")]
    pub degen_sword: StrategySection,
}

fn default_safe_shield() -> StrategySection {
    StrategySection::from_params(&StrategyParams::safe_shield())
}

fn default_degen_sword() -> StrategySection {
    StrategySection::from_params(&StrategyParams::degen_sword())
}

impl Default for StrategiesSection {
    fn default() -> Self {
        Self {
            safe_shield: default_safe_shield(),
            degen_sword: default_degen_sword(),
        }
    }
}

/// Alerts configuration section (optional)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AlertsSection {
    /// Enable Telegram notifications
    #[serde(default)]
    pub telegram_enabled: bool,
    /// Telegram bot token; prefer the TELEGRAM_BOT_TOKEN env var
    #[serde(default)]
    pub telegram_bot_token: String,
    /// Telegram chat ID; prefer the TELEGRAM_CHAT_ID env var
    #[serde(default)]
    pub telegram_chat_id: String,
    /// Send retry attempts before an alert is dropped
    #[serde(default = "default_send_attempts")]
    pub send_attempts: u32,
}

fn default_send_attempts() -> u32 {
    2
}

impl AlertsSection {
    pub fn get_bot_token(&self) -> String {
        std::env::var("TELEGRAM_BOT_TOKEN").unwrap_or_else(|_| self.telegram_bot_token.clone())
    }

    pub fn get_chat_id(&self) -> String {
        std::env::var("TELEGRAM_CHAT_ID").unwrap_or_else(|_| self.telegram_chat_id.clone())
    }
}

/// Event journal section
#[derive(Debug, Clone, Deserialize)]
pub struct JournalSection {
    /// JSONL file path; supports ~ expansion
    pub path: String,
}

impl Default for JournalSection {
    fn default() -> Self {
        Self {
            path: "logs/events.jsonl".to_string(),
        }
    }
}

impl JournalSection {
    /// Journal path with ~ and environment variables expanded
    pub fn expanded_path(&self) -> String {
        shellexpand::tilde(&self.path).into_owned()
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scanner.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "poll_interval_secs must be > 0".to_string(),
            ));
        }

        if self.scanner.search_query.is_empty() {
            return Err(ConfigError::ValidationError(
                "search_query cannot be empty".to_string(),
            ));
        }

        if self.scanner.max_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "max_concurrency must be > 0".to_string(),
            ));
        }

        if self.filters.chains.is_empty() {
            return Err(ConfigError::ValidationError(
                "filters.chains cannot be empty".to_string(),
            ));
        }

        if self.filters.min_liquidity_usd < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "min_liquidity_usd must be >= 0, got {}",
                self.filters.min_liquidity_usd
            )));
        }

        if self.cache.reject_ttl_secs == 0 || self.cache.verdict_ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "cache TTLs must be > 0".to_string(),
            ));
        }

        if self.cache.verdict_ttl_secs < self.cache.reject_ttl_secs {
            return Err(ConfigError::ValidationError(format!(
                "verdict_ttl_secs ({}) must be >= reject_ttl_secs ({})",
                self.cache.verdict_ttl_secs, self.cache.reject_ttl_secs
            )));
        }

        for (name, section) in [
            ("safe_shield", &self.strategies.safe_shield),
            ("degen_sword", &self.strategies.degen_sword),
        ] {
            section
                .clone()
                .into_params(name)
                .validate()
                .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        }

        if self.alerts.telegram_enabled
            && self.alerts.get_bot_token().is_empty()
        {
            return Err(ConfigError::ValidationError(
                "telegram enabled but no bot token in config or TELEGRAM_BOT_TOKEN".to_string(),
            ));
        }

        Ok(())
    }

    /// Poll interval as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.scanner.poll_interval_secs)
    }

    pub fn reject_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.reject_ttl_secs)
    }

    pub fn verdict_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.verdict_ttl_secs)
    }

    /// Strategy parameter sets in evaluation order
    pub fn strategy_params(&self) -> Vec<StrategyParams> {
        vec![
            self.strategies.safe_shield.clone().into_params("safe_shield"),
            self.strategies.degen_sword.clone().into_params("degen_sword"),
        ]
    }
}

// Conversion from the filters section to the cascade's config
impl From<&FiltersSection> for FilterConfig {
    fn from(section: &FiltersSection) -> Self {
        FilterConfig {
            supported_chains: section
                .chains
                .iter()
                .map(|c| c.to_lowercase())
                .collect::<HashSet<_>>(),
            min_age_minutes: section.min_age_minutes,
            min_liquidity_usd: section.min_liquidity_usd,
            min_volume_24h_usd: section.min_volume_24h_usd,
            symbol_blacklist: section
                .symbol_blacklist
                .iter()
                .map(|s| s.to_uppercase())
                .collect::<HashSet<_>>(),
        }
    }
}
