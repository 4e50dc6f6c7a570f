//! GoPlus On-Chain Verifier
//!
//! Fetches contract security data from the GoPlus Labs token_security API
//! and normalizes it into a `VerifierReport`. GoPlus speaks in stringly
//! typed flags ("1"/"0") and fractional percentages, so the parser is
//! defensive: any field it cannot read stays `None` (unknown), and the
//! report's confidence reflects how much actually parsed.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::domain::{Candidate, VerifierReport};
use crate::ports::verifier::{OnChainVerifier, VerifierError};

const DEFAULT_BASE_URL: &str = "https://api.gopluslabs.io/api/v1";

/// DexScreener chain slug -> GoPlus chain id.
fn chain_map() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("ethereum", "1"),
        ("bsc", "56"),
        ("arbitrum", "42161"),
        ("polygon", "137"),
        ("base", "8453"),
        ("optimism", "10"),
        ("avalanche", "43114"),
        ("fantom", "250"),
        ("solana", "solana"),
    ])
}

pub struct GoPlusVerifier {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl GoPlusVerifier {
    pub fn new(
        base_url: Option<String>,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, VerifierError> {
        let http = Client::builder()
            .user_agent("gemscout/0.1")
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| VerifierError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: api_key.filter(|k| !k.is_empty()),
            timeout_secs,
        })
    }

    fn endpoint(&self, goplus_chain: &str, address: &str) -> String {
        // Solana has its own endpoint shape.
        if goplus_chain == "solana" {
            format!(
                "{}/solana/token_security?contract_addresses={}",
                self.base_url, address
            )
        } else {
            format!(
                "{}/token_security/{}?contract_addresses={}",
                self.base_url, goplus_chain, address
            )
        }
    }
}

/// "1"/"0" string flags, with booleans and numbers tolerated.
fn parse_flag(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::String(s) => match s.as_str() {
            "1" => Some(true),
            "0" => Some(false),
            _ => None,
        },
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64()? != 0.0),
        _ => None,
    }
}

fn parse_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Normalize a GoPlus token record into a report. EVM taxes arrive as
/// fractions (0.05 = 5%); Solana taxes arrive already in percent.
fn parse_token_record(record: &Value, goplus_chain: &str) -> VerifierReport {
    let honeypot = parse_flag(record.get("is_honeypot"));
    let mintable = parse_flag(record.get("is_mintable"));

    let tax_scale = if goplus_chain == "solana" { 1.0 } else { 100.0 };
    let buy_tax_pct = parse_number(record.get("buy_tax")).map(|t| t * tax_scale);
    let sell_tax_pct = parse_number(record.get("sell_tax")).map(|t| t * tax_scale);

    // LP lock: count locked LP holder share when reported.
    let lp_locked = record
        .get("lp_holders")
        .and_then(Value::as_array)
        .map(|holders| {
            let locked_pct: f64 = holders
                .iter()
                .filter(|h| parse_flag(h.get("is_locked")).unwrap_or(false))
                .filter_map(|h| parse_number(h.get("percent")))
                .map(|p| p * 100.0)
                .sum();
            locked_pct >= 90.0
        });

    // Largest non-dead holder share. GoPlus percents are 0-1 fractions.
    let dev_concentration_pct = record
        .get("holders")
        .and_then(Value::as_array)
        .and_then(|holders| {
            holders
                .iter()
                .filter_map(|h| parse_number(h.get("percent")))
                .map(|p| if p <= 1.0 { p * 100.0 } else { p })
                .fold(None, |max: Option<f64>, p| {
                    Some(max.map_or(p, |m| m.max(p)))
                })
        });

    // Confidence scales with how many of the core flags actually parsed.
    let known = [
        honeypot.is_some(),
        mintable.is_some(),
        lp_locked.is_some(),
        dev_concentration_pct.is_some(),
    ]
    .iter()
    .filter(|k| **k)
    .count();
    let confidence = match known {
        4 => 0.9,
        3 => 0.7,
        2 => 0.5,
        1 => 0.3,
        _ => 0.0,
    };

    VerifierReport {
        honeypot,
        lp_locked,
        mintable,
        dev_concentration_pct,
        buy_tax_pct,
        sell_tax_pct,
        confidence,
    }
}

#[async_trait]
impl OnChainVerifier for GoPlusVerifier {
    fn name(&self) -> &str {
        "goplus"
    }

    async fn verify(&self, candidate: &Candidate) -> Result<VerifierReport, VerifierError> {
        let chain = candidate.id.chain.as_str();
        let goplus_chain = *chain_map()
            .get(chain)
            .ok_or_else(|| VerifierError::UnsupportedChain(chain.to_string()))?;

        let url = self.endpoint(goplus_chain, &candidate.id.address);
        let mut request = self.http.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", key);
        }
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                VerifierError::Timeout(self.timeout_secs)
            } else {
                VerifierError::Http(e.to_string())
            }
        })?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| VerifierError::Parse(e.to_string()))?;

        if body.get("code").and_then(Value::as_i64) != Some(1) {
            return Err(VerifierError::Parse(format!(
                "goplus code {:?}: {:?}",
                body.get("code"),
                body.get("message")
            )));
        }

        // Result is keyed by address, with inconsistent casing.
        let result = body
            .get("result")
            .and_then(Value::as_object)
            .ok_or_else(|| VerifierError::Parse("missing result map".to_string()))?;
        let addr = &candidate.id.address;
        let record = result
            .get(addr.as_str())
            .or_else(|| result.get(addr.to_lowercase().as_str()))
            .or_else(|| result.get(addr.to_uppercase().as_str()))
            .or_else(|| {
                result
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(addr))
                    .map(|(_, v)| v)
            })
            .ok_or_else(|| VerifierError::Parse(format!("no record for {addr}")))?;

        let report = parse_token_record(record, goplus_chain);
        debug!(token = %candidate.id, confidence = report.confidence, "verifier report");
        Ok(report)
    }
}
