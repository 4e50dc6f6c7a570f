//! AI Scorer
//!
//! Talks to an OpenAI-compatible chat completions endpoint (DeepSeek by
//! default) and asks for a strict-JSON risk assessment of a candidate.
//! The model reply is parsed defensively and clamped before it is
//! allowed anywhere near the strategy engine.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::domain::{Candidate, ScoreResult, Sentiment, VerifierReport};
use crate::ports::scorer::{AiScorer, ScorerError};

const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
const DEFAULT_MODEL: &str = "deepseek-chat";

const SYSTEM_PROMPT: &str = "You are a crypto memecoin risk analyst. \
Respond with a single JSON object and nothing else, using exactly these keys: \
scam_probability (0.0-1.0), meme_potential (0-100), sentiment (one of \
\"bullish\", \"neutral\", \"bearish\"), confidence (0.0-1.0), \
summary (one sentence), flags (array of short strings).";

pub struct OpenAiScorer {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// The JSON shape we instruct the model to emit.
#[derive(Debug, Serialize, Deserialize)]
struct ModelAssessment {
    scam_probability: f64,
    meme_potential: f64,
    #[serde(default)]
    sentiment: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    flags: Vec<String>,
}

impl OpenAiScorer {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, ScorerError> {
        if api_key.trim().is_empty() {
            return Err(ScorerError::NotConfigured(
                "ai api key is required".to_string(),
            ));
        }
        let http = Client::builder()
            .user_agent("gemscout/0.1")
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ScorerError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key,
        })
    }

    fn build_prompt(candidate: &Candidate, report: &VerifierReport) -> String {
        let age = candidate
            .age_minutes(chrono::Utc::now())
            .map_or("unknown".to_string(), |m| format!("{m:.0} min"));
        format!(
            "Assess this newly listed token.\n\
             symbol: {}\nname: {}\nchain: {}\nliquidity_usd: {:.0}\n\
             volume_24h_usd: {:.0}\nage: {}\nbuys_h1: {}\nsells_h1: {}\n\
             verifier: honeypot={:?} lp_locked={:?} mintable={:?} \
             total_tax_pct={:?} top_holder_pct={:?} confidence={:.2}",
            candidate.symbol,
            candidate.name,
            candidate.id.chain,
            candidate.liquidity_usd.unwrap_or(0.0),
            candidate.volume_24h_usd.unwrap_or(0.0),
            age,
            candidate.buys_h1.unwrap_or(0),
            candidate.sells_h1.unwrap_or(0),
            report.honeypot,
            report.lp_locked,
            report.mintable,
            report.total_tax_pct(),
            report.dev_concentration_pct,
            report.confidence,
        )
    }
}

/// Models still wrap JSON in markdown fences often enough to matter.
fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

fn parse_assessment(raw: &str) -> Result<ScoreResult, ScorerError> {
    let body = strip_fences(raw);
    let assessment: ModelAssessment = serde_json::from_str(body)
        .map_err(|e| ScorerError::Malformed(format!("{e}: {body}")))?;

    let sentiment = match assessment.sentiment.as_deref() {
        Some("bullish") => Sentiment::Bullish,
        Some("bearish") => Sentiment::Bearish,
        _ => Sentiment::Neutral,
    };

    Ok(ScoreResult {
        scam_probability: assessment.scam_probability,
        meme_potential: assessment.meme_potential,
        sentiment,
        confidence: assessment.confidence.unwrap_or(0.5),
        summary: assessment.summary.unwrap_or_default(),
        flags: assessment.flags,
    }
    .clamped())
}

#[async_trait]
impl AiScorer for OpenAiScorer {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn score(
        &self,
        candidate: &Candidate,
        report: &VerifierReport,
    ) -> Result<ScoreResult, ScorerError> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = json!({
            "model": self.model,
            "temperature": 0.2,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": Self::build_prompt(candidate, report)},
            ],
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ScorerError::Http(e.to_string()))?;

        if response.status().as_u16() == 429 {
            return Err(ScorerError::QuotaExhausted(
                "model api returned 429".to_string(),
            ));
        }
        if !response.status().is_success() {
            return Err(ScorerError::Http(format!(
                "status {}",
                response.status()
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ScorerError::Malformed(e.to_string()))?;
        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| ScorerError::Malformed("empty choices".to_string()))?;

        let result = parse_assessment(content)?;
        debug!(
            token = %candidate.id,
            scam = result.scam_probability,
            potential = result.meme_potential,
            "ai score"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_plain_json() {
        let raw = r#"{"scam_probability": 0.2, "meme_potential": 85,
            "sentiment": "bullish", "confidence": 0.8,
            "summary": "strong community", "flags": ["new_deployer"]}"#;
        let result = parse_assessment(raw).unwrap();
        assert_relative_eq!(result.scam_probability, 0.2);
        assert_relative_eq!(result.meme_potential, 85.0);
        assert_eq!(result.sentiment, Sentiment::Bullish);
        assert_eq!(result.flags, vec!["new_deployer".to_string()]);
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "```json\n{\"scam_probability\": 0.9, \"meme_potential\": 10}\n```";
        let result = parse_assessment(raw).unwrap();
        assert_relative_eq!(result.scam_probability, 0.9);
        assert_eq!(result.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let raw = r#"{"scam_probability": 1.7, "meme_potential": 140, "confidence": -0.5}"#;
        let result = parse_assessment(raw).unwrap();
        assert_relative_eq!(result.scam_probability, 1.0);
        assert_relative_eq!(result.meme_potential, 100.0);
        assert_relative_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_garbage_reply_is_malformed() {
        let err = parse_assessment("sorry, I cannot help with that").unwrap_err();
        assert!(matches!(err, ScorerError::Malformed(_)));
    }

    #[test]
    fn test_unknown_sentiment_defaults_neutral() {
        let raw = r#"{"scam_probability": 0.1, "meme_potential": 50, "sentiment": "euphoric"}"#;
        let result = parse_assessment(raw).unwrap();
        assert_eq!(result.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let err = OpenAiScorer::new("  ".to_string(), None, None, 30).err();
        assert!(matches!(err, Some(ScorerError::NotConfigured(_))));
    }
}
