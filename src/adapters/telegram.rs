//! Telegram Alert Sink
//!
//! Formats accept and trade-update alerts as MarkdownV2 and posts them
//! through the Bot API. MarkdownV2 reserves a long list of punctuation,
//! so every dynamic field goes through `escape_markdown` before it is
//! interpolated into a message.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::ports::alerts::{AcceptAlert, Alert, AlertError, AlertSink, TradeUpdateAlert};

const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

pub struct TelegramSink {
    http: Client,
    base_url: String,
    bot_token: String,
    chat_id: String,
}

/// Characters MarkdownV2 requires escaping per the Bot API docs.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '='
            | '|' | '{' | '}' | '.' | '!' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

fn strategy_header(strategy: &str) -> &'static str {
    match strategy {
        "safe_shield" => "🛡 SAFE SHIELD",
        "degen_sword" => "⚔️ DEGEN SWORD",
        _ => "📡 SIGNAL",
    }
}

fn format_accept(alert: &AcceptAlert) -> String {
    let mut lines = vec![
        format!("*{}*", escape_markdown(strategy_header(&alert.strategy))),
        String::new(),
        format!(
            "*{}* \\({}\\)",
            escape_markdown(&alert.symbol),
            escape_markdown(&alert.name)
        ),
        format!("`{}`", escape_markdown(&alert.token.to_string())),
        format!(
            "Liquidity: \\${}",
            escape_markdown(&format!("{:.0}", alert.liquidity_usd.unwrap_or(0.0)))
        ),
        format!(
            "Allocation: \\${}",
            escape_markdown(&format!("{:.2}", alert.allocation_usd))
        ),
        format!(
            "Scam: {} \\| Potential: {}",
            escape_markdown(&format!("{:.0}%", alert.score.scam_probability * 100.0)),
            escape_markdown(&format!("{:.0}", alert.score.meme_potential))
        ),
    ];
    if !alert.score.summary.is_empty() {
        lines.push(format!("_{}_", escape_markdown(&alert.score.summary)));
    }
    for link in &alert.links {
        lines.push(escape_markdown(link));
    }
    lines.join("\n")
}

fn format_trade_update(alert: &TradeUpdateAlert) -> String {
    let p = alert.realized_pnl_usd;
    let pnl = if p >= 0.0 {
        format!(" \\(\\+\\${}\\)", escape_markdown(&format!("{p:.2}")))
    } else {
        format!(
            " \\(\\-\\${}\\)",
            escape_markdown(&format!("{:.2}", p.abs()))
        )
    };
    format!(
        "*{}*\n{}: {}{}",
        escape_markdown(strategy_header(&alert.strategy)),
        escape_markdown(&alert.symbol),
        escape_markdown(&alert.event),
        pnl
    )
}

pub fn format_alert(alert: &Alert) -> String {
    match alert {
        Alert::Accept(a) => format_accept(a),
        Alert::TradeUpdate(t) => format_trade_update(t),
    }
}

impl TelegramSink {
    pub fn new(
        bot_token: String,
        chat_id: String,
        base_url: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, AlertError> {
        if bot_token.trim().is_empty() || chat_id.trim().is_empty() {
            return Err(AlertError::NotConfigured(
                "telegram bot_token and chat_id are required".to_string(),
            ));
        }
        let http = Client::builder()
            .user_agent("gemscout/0.1")
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AlertError::Delivery(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            bot_token,
            chat_id,
        })
    }
}

#[async_trait]
impl AlertSink for TelegramSink {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, alert: &Alert) -> Result<(), AlertError> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.bot_token);
        let payload = json!({
            "chat_id": self.chat_id,
            "text": format_alert(alert),
            "parse_mode": "MarkdownV2",
            "disable_web_page_preview": true,
        });

        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AlertError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AlertError::Delivery(format!("status {status}: {body}")));
        }
        debug!(sink = "telegram", "alert delivered");
        Ok(())
    }
}
