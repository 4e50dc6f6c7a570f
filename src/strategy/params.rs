//! Strategy Parameters
//!
//! Each risk-tolerance strategy is a named, data-driven rule set consumed by
//! the one pure evaluation function in `engine.rs`. Two fixed instances ship
//! with the process (Safe Shield, Degen Sword); adding a third strategy is a
//! new record, not new control flow.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration record for one strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyParams {
    /// Stable tag used in journal rows, cache outcomes and alerts
    pub name: String,
    /// Whether mintable tokens are ever acceptable
    pub allow_mintable: bool,
    /// When mintable is allowed: minimum AI meme-potential score required
    /// to take the risk anyway (0 - 100)
    pub min_ai_score_if_mintable: f64,
    /// Hard ceiling on AI scam probability (0.0 - 1.0)
    pub max_scam_probability: f64,
    /// Minimum verifier confidence to trust its flags at all (0.0 - 1.0)
    pub min_verifier_confidence: f64,
    /// Notional budget reported in accept verdicts, USD
    pub fixed_balance_usd: f64,
}

#[derive(Debug, Error)]
pub enum StrategyParamsError {
    #[error("strategy '{name}': {field} must be within {range}, got {value}")]
    OutOfRange {
        name: String,
        field: &'static str,
        range: &'static str,
        value: f64,
    },
    #[error("strategy name cannot be empty")]
    EmptyName,
}

impl StrategyParams {
    /// The conservative rule set: never touches mintable supply, tight scam
    /// ceiling.
    pub fn safe_shield() -> Self {
        Self {
            name: "safe_shield".to_string(),
            allow_mintable: false,
            min_ai_score_if_mintable: 100.0,
            max_scam_probability: 0.3,
            min_verifier_confidence: 0.5,
            fixed_balance_usd: 200.0,
        }
    }

    /// The aggressive rule set: tolerates mintable supply when the AI sees
    /// enough upside, looser scam ceiling.
    pub fn degen_sword() -> Self {
        Self {
            name: "degen_sword".to_string(),
            allow_mintable: true,
            min_ai_score_if_mintable: 70.0,
            max_scam_probability: 0.6,
            min_verifier_confidence: 0.3,
            fixed_balance_usd: 200.0,
        }
    }

    pub fn validate(&self) -> Result<(), StrategyParamsError> {
        if self.name.is_empty() {
            return Err(StrategyParamsError::EmptyName);
        }
        self.check_range("max_scam_probability", self.max_scam_probability, 0.0, 1.0)?;
        self.check_range(
            "min_verifier_confidence",
            self.min_verifier_confidence,
            0.0,
            1.0,
        )?;
        self.check_range(
            "min_ai_score_if_mintable",
            self.min_ai_score_if_mintable,
            0.0,
            100.0,
        )?;
        if self.fixed_balance_usd <= 0.0 {
            return Err(StrategyParamsError::OutOfRange {
                name: self.name.clone(),
                field: "fixed_balance_usd",
                range: "(0, inf)",
                value: self.fixed_balance_usd,
            });
        }
        Ok(())
    }

    fn check_range(
        &self,
        field: &'static str,
        value: f64,
        lo: f64,
        hi: f64,
    ) -> Result<(), StrategyParamsError> {
        if value < lo || value > hi {
            return Err(StrategyParamsError::OutOfRange {
                name: self.name.clone(),
                field,
                range: if hi > 1.0 { "0-100" } else { "0-1" },
                value,
            });
        }
        Ok(())
    }
}
