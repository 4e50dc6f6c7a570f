//! Strategy Layer - dual risk-tolerance rule sets
//!
//! The two shipped strategies share one pure evaluation function:
//! - **Safe Shield**: strict; rejects mintable supply unconditionally
//! - **Degen Sword**: tolerates mintable supply above an AI score threshold
//!
//! Strategies never interact; each produces its own verdict and alert.

pub mod engine;
pub mod params;

pub use engine::{evaluate, Decision, ReasonCode, StrategyVerdict};
pub use params::{StrategyParams, StrategyParamsError};
