//! Domain Layer - pure core types and logic
//!
//! No I/O lives here. Everything in this module is a value type or a pure
//! function over value types, which keeps the filter cascade and the result
//! model trivially testable.

pub mod candidate;
pub mod fast_filter;
pub mod score;

pub use candidate::{Candidate, TokenId};
pub use fast_filter::{FastFilter, FilterConfig, FilterVerdict, RejectReason};
pub use score::{ScoreResult, Sentiment, VerifierReport};
