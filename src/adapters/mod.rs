//! Adapters layer: concrete implementations of the outbound ports.
//!
//! Each adapter owns its transport details (HTTP clients, file handles)
//! and translates between wire formats and domain types. Nothing in here
//! makes decisions; that stays in `domain` and `strategy`.

pub mod ai;
pub mod cli;
pub mod dexscreener;
pub mod goplus;
pub mod journal;
pub mod retry;
pub mod telegram;

pub use ai::OpenAiScorer;
pub use dexscreener::{DexScreenerSource, PairRefresher};
pub use goplus::GoPlusVerifier;
pub use journal::JsonlJournal;
pub use retry::RetryPolicy;
pub use telegram::TelegramSink;
