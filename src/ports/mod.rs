//! Ports Layer - trait definitions for external collaborators
//!
//! Following hexagonal architecture, these traits abstract everything the
//! pipeline talks to:
//! - Candidate discovery feed (DexScreener)
//! - On-chain security verifier (GoPlus)
//! - AI scoring model (OpenAI-compatible)
//! - Dedup cache with TTL
//! - Alert delivery and the audit journal

pub mod alerts;
pub mod cache;
pub mod journal;
pub mod mocks;
pub mod scorer;
pub mod source;
pub mod verifier;

pub use alerts::{AcceptAlert, Alert, AlertError, AlertSink, NoopSink, TradeUpdateAlert};
pub use cache::{CacheEntry, CacheError, CachedDecision, DedupCache};
pub use journal::{EventJournal, JournalError, JournalRecord};
pub use scorer::{AiScorer, ScorerError};
pub use source::{CandidateSource, SourceError};
pub use verifier::{OnChainVerifier, StubVerifier, VerifierError};
