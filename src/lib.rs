//! GemScout - Memecoin Discovery and Screening Pipeline
//!
//! Polls DexScreener for fresh token listings, screens them through a
//! cheap filter cascade, GoPlus contract checks and an AI risk model,
//! then runs two paper-trading strategies over the survivors.
//!
//! # Modules
//!
//! - `domain`: Core types and pure logic (Candidate, FastFilter, scores)
//! - `ports`: Trait boundaries (source, verifier, scorer, cache, alerts)
//! - `strategy`: The dual rule sets and the evaluation engine
//! - `adapters`: External implementations (DexScreener, GoPlus, Telegram)
//! - `cache`: In-memory TTL dedup store
//! - `config`: Configuration loading and validation
//! - `application`: Pipeline, scheduler and paper books

pub mod adapters;
pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod ports;
pub mod strategy;
