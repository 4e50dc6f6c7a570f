//! Cache Adapters
//!
//! Backends for the `DedupCache` port. The in-memory store covers
//! stand-alone deployments; an external store (Redis or equivalent) can be
//! slotted in behind the same trait for multi-process setups.

pub mod memory;

pub use memory::MemoryCache;
