//! In-Memory Dedup Cache
//!
//! TTL cache over a plain `HashMap`, the stand-alone-mode backend when no
//! external store is configured. Expired entries are logically absent and
//! swept opportunistically; a bounded capacity evicts the oldest entry when
//! a sweep is not enough.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::domain::TokenId;
use crate::ports::cache::{CacheEntry, CacheError, DedupCache};

#[derive(Debug, Clone)]
struct StoredEntry {
    entry: CacheEntry,
    inserted_at: Instant,
    ttl: Duration,
}

impl StoredEntry {
    fn is_live(&self) -> bool {
        self.inserted_at.elapsed() < self.ttl
    }
}

/// HashMap-backed TTL store.
pub struct MemoryCache {
    entries: Mutex<HashMap<TokenId, StoredEntry>>,
    max_entries: usize,
}

impl MemoryCache {
    pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries,
        }
    }

    /// Number of entries including expired ones awaiting sweep.
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live entries.
    pub fn live_count(&self) -> usize {
        self.entries
            .lock()
            .map_or(0, |entries| entries.values().filter(|e| e.is_live()).count())
    }

    fn sweep(entries: &mut HashMap<TokenId, StoredEntry>) {
        entries.retain(|_, e| e.is_live());
    }

    fn evict_oldest(entries: &mut HashMap<TokenId, StoredEntry>) {
        if let Some(oldest) = entries
            .iter()
            .min_by_key(|(_, e)| e.inserted_at)
            .map(|(id, _)| id.clone())
        {
            entries.remove(&oldest);
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DedupCache for MemoryCache {
    async fn lookup(&self, id: &TokenId) -> Result<Option<CacheEntry>, CacheError> {
        // A poisoned lock means a writer panicked mid-update; report the
        // store unreachable and let the caller degrade.
        let entries = self
            .entries
            .lock()
            .map_err(|e| CacheError::Unreachable(e.to_string()))?;
        Ok(entries
            .get(id)
            .filter(|e| e.is_live())
            .map(|e| e.entry.clone()))
    }

    async fn record(
        &self,
        id: &TokenId,
        entry: CacheEntry,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| CacheError::Unreachable(e.to_string()))?;

        if entries.len() >= self.max_entries && !entries.contains_key(id) {
            Self::sweep(&mut entries);
            if entries.len() >= self.max_entries {
                Self::evict_oldest(&mut entries);
            }
        }

        entries.insert(
            id.clone(),
            StoredEntry {
                entry,
                inserted_at: Instant::now(),
                ttl,
            },
        );
        Ok(())
    }
}
