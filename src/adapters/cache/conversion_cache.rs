//! Snapshot-keyed conversion cache using moka.
//!
//! Entries are keyed by source identity and carry the snapshot they were
//! computed from. A lookup only hits when the caller's snapshot is exactly
//! equal to the stored one. Only successful conversions can be stored.

use chrono::Utc;
use moka::sync::Cache;
use std::sync::Arc;

use crate::domain::models::{CacheEntry, ContentSnapshot, ConvertedSource, SourceIdentity};

/// Default maximum number of cached conversions.
const DEFAULT_MAX_ENTRIES: u64 = 256;

/// In-memory, session-scoped conversion cache.
#[derive(Clone)]
pub struct ConversionCache {
    entries: Cache<SourceIdentity, Arc<CacheEntry>>,
}

impl ConversionCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(max_entries: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(max_entries).build(),
        }
    }

    /// Cached conversion for `identity`, if it was computed from `snapshot`.
    pub fn lookup(
        &self,
        identity: &SourceIdentity,
        snapshot: &ContentSnapshot,
    ) -> Option<ConvertedSource> {
        let entry = self.entries.get(identity)?;
        if entry.snapshot == *snapshot {
            tracing::trace!(%identity, provenance = %entry.converted.provenance, "cache hit");
            Some(entry.converted.clone())
        } else {
            tracing::trace!(%identity, "cache entry is for a different snapshot");
            None
        }
    }

    /// Insert or replace the entry for `identity`.
    pub fn store(
        &self,
        identity: &SourceIdentity,
        snapshot: ContentSnapshot,
        converted: ConvertedSource,
    ) {
        tracing::debug!(%identity, provenance = %converted.provenance, "caching conversion");
        self.entries.insert(
            identity.clone(),
            Arc::new(CacheEntry {
                snapshot,
                converted,
                stored_at: Utc::now(),
            }),
        );
    }

    /// Full entry for `identity`, regardless of snapshot.
    pub fn entry(&self, identity: &SourceIdentity) -> Option<Arc<CacheEntry>> {
        self.entries.get(identity)
    }

    /// Drop the entry after an in-flight task for `identity` was cancelled.
    pub fn invalidate(&self, identity: &SourceIdentity) {
        tracing::trace!(%identity, "invalidating cache entry");
        self.entries.invalidate(identity);
    }

    /// Drop the entry when its tab is closed.
    pub fn evict(&self, identity: &SourceIdentity) {
        tracing::trace!(%identity, "evicting cache entry");
        self.entries.invalidate(identity);
    }

    pub fn contains(&self, identity: &SourceIdentity) -> bool {
        self.entries.contains_key(identity)
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl Default for ConversionCache {
    fn default() -> Self {
        Self::new()
    }
}
