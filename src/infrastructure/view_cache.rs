//! In-memory read-view cache keyed by `(range, owner)`
//!
//! Entries expire after a fixed TTL; a successful range sync drops the
//! matching entry explicitly so the next read re-fetches fresh aggregates.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::sync_backend::ViewKey;

#[derive(Debug, Clone)]
struct CachedView<V> {
    value: V,
    stored_at: Instant,
}

#[derive(Debug, Clone)]
pub struct ViewCache<V> {
    entries: Arc<RwLock<HashMap<ViewKey, CachedView<V>>>>,
    ttl: Duration,
}

impl<V: Clone> ViewCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Fresh cached value, if any. Expired entries are treated as missing.
    pub async fn get(&self, key: &ViewKey) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|cached| cached.stored_at.elapsed() < self.ttl)
            .map(|cached| cached.value.clone())
    }

    pub async fn insert(&self, key: ViewKey, value: V) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CachedView {
                value,
                stored_at: Instant::now(),
            },
        );
        // Opportunistic sweep of expired entries
        let ttl = self.ttl;
        entries.retain(|_, cached| cached.stored_at.elapsed() < ttl);
    }

    /// Drop every view of `key.owner` whose range shares a day with
    /// `key.range`; returns the number removed.
    pub async fn invalidate_overlapping(&self, key: &ViewKey) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|cached, _| cached.owner != key.owner || !cached.range.overlaps(&key.range));
        let removed = before - entries.len();
        debug!(range = %key.range, owner = %key.owner, removed, "Read-views invalidated");
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
