//! Bounded in-memory cache of lyric sets keyed by track id.
//!
//! The client holds only transient state, so this replaces both a persistent
//! store and the habit of stashing fetched lyrics on a shared mutable track
//! object: the cache instance is passed explicitly through the playback
//! context and looked up by id.

use crate::lines::LyricSet;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Default number of tracks whose lyrics are retained.
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

struct CacheInner {
    entries: HashMap<u64, Arc<LyricSet>>,
    /// Insertion order for FIFO eviction.
    order: VecDeque<u64>,
}

/// Bounded lyrics cache with FIFO eviction.
pub struct LyricsCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl LyricsCache {
    /// Create a cache retaining at most `capacity` tracks (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    /// Look up the cached lyric set for a track.
    #[must_use]
    pub fn get(&self, track_id: u64) -> Option<Arc<LyricSet>> {
        self.lock().entries.get(&track_id).cloned()
    }

    /// Insert (or replace) the lyric set for a track, evicting the oldest
    /// entry when over capacity.
    pub fn insert(&self, track_id: u64, set: Arc<LyricSet>) {
        let mut inner = self.lock();
        if inner.entries.insert(track_id, set).is_none() {
            inner.order.push_back(track_id);
        }
        while inner.entries.len() > self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
            debug!("Evicted cached lyrics for track {}", oldest);
        }
    }

    /// Drop one track's entry, e.g. after its lyrics were edited and saved.
    pub fn remove(&self, track_id: u64) {
        let mut inner = self.lock();
        inner.entries.remove(&track_id);
        inner.order.retain(|id| *id != track_id);
    }

    /// Drop everything.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for LyricsCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
