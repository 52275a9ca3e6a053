//! Staleness-aware resource cache shared across renders.
//!
//! External script bodies and external template documents are read through a
//! [`ResourceResolver`](crate::resolver::ResourceResolver) and kept here keyed
//! by their canonical location. Each entry remembers the modification time it
//! was read at; a lookup carrying a different time finds the entry stale,
//! evicts it and reports a miss. A stale value is never handed out.
//!
//! # Concurrency
//!
//! The cache is built on `DashMap`, so concurrent renders can share it without
//! a global lock:
//! - lookups and inserts are atomic per key
//! - eviction uses a conditional remove that only fires while the stored
//!   timestamp still differs from the query, so a fresher entry written by a
//!   concurrent render is never thrown away
//!
//! Two renders missing the same key at once may both read and insert the
//! resource; the last insert wins, which is harmless because both values were
//! read for the same timestamp.
//!
//! # Examples
//!
//! ```rust
//! use mocha_template::cache::ResourceCache;
//! use std::time::{Duration, SystemTime};
//!
//! let cache: ResourceCache<String> = ResourceCache::new();
//! let t0 = SystemTime::UNIX_EPOCH;
//! let t1 = t0 + Duration::from_secs(1);
//!
//! cache.put("/partials/nav.html", t0, "<nav></nav>".to_string());
//! assert!(cache.get("/partials/nav.html", t0).is_some());
//! assert!(cache.get("/partials/nav.html", t1).is_none()); // stale, evicted
//! assert!(cache.is_empty());
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::SystemTime;

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::markup::Document;

/// A cached value together with the modification time it was read at.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    modified: SystemTime,
    value: T,
}

/// Concurrent cache keyed by location and validated by modification time.
///
/// `T` is cloned out on every hit, so it is normally an `Arc` of the real
/// payload.
#[derive(Debug)]
pub struct ResourceCache<T> {
    entries: DashMap<String, CacheEntry<T>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<T> Default for ResourceCache<T> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }
}

impl<T: Clone> ResourceCache<T> {
    /// Create a new empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `location`, returning the value only if it was stored for `modified`.
    ///
    /// A stored entry with a different timestamp is evicted.
    pub fn get(&self, location: &str, modified: SystemTime) -> Option<T> {
        if let Some(entry) = self.entries.get(location) {
            if entry.modified == modified {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!("Resource cache hit for {location}");
                return Some(entry.value.clone());
            }
        }

        // The read guard above is dropped before removing, otherwise the
        // shard lock would deadlock.
        if self.entries.remove_if(location, |_, entry| entry.modified != modified).is_some() {
            debug!("Evicted stale cache entry for {location}");
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store `value` for `location` as read at `modified`, replacing any previous entry.
    pub fn put(&self, location: impl Into<String>, modified: SystemTime, value: T) {
        self.entries.insert(
            location.into(),
            CacheEntry {
                modified,
                value,
            },
        );
    }

    /// Return the cached value or load, store and return a fresh one.
    ///
    /// The loader only runs on a miss; its error is passed through and
    /// nothing is stored.
    pub fn get_or_try_insert_with<E>(
        &self,
        location: &str,
        modified: SystemTime,
        load: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        if let Some(value) = self.get(location, modified) {
            return Ok(value);
        }
        let value = load()?;
        self.put(location, modified, value.clone());
        Ok(value)
    }

    /// Number of entries currently stored
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry and reset the statistics
    pub fn clear(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Get cache statistics as `(hits, misses)`
    pub fn stats(&self) -> (usize, usize) {
        (self.hits.load(Ordering::Relaxed), self.misses.load(Ordering::Relaxed))
    }

    /// Calculate hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let (hits, misses) = self.stats();
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

/// The two caches a render consults: external script bodies and parsed
/// external template documents.
#[derive(Debug, Default)]
pub struct ResourceCaches {
    /// Bodies of `<script type="server/rhai" src="...">` elements
    pub scripts: ResourceCache<Arc<str>>,
    /// Parsed documents referenced by `data-include="@location"`
    pub templates: ResourceCache<Arc<Document>>,
}

impl ResourceCaches {
    /// Create a fresh, unshared pair of caches
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide caches used by engines that were not given their own.
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<ResourceCaches>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(Self::new())))
    }
}
