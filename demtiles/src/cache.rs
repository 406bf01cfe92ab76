//! Per-archive memoization of archive opens.
//!
//! [`ArchiveCache`] stores, per quadkey, the *future* of an archive open rather
//! than the opened archive. The future is inserted before it runs, so requests
//! racing on one archive share a single open. It is a [`Shared`] future: any
//! waiter drives it, and a waiter that gives up does not cancel it for the
//! others.
//!
//! A failed open stays cached; later requests observe the same error until the
//! entry is removed with [`ArchiveCache::invalidate`].

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use moka::policy::EvictionPolicy;
use moka::sync::Cache;

use crate::error::TileError;
use crate::quadkey::QuadKey;

/// Outcome of opening an archive.
pub type OpenResult<A> = std::result::Result<Arc<A>, TileError>;

/// An archive open that may still be in flight, cloneable by every waiter.
pub type SharedArchive<A> = Shared<BoxFuture<'static, OpenResult<A>>>;

/// Statistics about cache usage.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of archives currently in the cache (pending or ready).
    pub entry_count: u64,
    /// Number of requests served by an existing entry.
    pub hit_count: u64,
    /// Number of requests that started a new open.
    pub miss_count: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// Cache of pending and opened archives, keyed by archive quadkey.
///
/// # Example
///
/// ```ignore
/// let cache = ArchiveCache::unbounded();
/// let archive = cache
///     .get_or_open(&qk, || async move { store.open(&path).await.map(Arc::new) })
///     .await?;
/// ```
pub struct ArchiveCache<A> {
    archives: Cache<QuadKey, SharedArchive<A>>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl<A: Send + Sync + 'static> ArchiveCache<A> {
    /// Create a cache.
    ///
    /// With `capacity = None` archives are never evicted. With a capacity the
    /// least recently used archive is dropped first. Evicting an entry whose
    /// open is still running does not cancel it for current waiters.
    pub fn new(capacity: Option<u64>) -> Self {
        let mut builder = Cache::builder();
        if let Some(capacity) = capacity {
            builder = builder
                .max_capacity(capacity)
                .eviction_policy(EvictionPolicy::lru());
        }

        Self {
            archives: builder.build(),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    /// Create a cache that never evicts.
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Return the cached open for `key`, or start one with `open`.
    ///
    /// `open` is invoked at most once per key for as long as the entry lives,
    /// no matter how many callers race on it. The check-and-insert is atomic
    /// per key.
    pub fn get_or_open<F, Fut>(&self, key: &QuadKey, open: F) -> SharedArchive<A>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = OpenResult<A>> + Send + 'static,
    {
        let mut started = false;
        let archive = self.archives.get_with(key.clone(), || {
            started = true;
            open().boxed().shared()
        });

        if started {
            self.miss_count.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(quadkey = %key, "Opening archive");
        } else {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
        }

        archive
    }

    /// Whether an entry (pending, ready or failed) exists for `key`.
    pub fn contains(&self, key: &QuadKey) -> bool {
        self.archives.contains_key(key)
    }

    /// Remove the entry for `key`, so the next request opens the archive again.
    ///
    /// This is the retry hook for failed opens.
    pub fn invalidate(&self, key: &QuadKey) {
        self.archives.invalidate(key);
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.archives.invalidate_all();
    }

    /// Maximum number of archives kept, or `None` when unbounded.
    pub fn capacity(&self) -> Option<u64> {
        self.archives.policy().max_capacity()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.archives.entry_count(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }

    /// Apply pending evictions and bookkeeping immediately.
    pub fn run_pending_tasks(&self) {
        self.archives.run_pending_tasks();
    }
}
