//! Recency cache of resolved lookups.
//!
//! Each tree keeps one cache mapping request paths to the handler cell of the
//! node they resolved to, along with the parameters captured on the way. The
//! cache is guarded by its own lock so that a hit never touches the tree's
//! structural lock.
use crate::params::Params;

use std::num::NonZeroUsize;
use std::sync::Arc;

use arc_swap::ArcSwap;
use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

/// Number of resolved paths each method's tree remembers by default.
pub const DEFAULT_CACHE_CAPACITY: usize = 255;

/// The handler cell owned by a trie node.
pub(crate) type Slot<T> = Arc<ArcSwap<T>>;

pub(crate) struct Cached<T> {
    pub(crate) slot: Slot<T>,
    pub(crate) params: Params,
}

/// Fixed capacity least-recently-used map from path to resolved route.
///
/// A capacity of zero disables caching altogether.
pub(crate) struct RouteCache<T> {
    entries: Option<Mutex<LruCache<String, Cached<T>>>>,
}

impl<T> RouteCache<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    /// Returns the cached route for `path` and marks it most recently used.
    pub(crate) fn get(&self, path: &str) -> Option<(Arc<T>, Params)> {
        let mut entries = self.entries.as_ref()?.lock();
        let cached = entries.get(path)?;
        Some((cached.slot.load_full(), cached.params.clone()))
    }

    /// Inserts or refreshes `path`, evicting the least recently used entry if
    /// the cache is full.
    pub(crate) fn put(&self, path: &str, slot: Slot<T>, params: Params) {
        let Some(entries) = self.entries.as_ref() else {
            return;
        };

        let mut entries = entries.lock();
        if let Some((evicted, _)) = entries.push(path.to_owned(), Cached { slot, params }) {
            if evicted != path {
                trace!(path = %evicted, "evicted route from cache");
            }
        }
    }

    pub(crate) fn remove(&self, path: &str) {
        if let Some(entries) = self.entries.as_ref() {
            entries.lock().pop(path);
        }
    }

    pub(crate) fn clear(&self) {
        if let Some(entries) = self.entries.as_ref() {
            entries.lock().clear();
        }
    }

    /// Whether `path` is cached, without touching its recency.
    pub(crate) fn contains(&self, path: &str) -> bool {
        self.entries
            .as_ref()
            .map_or(false, |entries| entries.lock().contains(path))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| entries.lock().len())
    }
}
