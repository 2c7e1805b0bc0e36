//! Fingerprinted per-document compilation cache with LRU eviction.
//!
//! One entry per URI holds the latest successful compile behind an `Arc`,
//! so replacing an entry never invalidates a reader mid-query — the old
//! result stays alive until its last holder drops it. Compiles for the
//! same URI serialize through a per-URI lock (last writer wins, and the
//! stored result always matches the latest content the serializer saw);
//! different URIs compile in parallel.

use crate::pipeline;
use crate::result::ParseResult;
use groovy_parser::ParseRequest;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default capacity when `max_cached_documents` is not configured.
pub const DEFAULT_CAPACITY: usize = 100;

/// Fast content fingerprint, stable for unchanged text.
pub fn fingerprint(content: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

/// Counters exposed through `statistics()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub transient_compiles: u64,
    pub entries: usize,
}

struct CacheEntry {
    fingerprint: u64,
    result: Arc<ParseResult>,
    /// Logical recency clock value; updated on read without taking the
    /// write lock.
    last_used: AtomicU64,
}

pub struct CompilationCache {
    entries: RwLock<HashMap<Url, CacheEntry>>,
    capacity: RwLock<usize>,
    clock: AtomicU64,
    stats: Mutex<CacheStats>,
    /// Per-URI compile serialization.
    uri_locks: Mutex<HashMap<Url, Arc<Mutex<()>>>>,
    soft_timeout: Duration,
}

impl Default for CompilationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl CompilationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: RwLock::new(capacity.max(1)),
            clock: AtomicU64::new(0),
            stats: Mutex::new(CacheStats::default()),
            uri_locks: Mutex::new(HashMap::new()),
            soft_timeout: pipeline::DEFAULT_SOFT_TIMEOUT,
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// The stored result, only if it matches the given content.
    pub fn get(&self, uri: &Url, content: &str) -> Option<Arc<ParseResult>> {
        let wanted = fingerprint(content);
        let entries = self.entries.read();
        let entry = entries.get(uri);
        let hit = entry.filter(|e| e.fingerprint == wanted).map(|e| {
            e.last_used.store(self.tick(), Ordering::Relaxed);
            Arc::clone(&e.result)
        });
        drop(entries);
        let mut stats = self.stats.lock();
        if hit.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        hit
    }

    /// The latest stored result regardless of current content. Providers
    /// that already observed a newer edit use this to keep answering from
    /// the last good parse.
    pub fn get_any(&self, uri: &Url) -> Option<Arc<ParseResult>> {
        let entries = self.entries.read();
        entries.get(uri).map(|e| {
            e.last_used.store(self.tick(), Ordering::Relaxed);
            Arc::clone(&e.result)
        })
    }

    pub fn put(&self, uri: &Url, content: &str, result: Arc<ParseResult>) {
        let entry = CacheEntry {
            fingerprint: fingerprint(content),
            result,
            last_used: AtomicU64::new(self.tick()),
        };
        let mut entries = self.entries.write();
        entries.insert(uri.clone(), entry);
        self.evict_over_capacity(&mut entries);
        self.stats.lock().entries = entries.len();
    }

    fn evict_over_capacity(&self, entries: &mut HashMap<Url, CacheEntry>) {
        let capacity = *self.capacity.read();
        while entries.len() > capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.last_used.load(Ordering::Relaxed))
                .map(|(uri, _)| uri.clone());
            match oldest {
                Some(uri) => {
                    debug!(%uri, "evicting least recently used parse result");
                    entries.remove(&uri);
                    self.stats.lock().evictions += 1;
                }
                None => break,
            }
        }
    }

    /// Serialized compile-and-store for a URI: the cached result after this
    /// call reflects the latest content any caller passed in.
    pub fn compile(&self, request: &ParseRequest) -> Arc<ParseResult> {
        let lock = self.lock_for(&request.uri);
        let _guard = lock.lock();
        if let Some(cached) = self.get(&request.uri, &request.content) {
            if cached.unit.phase >= request.compile_phase {
                return cached;
            }
        }
        let result = Arc::new(pipeline::compile_with_timeout(request, self.soft_timeout));
        self.put(&request.uri, &request.content, Arc::clone(&result));
        result
    }

    /// Like [`CompilationCache::compile`] but never answers from the cache.
    /// Used when a neighbor document changed: same content, but cross-file
    /// edges must be rebuilt against the new workspace sources.
    pub fn recompile(&self, request: &ParseRequest) -> Arc<ParseResult> {
        let lock = self.lock_for(&request.uri);
        let _guard = lock.lock();
        let result = Arc::new(pipeline::compile_with_timeout(request, self.soft_timeout));
        self.put(&request.uri, &request.content, Arc::clone(&result));
        result
    }

    /// Parses without touching the cache. Completion's speculative buffers
    /// go through here so sentinel edits never displace a good entry.
    pub fn compile_transient(&self, request: &ParseRequest) -> ParseResult {
        self.stats.lock().transient_compiles += 1;
        pipeline::compile_with_timeout(request, self.soft_timeout)
    }

    fn lock_for(&self, uri: &Url) -> Arc<Mutex<()>> {
        let mut locks = self.uri_locks.lock();
        Arc::clone(locks.entry(uri.clone()).or_default())
    }

    pub fn invalidate(&self, uri: &Url) {
        let mut entries = self.entries.write();
        entries.remove(uri);
        self.stats.lock().entries = entries.len();
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write();
        entries.clear();
        self.stats.lock().entries = 0;
    }

    /// Every URI currently cached, for cross-document scans.
    pub fn cached_uris(&self) -> Vec<Url> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn statistics(&self) -> CacheStats {
        let mut stats = self.stats.lock().clone();
        stats.entries = self.entries.read().len();
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Shrinks (or grows) the capacity, evicting immediately when needed.
    pub fn set_capacity(&self, capacity: usize) {
        *self.capacity.write() = capacity.max(1);
        let mut entries = self.entries.write();
        self.evict_over_capacity(&mut entries);
        self.stats.lock().entries = entries.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groovy_test_support::{must, must_some};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn uri(n: usize) -> Url {
        must(Url::parse(&format!("file:///doc{n}.groovy")))
    }

    fn request(n: usize, content: &str) -> ParseRequest {
        ParseRequest::new(uri(n), content)
    }

    #[test]
    fn fingerprint_mismatch_misses() {
        let cache = CompilationCache::new(10);
        cache.compile(&request(1, "def a = 1\n"));
        assert!(cache.get(&uri(1), "def a = 1\n").is_some());
        assert!(cache.get(&uri(1), "def a = 2\n").is_none());
        assert!(cache.get_any(&uri(1)).is_some());
    }

    #[test]
    fn transient_compile_does_not_store() {
        let cache = CompilationCache::new(10);
        let result = cache.compile_transient(&request(1, "def a = 1\n"));
        assert!(result.has_ast());
        assert!(cache.is_empty());
        assert_eq!(cache.statistics().transient_compiles, 1);
    }

    #[test]
    fn lru_evicts_least_recently_used() {
        let cache = CompilationCache::new(2);
        cache.compile(&request(1, "a = 1\n"));
        cache.compile(&request(2, "b = 2\n"));
        // Touch doc1 so doc2 becomes the eviction candidate.
        let _ = must_some(cache.get_any(&uri(1)));
        cache.compile(&request(3, "c = 3\n"));
        assert!(cache.get_any(&uri(1)).is_some());
        assert!(cache.get_any(&uri(2)).is_none());
        assert!(cache.get_any(&uri(3)).is_some());
        assert_eq!(cache.statistics().evictions, 1);
    }

    #[test]
    fn old_result_survives_replacement_for_existing_readers() {
        let cache = CompilationCache::new(4);
        cache.compile(&request(1, "def first = 1\n"));
        let held = must_some(cache.get_any(&uri(1)));
        cache.compile(&request(1, "def second = 2\n"));
        // The reader's snapshot is intact while the cache moved on.
        assert_eq!(held.unit.fingerprint, fingerprint("def first = 1\n"));
        let fresh = must_some(cache.get_any(&uri(1)));
        assert_eq!(fresh.unit.fingerprint, fingerprint("def second = 2\n"));
    }

    #[test]
    fn clear_and_invalidate() {
        let cache = CompilationCache::new(4);
        cache.compile(&request(1, "a = 1\n"));
        cache.compile(&request(2, "b = 2\n"));
        cache.invalidate(&uri(1));
        assert!(cache.get_any(&uri(1)).is_none());
        cache.clear();
        assert!(cache.is_empty());
    }

    proptest! {
        // |cache| <= capacity after every put, for any insertion sequence.
        #[test]
        fn capacity_bound_holds(capacity in 1usize..6, docs in proptest::collection::vec(0usize..12, 1..40)) {
            let cache = CompilationCache::new(capacity);
            for doc in docs {
                cache.put(
                    &uri(doc),
                    "x = 1\n",
                    Arc::new(pipeline::compile(&request(doc, "x = 1\n"))),
                );
                prop_assert!(cache.len() <= capacity);
            }
        }
    }
}
