//! Deduplicating query cache for count results.
//!
//! Grids re-request counts constantly (every re-render, every tab switch), and
//! a planner or `count(*)` round trip is not free. The cache guarantees at
//! most one in-flight producer per key: concurrent callers with the same key
//! await the same result. Failures are never stored, so the next caller
//! simply tries again.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use hashbrown::HashMap;
use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tokio::time::Instant;

use rowscope_common::{ConnectionId, CountRequest, FilterClause, TableId};

use crate::impersonation::ImpersonationRole;

/// Identity of a cached count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Connection the count was taken on.
    pub connection: ConnectionId,
    /// Counted table.
    pub table_id: TableId,
    /// Active filters, in request order.
    pub filters: Vec<FilterClause>,
    /// Whether an exact count was required.
    pub enforce_exact_count: bool,
    /// Impersonated role identity, if any.
    pub role: Option<String>,
}

impl CacheKey {
    /// Builds the key for a request, or `None` when it has no table.
    ///
    /// Inactive filters don't change the statement, so they are left out of
    /// the key.
    #[must_use]
    pub fn new(
        connection: &ConnectionId,
        request: &CountRequest,
        role: Option<&ImpersonationRole>,
    ) -> Option<Self> {
        let table = request.table.as_ref()?;
        Some(Self {
            connection: connection.clone(),
            table_id: table.id,
            filters: request.active_filters().cloned().collect(),
            enforce_exact_count: request.enforce_exact_count,
            role: role.map(ImpersonationRole::cache_identity),
        })
    }

    /// Returns a readable label for transport logs.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "projects/{}/table-rows-count/{}",
            self.connection, self.table_id
        )
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served without running the producer.
    pub hits: u64,
    /// Lookups that ran the producer.
    pub misses: u64,
    /// Entries currently held, including in-flight ones.
    pub entries: usize,
}

impl CacheStats {
    /// Returns hits / (hits + misses), or 0 with no lookups.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Entry<V> {
    cell: OnceCell<(V, Instant)>,
}

impl<V> Entry<V> {
    fn resolved_at(&self) -> Option<Instant> {
        self.cell.get().map(|(_, at)| *at)
    }
}

/// Empty and held by the map alone: its producer failed or was dropped.
fn is_abandoned<V>(entry: &Arc<Entry<V>>) -> bool {
    entry.resolved_at().is_none() && Arc::strong_count(entry) == 1
}

/// One caller's hold on an entry while it resolves.
///
/// If the entry is still empty when the caller lets go (error or dropped
/// future) and no other caller is waiting on it, the key is removed.
struct PendingEntry<'a, V> {
    entries: &'a Mutex<HashMap<CacheKey, Arc<Entry<V>>>>,
    key: &'a CacheKey,
    entry: Arc<Entry<V>>,
}

impl<V> Drop for PendingEntry<'_, V> {
    fn drop(&mut self) {
        if self.entry.resolved_at().is_some() {
            return;
        }
        let mut entries = self.entries.lock();
        // Clones are only handed out under this lock, so the count is stable
        let unshared = Arc::strong_count(&self.entry) == 2
            && entries
                .get(self.key)
                .is_some_and(|current| Arc::ptr_eq(current, &self.entry));
        if unshared {
            entries.remove(self.key);
        }
    }
}

/// A keyed cache that coalesces concurrent producers.
pub struct QueryCache<V> {
    entries: Mutex<HashMap<CacheKey, Arc<Entry<V>>>>,
    ttl: Option<Duration>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> QueryCache<V> {
    /// Creates a cache holding up to `capacity` entries for `ttl` each.
    #[must_use]
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached value for `key`, running `producer` if there is none.
    ///
    /// If another caller is already producing the value for `key`, this
    /// waits for that result instead of starting a second producer.
    ///
    /// # Errors
    ///
    /// Returns the producer's error. Errors are not cached.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: &CacheKey, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let pending = PendingEntry {
            entries: &self.entries,
            key,
            entry: self.entry(key),
        };

        let ran = AtomicBool::new(false);
        let ran_ref = &ran;
        let resolved = pending
            .entry
            .cell
            .get_or_try_init(move || async move {
                ran_ref.store(true, Ordering::Relaxed);
                let value = producer().await?;
                Ok((value, Instant::now()))
            })
            .await;

        if ran.load(Ordering::Relaxed) {
            self.misses.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(key = %key.label(), "query cache miss");
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(key = %key.label(), "query cache hit");
        }
        let (value, _) = resolved?;
        Ok(value.clone())
    }

    /// Returns the cached value for `key` if it is present and fresh.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let entries = self.entries.lock();
        let entry = entries.get(key)?;
        if self.is_expired(entry, Instant::now()) {
            return None;
        }
        entry.cell.get().map(|(value, _)| value.clone())
    }

    /// Removes one entry.
    pub fn invalidate(&self, key: &CacheKey) {
        self.entries.lock().remove(key);
    }

    /// Removes every entry for a table on a connection.
    pub fn invalidate_table(&self, connection: &ConnectionId, table_id: TableId) {
        self.entries
            .lock()
            .retain(|key, _| !(key.table_id == table_id && &key.connection == connection));
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Returns current statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.lock().len(),
        }
    }

    /// Returns the live entry for `key`, creating an empty one if needed.
    fn entry(&self, key: &CacheKey) -> Arc<Entry<V>> {
        let mut entries = self.entries.lock();
        let now = Instant::now();

        if let Some(entry) = entries.get(key) {
            if !self.is_expired(entry, now) {
                return Arc::clone(entry);
            }
        }

        if entries.len() >= self.capacity && !entries.contains_key(key) {
            self.evict(&mut entries, now);
        }
        let entry = Arc::new(Entry {
            cell: OnceCell::new(),
        });
        entries.insert(key.clone(), Arc::clone(&entry));
        entry
    }

    fn is_expired(&self, entry: &Entry<V>, now: Instant) -> bool {
        match (self.ttl, entry.resolved_at()) {
            (Some(ttl), Some(at)) => now.duration_since(at) >= ttl,
            _ => false,
        }
    }

    /// Drops expired and abandoned entries, then the oldest resolved one if
    /// still full.
    ///
    /// In-flight entries are never evicted; the map may briefly exceed
    /// capacity while they are all pending.
    fn evict(&self, entries: &mut HashMap<CacheKey, Arc<Entry<V>>>, now: Instant) {
        entries.retain(|_, entry| !self.is_expired(entry, now) && !is_abandoned(entry));
        if entries.len() < self.capacity {
            return;
        }
        let oldest = entries
            .iter()
            .filter_map(|(key, entry)| entry.resolved_at().map(|at| (key, at)))
            .min_by_key(|(_, at)| *at)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            entries.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowscope_common::{FilterOperator, TableDescriptor};
    use std::sync::atomic::AtomicUsize;

    fn key(table: u32) -> CacheKey {
        CacheKey::new(
            &ConnectionId::new("proj"),
            &CountRequest::new(TableDescriptor::new(table, "t")),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_key_requires_table() {
        assert!(CacheKey::new(&ConnectionId::new("p"), &CountRequest::default(), None).is_none());
    }

    #[test]
    fn test_key_ignores_inactive_filters() {
        let conn = ConnectionId::new("p");
        let bare = CountRequest::new(TableDescriptor::new(1, "t"));
        let padded = bare
            .clone()
            .with_filter(FilterClause::new("x", FilterOperator::Eq, ""));
        assert_eq!(
            CacheKey::new(&conn, &bare, None),
            CacheKey::new(&conn, &padded, None)
        );

        let anon = CacheKey::new(&conn, &bare, Some(&ImpersonationRole::Anon));
        assert_ne!(CacheKey::new(&conn, &bare, None), anon);
        assert_eq!(key(9).label(), "projects/proj/table-rows-count/9");
    }

    #[tokio::test]
    async fn test_second_lookup_hits() {
        let cache = QueryCache::new(8, None);
        let first: Result<i64, ()> = cache.get_or_try_insert_with(&key(1), || async { Ok(10) }).await;
        let second: Result<i64, ()> = cache.get_or_try_insert_with(&key(1), || async { Ok(99) }).await;
        assert_eq!(first, Ok(10));
        assert_eq!(second, Ok(10));
        assert_eq!(cache.get(&key(1)), Some(10));

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = QueryCache::new(8, None);
        let failed: Result<i64, &str> = cache
            .get_or_try_insert_with(&key(1), || async { Err("boom") })
            .await;
        assert_eq!(failed, Err("boom"));
        assert_eq!(cache.get(&key(1)), None);

        let retried: Result<i64, &str> = cache.get_or_try_insert_with(&key(1), || async { Ok(3) }).await;
        assert_eq!(retried, Ok(3));
        assert_eq!(cache.stats().misses, 2);
    }

    #[tokio::test]
    async fn test_failed_lookups_do_not_hold_entries() {
        let cache = QueryCache::new(2, None);
        for table in 0..100 {
            let failed: Result<i64, &str> = cache
                .get_or_try_insert_with(&key(table), || async { Err("denied") })
                .await;
            assert_eq!(failed, Err("denied"));
        }
        let stats = cache.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.misses, 100);

        let _: Result<i64, &str> = cache.get_or_try_insert_with(&key(1), || async { Ok(1) }).await;
        assert_eq!(cache.stats().entries, 1);
    }

    #[tokio::test]
    async fn test_dropped_lookup_does_not_hold_entry() {
        let cache = QueryCache::new(2, None);
        let k1 = key(1);
        let lookup = cache.get_or_try_insert_with(&k1, || async {
            std::future::pending::<Result<i64, ()>>().await
        });
        assert!(
            tokio::time::timeout(Duration::from_millis(10), lookup)
                .await
                .is_err()
        );
        assert_eq!(cache.stats().entries, 0);

        let value: Result<i64, ()> = cache.get_or_try_insert_with(&key(1), || async { Ok(5) }).await;
        assert_eq!(value, Ok(5));
    }

    #[tokio::test]
    async fn test_eviction_sweeps_abandoned_entries() {
        let cache = QueryCache::new(1, None);
        cache.entries.lock().insert(
            key(9),
            Arc::new(Entry {
                cell: OnceCell::new(),
            }),
        );

        let value: Result<i64, ()> = cache.get_or_try_insert_with(&key(1), || async { Ok(1) }).await;
        assert_eq!(value, Ok(1));
        assert_eq!(cache.stats().entries, 1);
        assert!(!cache.entries.lock().contains_key(&key(9)));
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_producer() {
        let cache = Arc::new(QueryCache::new(8, None));
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(tokio::sync::Notify::new());

        let mut handles = Vec::new();
        for _ in 0..4 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            let gate = Arc::clone(&gate);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_try_insert_with(&key(1), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        gate.notified().await;
                        Ok::<_, ()>(42)
                    })
                    .await
            }));
        }

        // Let every task reach the cache before releasing the producer
        while calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        gate.notify_waiters();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hits, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let cache = QueryCache::new(8, Some(Duration::from_secs(60)));
        let _: Result<i64, ()> = cache.get_or_try_insert_with(&key(1), || async { Ok(1) }).await;

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(cache.get(&key(1)), Some(1));

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(cache.get(&key(1)), None);
        let refreshed: Result<i64, ()> = cache.get_or_try_insert_with(&key(1), || async { Ok(2) }).await;
        assert_eq!(refreshed, Ok(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_evicts_oldest() {
        let cache = QueryCache::new(2, None);
        for table in 1..=3u32 {
            let _: Result<u32, ()> = cache
                .get_or_try_insert_with(&key(table), || async move { Ok(table) })
                .await;
            tokio::time::advance(Duration::from_millis(10)).await;
        }
        assert_eq!(cache.stats().entries, 2);
        assert_eq!(cache.get(&key(1)), None);
        assert_eq!(cache.get(&key(2)), Some(2));
        assert_eq!(cache.get(&key(3)), Some(3));
    }

    #[tokio::test]
    async fn test_invalidate_table_only_touches_that_table() {
        let cache = QueryCache::new(8, None);
        for table in [1u32, 2] {
            let _: Result<u32, ()> = cache
                .get_or_try_insert_with(&key(table), || async move { Ok(table) })
                .await;
        }
        cache.invalidate_table(&ConnectionId::new("other"), TableId::new(1));
        assert_eq!(cache.stats().entries, 2);

        cache.invalidate_table(&ConnectionId::new("proj"), TableId::new(1));
        assert_eq!(cache.get(&key(1)), None);
        assert_eq!(cache.get(&key(2)), Some(2));

        cache.invalidate(&key(2));
        assert_eq!(cache.stats().entries, 0);
        cache.clear();
    }
}
