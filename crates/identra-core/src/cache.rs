//! Time-bounded key/value caching.
//!
//! [`Cache`] stores entries together with their creation and last-access
//! timestamps and evicts them lazily on read once either the time-to-live
//! (age since creation) or time-to-idle (age since last access) threshold is
//! exceeded. There is no background sweeper: an entry that expired but was
//! never read again stays in the backing map until the next `get` touches
//! it, so [`Cache::len`] may over-count logically expired entries. That is a
//! documented property of the design, not a defect.
//!
//! [`CacheManager`] hands out named cache regions (one per resource type,
//! one for token nonces) sharing a default policy with optional per-region
//! overrides.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// Expiry thresholds for a cache region.
///
/// Both thresholds are optional; `None` disables that check. A `Some(ZERO)`
/// threshold expires entries on the first read after any time has passed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CachePolicy {
    time_to_live: Option<Duration>,
    time_to_idle: Option<Duration>,
}

impl CachePolicy {
    /// A policy with neither threshold set; entries live until removed.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Set the maximum age since creation, regardless of access pattern.
    pub fn with_time_to_live(mut self, ttl: Duration) -> Self {
        self.time_to_live = Some(ttl);
        self
    }

    /// Set the maximum age since last access.
    pub fn with_time_to_idle(mut self, tti: Duration) -> Self {
        self.time_to_idle = Some(tti);
        self
    }

    /// The configured time-to-live, if any.
    pub fn time_to_live(&self) -> Option<Duration> {
        self.time_to_live
    }

    /// The configured time-to-idle, if any.
    pub fn time_to_idle(&self) -> Option<Duration> {
        self.time_to_idle
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    created_at: Instant,
    last_access: Instant,
}

impl<V> Entry<V> {
    fn new(value: V) -> Self {
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            last_access: now,
        }
    }

    fn is_expired(&self, policy: &CachePolicy, now: Instant) -> bool {
        if let Some(ttl) = policy.time_to_live {
            if now.duration_since(self.created_at) > ttl {
                return true;
            }
        }
        if let Some(tti) = policy.time_to_idle {
            if now.duration_since(self.last_access) > tti {
                return true;
            }
        }
        false
    }
}

/// Access counters for a cache region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of `get`/`remove` lookups.
    pub accesses: u64,
    /// Lookups that returned a live value.
    pub hits: u64,
    /// Lookups that found nothing, including lazily evicted entries.
    pub misses: u64,
}

/// A thread-safe cache with lazy TTL/TTI expiry.
///
/// Safe for concurrent `get`/`put` from multiple threads; no locking beyond
/// the backing map's own is imposed on callers. Values are returned by
/// clone, so `V` is expected to be cheap to clone (the SDK stores `Arc`s and
/// JSON maps).
#[derive(Debug)]
pub struct Cache<K, V> {
    name: String,
    policy: CachePolicy,
    entries: RwLock<HashMap<K, Entry<V>>>,
    accesses: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create a named cache with the given expiry policy.
    pub fn new(name: impl Into<String>, policy: CachePolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            entries: RwLock::new(HashMap::new()),
            accesses: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// This cache's name, unique within its [`CacheManager`].
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The expiry policy this cache applies on read.
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Look up a live value, refreshing its last-access time.
    ///
    /// An entry whose TTL or TTI threshold has passed is evicted here and
    /// reported as absent; an expired entry is never returned even if it is
    /// still physically present in the map.
    pub fn get(&self, key: &K) -> Option<V> {
        self.accesses.fetch_add(1, Ordering::Relaxed);
        let now = Instant::now();
        let mut entries = self.entries.write();

        let Some(entry) = entries.get_mut(key) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };
        if entry.is_expired(&self.policy, now) {
            entries.remove(key);
            // an expired entry counts as a miss
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        entry.last_access = now;
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(entry.value.clone())
    }

    /// Blind upsert; returns the previous value if one was present.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        let mut entries = self.entries.write();
        entries.insert(key, Entry::new(value)).map(|e| e.value)
    }

    /// Insert only if no live value exists; returns the existing live value
    /// otherwise.
    ///
    /// The check and the insert happen under one lock, which is what makes
    /// consume-once nonce tracking race-free.
    pub fn put_if_absent(&self, key: K, value: V) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.entries.write();
        match entries.get(&key) {
            Some(entry) if !entry.is_expired(&self.policy, now) => Some(entry.value.clone()),
            _ => {
                entries.insert(key, Entry::new(value));
                None
            }
        }
    }

    /// Remove an entry, returning the value if it was live.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.accesses.fetch_add(1, Ordering::Relaxed);
        let now = Instant::now();
        let mut entries = self.entries.write();
        match entries.remove(key) {
            Some(entry) if !entry.is_expired(&self.policy, now) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value)
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of physically present entries.
    ///
    /// May over-count: logically expired entries remain until the next read
    /// touches them.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the backing map is physically empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of the access counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            accesses: self.accesses.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Hands out named cache regions sharing a default expiry policy.
///
/// Regions are created on first use. A per-region policy registered up front
/// overrides the default for that region only.
#[derive(Debug)]
pub struct CacheManager<V> {
    default_policy: CachePolicy,
    region_policies: RwLock<HashMap<String, CachePolicy>>,
    regions: RwLock<HashMap<String, Arc<Cache<String, V>>>>,
}

impl<V: Clone> CacheManager<V> {
    /// Create a manager whose regions default to the given policy.
    pub fn new(default_policy: CachePolicy) -> Self {
        Self {
            default_policy,
            region_policies: RwLock::new(HashMap::new()),
            regions: RwLock::new(HashMap::new()),
        }
    }

    /// Override the policy for one named region.
    ///
    /// Only affects regions not yet created; call before first use.
    pub fn set_region_policy(&self, name: impl Into<String>, policy: CachePolicy) {
        self.region_policies.write().insert(name.into(), policy);
    }

    /// Get or create the region with the given name.
    pub fn region(&self, name: &str) -> Arc<Cache<String, V>> {
        if let Some(cache) = self.regions.read().get(name) {
            return Arc::clone(cache);
        }
        let mut regions = self.regions.write();
        // double-checked: another thread may have created it between locks
        if let Some(cache) = regions.get(name) {
            return Arc::clone(cache);
        }
        let policy = self
            .region_policies
            .read()
            .get(name)
            .copied()
            .unwrap_or(self.default_policy);
        tracing::debug!(region = name, ?policy, "creating cache region");
        let cache = Arc::new(Cache::new(name.to_string(), policy));
        regions.insert(name.to_string(), Arc::clone(&cache));
        cache
    }

    /// Clear every region.
    pub fn clear_all(&self) {
        for cache in self.regions.read().values() {
            cache.clear();
        }
    }
}
