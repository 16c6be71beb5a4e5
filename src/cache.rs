//! LRU/TTL cache collaborator (§8 scenario 8, SPEC_FULL §12).
//!
//! Grounded on the teacher's `runtime::resource_manager::ResourceManager`
//! (a `TypeId`-keyed map of typed sub-maps); this narrows that shape to a
//! single `IndexMap<K, Entry<V>>` so the front of the map is always the
//! least-recently-used key, and adds the TTL/eviction policy the source
//! has no analogue for.

use std::time::{Duration, Instant};

use indexmap::IndexMap;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// A fixed-capacity cache that evicts by TTL expiry first, LRU order second.
///
/// `put` never evicts a live (unexpired) entry to make room — it fails
/// instead — matching §8 scenario 8: "`put` fails unless at least one
/// entry has expired".
pub struct Cache<K, V> {
    capacity: usize,
    ttl: Duration,
    entries: IndexMap<K, Entry<V>>,
}

impl<K, V> Cache<K, V>
where
    K: std::hash::Hash + Eq + Clone,
{
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self { capacity, ttl, entries: IndexMap::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts `key`/`value`. Succeeds immediately below capacity. At
    /// capacity, evicts the first expired entry found (insertion order,
    /// i.e. the oldest) and inserts; fails if none are expired.
    pub fn put(&mut self, key: K, value: V) -> bool {
        let now = Instant::now();
        if self.entries.contains_key(&key) {
            self.entries.insert(key, Entry { value, expires_at: now + self.ttl });
            return true;
        }
        if self.entries.len() >= self.capacity {
            let expired_key = self.entries.iter().find(|(_, e)| e.is_expired(now)).map(|(k, _)| k.clone());
            match expired_key {
                Some(expired_key) => {
                    self.entries.shift_remove(&expired_key);
                }
                None => return false,
            }
        }
        self.entries.insert(key, Entry { value, expires_at: now + self.ttl });
        true
    }

    /// Returns the value for `key` if present and unexpired, refreshing its
    /// TTL on hit. An expired entry is removed and treated as a miss.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let now = Instant::now();
        let expired = matches!(self.entries.get(key), Some(entry) if entry.is_expired(now));
        if expired {
            self.entries.shift_remove(key);
            return None;
        }
        let entry = self.entries.get_mut(key)?;
        entry.expires_at = now + self.ttl;
        Some(&entry.value)
    }

    pub fn contains(&self, key: &K) -> bool {
        match self.entries.get(key) {
            Some(entry) => !entry.is_expired(Instant::now()),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn put_succeeds_until_capacity() {
        let mut cache: Cache<&str, i32> = Cache::new(2, Duration::from_secs(60));
        assert!(cache.put("a", 1));
        assert!(cache.put("b", 2));
        assert!(!cache.put("c", 3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn put_at_capacity_evicts_expired_entry() {
        let mut cache: Cache<&str, i32> = Cache::new(1, Duration::from_millis(10));
        assert!(cache.put("a", 1));
        sleep(Duration::from_millis(20));
        assert!(cache.put("b", 2));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&"b"));
        assert!(!cache.contains(&"a"));
    }

    #[test]
    fn get_refreshes_ttl() {
        let mut cache: Cache<&str, i32> = Cache::new(1, Duration::from_millis(30));
        cache.put("a", 1);
        sleep(Duration::from_millis(15));
        assert_eq!(cache.get(&"a"), Some(&1));
        sleep(Duration::from_millis(15));
        // refreshed at the 15ms mark, so it's still alive at 30ms total.
        assert_eq!(cache.get(&"a"), Some(&1));
    }

    #[test]
    fn get_on_expired_key_is_a_miss_and_removes_it() {
        let mut cache: Cache<&str, i32> = Cache::new(1, Duration::from_millis(10));
        cache.put("a", 1);
        sleep(Duration::from_millis(20));
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.len(), 0);
    }
}
