//! §8 scenario 8: `put` succeeds until capacity; at capacity it fails unless
//! an entry has expired, in which case the expired entry is evicted and the
//! new one inserted; `get` on an unexpired key refreshes its TTL.

use std::thread::sleep;
use std::time::Duration;

use metastew::cache::Cache;

#[test]
fn put_fails_at_capacity_until_something_expires() -> anyhow::Result<()> {
    let mut cache: Cache<&str, i32> = Cache::new(1, Duration::from_millis(15));

    assert!(cache.put("a", 1));
    assert!(!cache.put("b", 2));
    assert_eq!(cache.len(), 1);

    sleep(Duration::from_millis(25));
    assert!(cache.put("b", 2));
    assert_eq!(cache.len(), 1);
    assert!(cache.contains(&"b"));
    assert!(!cache.contains(&"a"));
    Ok(())
}

#[test]
fn get_on_live_entry_refreshes_ttl() -> anyhow::Result<()> {
    let mut cache: Cache<&str, i32> = Cache::new(1, Duration::from_millis(30));
    cache.put("a", 1);
    sleep(Duration::from_millis(20));
    assert_eq!(cache.get(&"a"), Some(&1));
    sleep(Duration::from_millis(20));
    assert_eq!(cache.get(&"a"), Some(&1));
    Ok(())
}
