//! Cache expiry behavior through the public API.

use std::thread;
use std::time::Duration;

use pretty_assertions::assert_eq;

use identra_core::{Cache, CachePolicy};

#[test]
fn short_lived_entries_disappear_after_their_ttl() {
    let cache = Cache::new(
        "short",
        CachePolicy::unbounded().with_time_to_live(Duration::from_millis(100)),
    );
    cache.put("k".to_string(), "v".to_string());
    assert_eq!(cache.get(&"k".to_string()), Some("v".to_string()));

    thread::sleep(Duration::from_millis(150));
    assert_eq!(cache.get(&"k".to_string()), None);
}

#[test]
fn unbounded_entries_survive_until_removed() {
    let cache = Cache::new("unbounded", CachePolicy::unbounded());
    cache.put("k".to_string(), 42);
    thread::sleep(Duration::from_millis(50));
    assert_eq!(cache.get(&"k".to_string()), Some(42));
    assert_eq!(cache.remove(&"k".to_string()), Some(42));
    assert_eq!(cache.get(&"k".to_string()), None);
}
