//! Login Throttling Infrastructure
//!
//! Sliding-window failed-attempt counter keyed by
//! `lowercased-identifier:origin`, so one abusive origin cannot burn the
//! limit for every identifier and vice versa. The store trait keeps the
//! check-then-increment atomic per key inside the store; callers never do a
//! read-then-write of their own.
//!
//! The in-memory store is process-local: it does not survive restarts and
//! does not coordinate across replicas. Multi-instance deployments need a
//! shared implementation of [`ThrottleStore`].

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Throttle configuration
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Failed attempts allowed inside one window
    pub max_attempts: u32,
    /// Sliding window duration
    pub window: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            window: Duration::from_secs(15 * 60),
        }
    }
}

/// Compose the throttle key from a submitted identifier and the caller origin
pub fn throttle_key(identifier: &str, origin: &str) -> String {
    format!("{}:{}", identifier.trim().to_lowercase(), origin)
}

/// Trait for throttle storage backends
///
/// Every operation is atomic with respect to its key. Entries older than the
/// window are treated as absent.
#[trait_variant::make(ThrottleStore: Send)]
pub trait LocalThrottleStore {
    /// Has this key reached the limit inside the current window?
    /// Read-only; called before any password work is done.
    async fn is_limited(&self, key: &str) -> bool;

    /// Record one failed attempt. Creates the entry or increments it,
    /// restarting the window when the previous one has expired.
    /// Returns the count inside the current window.
    async fn record_failure(&self, key: &str) -> u32;

    /// Drop the entry (called on successful authentication)
    async fn clear(&self, key: &str);

    /// Remove expired entries to bound memory; returns how many were removed
    async fn evict_expired(&self) -> usize;
}

#[derive(Debug, Clone, Copy)]
struct ThrottleEntry {
    count: u32,
    window_start: Instant,
}

/// Process-local throttle store backed by a mutexed map
///
/// The lock is held only for the map operation itself; password hashing
/// never happens under it.
pub struct MemoryThrottleStore {
    config: ThrottleConfig,
    entries: Mutex<HashMap<String, ThrottleEntry>>,
}

impl MemoryThrottleStore {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn is_expired(&self, entry: &ThrottleEntry, now: Instant) -> bool {
        now.duration_since(entry.window_start) >= self.config.window
    }
}

impl ThrottleStore for MemoryThrottleStore {
    async fn is_limited(&self, key: &str) -> bool {
        let entries = self.entries.lock().expect("throttle lock poisoned");
        match entries.get(key) {
            Some(entry) if !self.is_expired(entry, Instant::now()) => {
                entry.count >= self.config.max_attempts
            }
            _ => false,
        }
    }

    async fn record_failure(&self, key: &str) -> u32 {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("throttle lock poisoned");

        let entry = entries
            .entry(key.to_string())
            .and_modify(|e| {
                if now.duration_since(e.window_start) >= self.config.window {
                    e.count = 1;
                    e.window_start = now;
                } else {
                    e.count += 1;
                }
            })
            .or_insert(ThrottleEntry {
                count: 1,
                window_start: now,
            });

        entry.count
    }

    async fn clear(&self, key: &str) {
        let mut entries = self.entries.lock().expect("throttle lock poisoned");
        entries.remove(key);
    }

    async fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("throttle lock poisoned");
        let before = entries.len();
        entries.retain(|_, e| now.duration_since(e.window_start) < self.config.window);
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{throttle_key, MemoryThrottleStore, ThrottleConfig, ThrottleStore};
    use std::time::Duration;

    fn store(max: u32, window_ms: u64) -> MemoryThrottleStore {
        MemoryThrottleStore::new(ThrottleConfig {
            max_attempts: max,
            window: Duration::from_millis(window_ms),
        })
    }

    #[test]
    fn test_throttle_key_normalization() {
        assert_eq!(
            throttle_key("User@Example.COM", "192.168.1.1"),
            "user@example.com:192.168.1.1"
        );
        assert_eq!(throttle_key("  a@x.com ", "::1"), "a@x.com:::1");
    }

    #[tokio::test]
    async fn test_under_limit_not_limited() {
        let store = store(3, 60_000);
        assert!(!store.is_limited("k").await);
        store.record_failure("k").await;
        store.record_failure("k").await;
        assert!(!store.is_limited("k").await);
    }

    #[tokio::test]
    async fn test_limit_reached() {
        let store = store(3, 60_000);
        for _ in 0..3 {
            store.record_failure("k").await;
        }
        assert!(store.is_limited("k").await);
        // Other keys are independent
        assert!(!store.is_limited("other").await);
    }

    #[tokio::test]
    async fn test_window_expiry_resets_count() {
        let store = store(2, 30);
        store.record_failure("k").await;
        store.record_failure("k").await;
        assert!(store.is_limited("k").await);

        std::thread::sleep(Duration::from_millis(50));
        assert!(!store.is_limited("k").await);
        // First failure after expiry restarts the window at 1
        assert_eq!(store.record_failure("k").await, 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let store = store(2, 60_000);
        store.record_failure("k").await;
        store.record_failure("k").await;
        assert!(store.is_limited("k").await);

        store.clear("k").await;
        assert!(!store.is_limited("k").await);
        assert_eq!(store.record_failure("k").await, 1);
    }

    #[tokio::test]
    async fn test_evict_expired() {
        let store = store(5, 30);
        store.record_failure("a").await;
        store.record_failure("b").await;

        std::thread::sleep(Duration::from_millis(50));
        store.record_failure("c").await;

        assert_eq!(store.evict_expired().await, 2);
        assert_eq!(store.record_failure("c").await, 2);
    }
}
