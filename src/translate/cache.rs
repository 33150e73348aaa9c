//! Cache key derivation and the in-memory translation cache.
//! Key: blake3 hash of (text | model | prompt). TTL is checked on read;
//! expired entries are dropped by the read itself.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

/// Content fingerprint identifying a (text, model, prompt) triple.
pub type CacheKey = [u8; 32];

/// Maximum age before a cached translation is treated as expired.
pub const RETENTION_HORIZON: Duration = Duration::from_secs(24 * 3600);

/// Entry bound for the in-memory tier. The durable tier has no size cap.
pub const MEMORY_CACHE_CAPACITY: usize = 512;

/// Compute the cache key for a (text, model, prompt) triple.
/// Deterministic: the translation is a function of all three inputs, so a
/// change to any of them must produce a different key.
pub fn compute_key(text: &str, model: &str, prompt: &str) -> CacheKey {
    let mut hasher = blake3::Hasher::new();
    hasher.update(text.as_bytes());
    hasher.update(b"|");
    hasher.update(model.as_bytes());
    hasher.update(b"|");
    hasher.update(prompt.as_bytes());
    *hasher.finalize().as_bytes()
}

struct CacheEntry {
    translated_text: String,
    inserted_at: Instant,
}

/// In-process LRU cache, the fast tier in front of the SQLite store.
/// Only pays off for long-lived hosts; per-keystroke processes rely on the
/// durable tier instead.
pub struct MemoryCache {
    inner: Mutex<LruCache<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl MemoryCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            ttl,
        }
    }

    /// Look up a cached translation. Returns None if absent or expired;
    /// an expired entry is removed as a side effect.
    pub fn get(&self, key: &CacheKey) -> Option<String> {
        let mut cache = self.inner.lock();
        if let Some(entry) = cache.get(key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.translated_text.clone());
            }
            cache.pop(key);
        }
        None
    }

    /// Insert or overwrite the entry for `key` with a fresh timestamp.
    pub fn insert(&self, key: CacheKey, translated_text: String) {
        let mut cache = self.inner.lock();
        cache.put(
            key,
            CacheEntry {
                translated_text,
                inserted_at: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_deterministic() {
        let a = compute_key("你好世界", "gpt-3.5-turbo", "translate:");
        let b = compute_key("你好世界", "gpt-3.5-turbo", "translate:");
        assert_eq!(a, b);
    }

    #[test]
    fn key_changes_with_any_input() {
        let base = compute_key("你好世界", "gpt-3.5-turbo", "translate:");
        assert_ne!(base, compute_key("你好，世界", "gpt-3.5-turbo", "translate:"));
        assert_ne!(base, compute_key("你好世界", "gpt-4o", "translate:"));
        assert_ne!(base, compute_key("你好世界", "gpt-3.5-turbo", "other prompt"));
    }

    #[test]
    fn round_trip() {
        let cache = MemoryCache::new(16, RETENTION_HORIZON);
        let key = compute_key("你好世界", "m", "p");
        cache.insert(key, "hello world".to_string());
        assert_eq!(cache.get(&key).as_deref(), Some("hello world"));
    }

    #[test]
    fn expired_entry_reads_as_absent() {
        let cache = MemoryCache::new(16, Duration::ZERO);
        let key = compute_key("你好世界", "m", "p");
        cache.insert(key, "hello world".to_string());
        assert_eq!(cache.get(&key), None);
        // Dropped by the failed read, not merely hidden.
        assert_eq!(cache.get(&key), None);
    }

    #[test]
    fn insert_overwrites() {
        let cache = MemoryCache::new(16, RETENTION_HORIZON);
        let key = compute_key("你好世界", "m", "p");
        cache.insert(key, "first".to_string());
        cache.insert(key, "second".to_string());
        assert_eq!(cache.get(&key).as_deref(), Some("second"));
    }
}
