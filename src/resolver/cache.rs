// Short-lived cache of resolved media, keyed by platform + media id

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tracing::debug;

use super::models::MediaInfo;

struct Entry {
    stored_at: Instant,
    info: MediaInfo,
}

/// Bounded TTL cache; at most one entry per key and at most `capacity`
/// entries, least recently used evicted first
pub struct MediaCache {
    ttl: Duration,
    entries: Mutex<LruCache<String, Entry>>,
}

impl MediaCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn key(platform: &str, media_id: &str) -> String {
        format!("{}:{}", platform.to_lowercase(), media_id)
    }

    pub fn get(&self, key: &str) -> Option<MediaInfo> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                debug!("[Cache] Hit {}", key);
                return Some(entry.info.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            debug!("[Cache] Expired {}", key);
            entries.pop(key);
        }
        None
    }

    pub fn insert(&self, key: String, info: MediaInfo) {
        let mut entries = self.entries.lock();
        let ttl = self.ttl;
        let stale: Vec<String> = entries
            .iter()
            .filter(|(_, e)| e.stored_at.elapsed() >= ttl)
            .map(|(k, _)| k.clone())
            .collect();
        for k in stale {
            entries.pop(&k);
        }
        entries.put(
            key,
            Entry {
                stored_at: Instant::now(),
                info,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
