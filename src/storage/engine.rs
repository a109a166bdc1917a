//! Sharded Byte Store
//!
//! The native store of one memory-backend database. Keys and values are
//! opaque byte strings; encoding values is the connection's job.
//!
//! ```text
//!   key ──hash──> shard[i] = RwLock<HashMap<key, Slot>>     (i < 64)
//! ```
//!
//! Readers of different shards never contend and readers of one shard
//! share its lock. Because shards are picked by hash, ordered traversal
//! goes through `sorted_keys`, which collects and sorts the live keys.
//!
//! A slot may carry a deadline. Expired slots are dropped when a lookup
//! runs into them, or all at once by `cleanup_expired`.

use bytes::Bytes;
use std::collections::hash_map::{DefaultHasher, Entry};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

const SHARD_COUNT: usize = 64;

/// Bytes charged per key on top of its key and value lengths
const SLOT_OVERHEAD: usize = 64;

type Shard = RwLock<HashMap<Bytes, Slot>>;

#[derive(Debug, Clone)]
struct Slot {
    value: Bytes,
    deadline: Option<Instant>,
}

impl Slot {
    fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Whole seconds left, `-1` without a deadline.
    fn remaining_secs(&self, now: Instant) -> i64 {
        match self.deadline {
            Some(deadline) => deadline.saturating_duration_since(now).as_secs() as i64,
            None => -1,
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    keys: AtomicU64,
    gets: AtomicU64,
    sets: AtomicU64,
    dels: AtomicU64,
    expired: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Books `n` keys that went away because they expired.
    fn expire(&self, n: u64) {
        self.keys.fetch_sub(n, Ordering::Relaxed);
        self.expired.fetch_add(n, Ordering::Relaxed);
    }
}

/// A sharded, thread-safe byte map with optional per-key deadlines.
///
/// ```
/// use kvbridge::storage::StorageEngine;
/// use bytes::Bytes;
/// use std::time::Duration;
///
/// let engine = StorageEngine::new();
/// engine.set(Bytes::from("name"), Bytes::from("Ariz"));
/// assert_eq!(engine.get(b"name"), Some(Bytes::from("Ariz")));
///
/// engine.expire(b"name", Duration::from_secs(60));
/// assert!(engine.ttl(b"name").unwrap() > 0);
/// ```
pub struct StorageEngine {
    shards: Box<[Shard]>,
    counters: Counters,
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("shards", &self.shards.len())
            .field("counters", &self.counters)
            .finish()
    }
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| Shard::default()).collect(),
            counters: Counters::default(),
        }
    }

    fn shard(&self, key: &[u8]) -> &Shard {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[hasher.finish() as usize % SHARD_COUNT]
    }

    /// Stores `value` under `key` without a deadline.
    ///
    /// Returns `true` if the key was absent or had expired.
    pub fn set(&self, key: Bytes, value: Bytes) -> bool {
        Counters::bump(&self.counters.sets);
        let slot = Slot {
            value,
            deadline: None,
        };

        let mut map = self.shard(&key).write().unwrap();
        match map.insert(key, slot) {
            None => {
                Counters::bump(&self.counters.keys);
                true
            }
            Some(old) if old.is_expired(Instant::now()) => {
                Counters::bump(&self.counters.expired);
                true
            }
            Some(_) => false,
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        Counters::bump(&self.counters.gets);
        self.live_slot(key).map(|slot| slot.value)
    }

    /// Copy of the live slot for `key`, dropping it first if it expired.
    fn live_slot(&self, key: &[u8]) -> Option<Slot> {
        let shard = self.shard(key);
        let now = Instant::now();

        match shard.read().unwrap().get(key) {
            None => return None,
            Some(slot) if !slot.is_expired(now) => return Some(slot.clone()),
            Some(_) => {}
        }

        // Recheck under the write lock; a writer may have replaced it
        let mut map = shard.write().unwrap();
        match map.get(key).map(|slot| slot.is_expired(now)) {
            Some(true) => {
                map.remove(key);
                self.counters.expire(1);
                None
            }
            Some(false) => map.get(key).cloned(),
            None => None,
        }
    }

    /// Removes `key`. Returns `true` only if a live key went away.
    pub fn delete(&self, key: &[u8]) -> bool {
        Counters::bump(&self.counters.dels);

        let removed = self.shard(key).write().unwrap().remove(key);
        match removed {
            Some(slot) if slot.is_expired(Instant::now()) => {
                self.counters.expire(1);
                false
            }
            Some(_) => {
                self.counters.keys.fetch_sub(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Gives a live key a deadline `ttl` from now.
    ///
    /// Returns `false` if there is no live key.
    pub fn expire(&self, key: &[u8], ttl: Duration) -> bool {
        let now = Instant::now();
        let mut map = self.shard(key).write().unwrap();

        let Entry::Occupied(mut occupied) = map.entry(Bytes::copy_from_slice(key)) else {
            return false;
        };
        if occupied.get().is_expired(now) {
            occupied.remove();
            self.counters.expire(1);
            return false;
        }
        occupied.get_mut().deadline = Some(now + ttl);
        true
    }

    /// Seconds until `key` expires: `-1` without a deadline, `None` if absent.
    pub fn ttl(&self, key: &[u8]) -> Option<i64> {
        self.live_slot(key)
            .map(|slot| slot.remaining_secs(Instant::now()))
    }

    /// Every live key, in ascending byte order.
    pub fn sorted_keys(&self) -> Vec<Bytes> {
        let now = Instant::now();
        let mut keys = Vec::with_capacity(self.len() as usize);
        for shard in self.shards.iter() {
            let map = shard.read().unwrap();
            keys.extend(
                map.iter()
                    .filter(|(_, slot)| !slot.is_expired(now))
                    .map(|(key, _)| key.clone()),
            );
        }
        keys.sort_unstable();
        keys
    }

    pub fn flush(&self) {
        for shard in self.shards.iter() {
            shard.write().unwrap().clear();
        }
        self.counters.keys.store(0, Ordering::Relaxed);
    }

    /// Key count, including expired keys nobody has touched yet.
    pub fn len(&self) -> u64 {
        self.counters.keys.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every expired key and returns how many there were.
    pub fn cleanup_expired(&self) -> u64 {
        let now = Instant::now();
        let mut dropped = 0u64;

        for shard in self.shards.iter() {
            let mut map = shard.write().unwrap();
            let before = map.len();
            map.retain(|_, slot| !slot.is_expired(now));
            dropped += (before - map.len()) as u64;
        }

        if dropped > 0 {
            self.counters.expire(dropped);
        }
        dropped
    }

    /// Counters plus a walk over the live keys for the memory estimate.
    pub fn stats(&self) -> StorageStats {
        let now = Instant::now();
        let mut live_keys = 0u64;
        let mut used_memory = 0u64;

        for shard in self.shards.iter() {
            for (key, slot) in shard.read().unwrap().iter() {
                if !slot.is_expired(now) {
                    live_keys += 1;
                    used_memory += (key.len() + slot.value.len() + SLOT_OVERHEAD) as u64;
                }
            }
        }

        StorageStats {
            live_keys,
            used_memory,
            get_ops: self.counters.gets.load(Ordering::Relaxed),
            set_ops: self.counters.sets.load(Ordering::Relaxed),
            del_ops: self.counters.dels.load(Ordering::Relaxed),
            expired: self.counters.expired.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of one engine, as reported by `INFO`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub live_keys: u64,
    /// Estimated, in bytes
    pub used_memory: u64,
    pub get_ops: u64,
    pub set_ops: u64,
    pub del_ops: u64,
    pub expired: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }

    #[test]
    fn test_set_reports_new_keys() {
        let engine = StorageEngine::new();

        assert!(engine.set(b("k"), b("v1")));
        assert!(!engine.set(b("k"), b("v2")));
        assert_eq!(engine.get(b"k"), Some(b("v2")));
        assert_eq!(engine.get(b"missing"), None);
        assert_eq!(engine.len(), 1);

        engine.set(b("gone"), b("v"));
        engine.expire(b"gone", Duration::ZERO);
        assert!(engine.set(b("gone"), b("back")));
        assert_eq!(engine.len(), 2);
        assert_eq!(engine.stats().expired, 1);
        assert_eq!(engine.ttl(b"gone"), Some(-1));
    }

    #[test]
    fn test_delete_counts_live_keys_only() {
        let engine = StorageEngine::new();

        engine.set(b("k"), b("v"));
        assert!(engine.delete(b"k"));
        assert!(!engine.delete(b"k"));
        assert!(engine.is_empty());

        engine.set(b("stale"), b("v"));
        engine.expire(b"stale", Duration::ZERO);
        assert!(!engine.delete(b"stale"));
        assert!(engine.is_empty());
        assert_eq!(engine.stats().del_ops, 3);
    }

    #[test]
    fn test_lookup_drops_expired_key() {
        let engine = StorageEngine::new();
        engine.set(b("k"), b("v"));
        assert!(engine.expire(b"k", Duration::from_millis(30)));
        assert!(engine.get(b"k").is_some());

        std::thread::sleep(Duration::from_millis(60));

        assert_eq!(engine.get(b"k"), None);
        assert_eq!(engine.len(), 0);
        assert_eq!(engine.stats().expired, 1);
        assert!(!engine.expire(b"k", Duration::from_secs(1)));
    }

    #[test]
    fn test_ttl() {
        let engine = StorageEngine::new();
        assert_eq!(engine.ttl(b"missing"), None);

        engine.set(b("k"), b("v"));
        assert_eq!(engine.ttl(b"k"), Some(-1));

        assert!(engine.expire(b"k", Duration::from_secs(100)));
        let ttl = engine.ttl(b"k").unwrap();
        assert!(ttl > 0 && ttl <= 100);

        // A plain set clears the deadline
        engine.set(b("k"), b("v"));
        assert_eq!(engine.ttl(b"k"), Some(-1));
        assert!(!engine.expire(b"missing", Duration::from_secs(1)));
    }

    #[test]
    fn test_sorted_keys_skip_expired() {
        let engine = StorageEngine::new();
        for key in ["delta", "alpha", "charlie", "bravo", "aaa"] {
            engine.set(b(key), b("v"));
        }
        engine.expire(b"aaa", Duration::ZERO);

        assert_eq!(
            engine.sorted_keys(),
            vec![b("alpha"), b("bravo"), b("charlie"), b("delta")]
        );
    }

    #[test]
    fn test_flush() {
        let engine = StorageEngine::new();
        engine.set(b("a"), b("1"));
        engine.set(b("b"), b("2"));

        engine.flush();
        assert!(engine.is_empty());
        assert!(engine.sorted_keys().is_empty());
        assert_eq!(engine.get(b"a"), None);
    }

    #[test]
    fn test_cleanup_and_stats() {
        let engine = StorageEngine::new();
        for key in ["a", "b", "c"] {
            engine.set(b(key), b("value"));
        }
        engine.expire(b"a", Duration::ZERO);
        engine.expire(b"b", Duration::ZERO);

        assert_eq!(engine.cleanup_expired(), 2);
        assert_eq!(engine.cleanup_expired(), 0);
        assert_eq!(engine.len(), 1);

        let stats = engine.stats();
        assert_eq!(stats.live_keys, 1);
        assert_eq!(stats.expired, 2);
        assert_eq!(stats.set_ops, 3);
        assert_eq!(stats.used_memory, (1 + 5 + SLOT_OVERHEAD) as u64);
    }

    #[test]
    fn test_parallel_writers() {
        use std::sync::Arc;
        use std::thread;

        let engine = Arc::new(StorageEngine::new());
        let workers: Vec<_> = (0..8)
            .map(|w| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    for n in 0..250 {
                        let key = Bytes::from(format!("w{}:{}", w, n));
                        engine.set(key.clone(), b("v"));
                        assert!(engine.get(&key).is_some());
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(engine.len(), 2000);
        assert_eq!(engine.sorted_keys().len(), 2000);
    }
}
