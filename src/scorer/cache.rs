use super::types::FitnessResult;
use crate::error::KfResult;
use crate::util::unix_timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fitness: f64,
    pub distance: f64,
    pub time: f64,
    pub timestamp: u64,
}

impl CacheEntry {
    fn is_valid(&self) -> bool {
        self.fitness.is_finite() && self.distance.is_finite() && self.time.is_finite()
    }

    fn result(&self) -> FitnessResult {
        FitnessResult {
            fitness: self.fitness,
            distance: self.distance,
            time: self.time,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub discarded: u64,
}

/// Fingerprint → fitness. Writes are whole-entry; concurrent writers of the same key
/// compute identical values, so last-writer-wins is harmless.
#[derive(Debug, Default)]
pub struct FitnessCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    discarded: AtomicU64,
}

impl FitnessCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, fingerprint: &str) -> Option<FitnessResult> {
        let found = {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            entries.get(fingerprint).copied()
        };

        match found {
            Some(entry) if entry.is_valid() => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.result())
            }
            Some(_) => {
                warn!("🧹 Discarding corrupt cache entry {}", fingerprint);
                self.entries
                    .write()
                    .unwrap_or_else(|e| e.into_inner())
                    .remove(fingerprint);
                self.discarded.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Non-finite results are never stored.
    pub fn insert(&self, fingerprint: String, result: FitnessResult) {
        if !result.is_finite() {
            return;
        }
        let entry = CacheEntry {
            fitness: result.fitness,
            distance: result.distance,
            time: result.time,
            timestamp: unix_timestamp(),
        };
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(fingerprint, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> KfResult<()> {
        let json = {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            serde_json::to_string(&*entries)?
        };
        fs::write(path.as_ref(), json)?;
        info!("💾 Saved fitness cache to {}", path.as_ref().display());
        Ok(())
    }

    /// Loads a saved cache. Entries that fail to parse or hold non-finite values are dropped.
    pub fn load<P: AsRef<Path>>(path: P) -> KfResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let raw: HashMap<String, serde_json::Value> = serde_json::from_str(&content)?;

        let mut entries = HashMap::with_capacity(raw.len());
        let mut discarded = 0u64;
        for (fingerprint, value) in raw {
            match serde_json::from_value::<CacheEntry>(value) {
                Ok(entry) if entry.is_valid() => {
                    entries.insert(fingerprint, entry);
                }
                _ => discarded += 1,
            }
        }
        if discarded > 0 {
            warn!(
                "🧹 Dropped {} malformed entries from {}",
                discarded,
                path.as_ref().display()
            );
        }

        Ok(Self {
            entries: RwLock::new(entries),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            discarded: AtomicU64::new(discarded),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(f: f64) -> FitnessResult {
        FitnessResult {
            fitness: f,
            distance: 10.0,
            time: 2.0,
        }
    }

    #[test]
    fn hit_and_miss_counters() {
        let cache = FitnessCache::new();
        assert!(cache.get("k").is_none());
        cache.insert("k".into(), result(0.25));
        assert_eq!(cache.get("k"), Some(result(0.25)));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn infinite_results_are_not_cached() {
        let cache = FitnessCache::new();
        cache.insert("k".into(), FitnessResult::failed());
        assert!(cache.is_empty());
    }

    #[test]
    fn corrupt_entry_is_dropped_on_lookup() {
        let cache = FitnessCache::new();
        cache.entries.write().unwrap().insert(
            "bad".into(),
            CacheEntry {
                fitness: f64::NAN,
                distance: 10.0,
                time: 2.0,
                timestamp: 0,
            },
        );

        assert!(cache.get("bad").is_none());
        let stats = cache.stats();
        assert_eq!(stats.discarded, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn last_writer_wins() {
        let cache = FitnessCache::new();
        cache.insert("k".into(), result(0.1));
        cache.insert("k".into(), result(0.2));
        assert_eq!(cache.get("k").map(|r| r.fitness), Some(0.2));
    }
}
