// src/cache.rs
//! Time-boxed snapshot cache.
//!
//! One owned `{snapshot, computed_at}` slot behind a mutex. The lock is held
//! across a rebuild, so concurrent callers wait for the one rebuild in flight
//! instead of starting their own, and readers only ever see a complete
//! snapshot (`Arc` swap). A failed rebuild keeps serving the previous snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

struct Slot<T> {
    snapshot: Arc<T>,
    computed_at: Instant,
}

pub struct SnapshotCache<T> {
    slot: Mutex<Option<Slot<T>>>,
    hits: AtomicU64,
    rebuilds: AtomicU64,
}

impl<T> Default for SnapshotCache<T> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
            hits: AtomicU64::new(0),
            rebuilds: AtomicU64::new(0),
        }
    }
}

impl<T> SnapshotCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached snapshot if it is at most `ttl` old at `now`, otherwise the
    /// result of `rebuild`.
    pub fn get_or_refresh<F, E>(&self, now: Instant, ttl: Duration, rebuild: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: std::fmt::Display,
    {
        let mut guard = self.slot.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(slot) = guard.as_ref() {
            if now.saturating_duration_since(slot.computed_at) <= ttl {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Arc::clone(&slot.snapshot));
            }
        }

        match rebuild() {
            Ok(value) => {
                let snapshot = Arc::new(value);
                *guard = Some(Slot {
                    snapshot: Arc::clone(&snapshot),
                    computed_at: now,
                });
                self.rebuilds.fetch_add(1, Ordering::Relaxed);
                debug!(target: "cache", "snapshot rebuilt");
                Ok(snapshot)
            }
            Err(e) => match guard.as_ref() {
                Some(slot) => {
                    warn!(target: "cache", error = %e, "rebuild failed; serving stale snapshot");
                    Ok(Arc::clone(&slot.snapshot))
                }
                None => Err(e),
            },
        }
    }

    /// Current snapshot regardless of age.
    pub fn peek(&self) -> Option<Arc<T>> {
        let guard = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().map(|s| Arc::clone(&s.snapshot))
    }

    pub fn computed_at(&self) -> Option<Instant> {
        let guard = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().map(|s| s.computed_at)
    }

    /// Forget the snapshot; the next call rebuilds.
    pub fn invalidate(&self) {
        let mut guard = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn rebuilds(&self) -> u64 {
        self.rebuilds.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_same_snapshot_within_ttl() {
        let cache = SnapshotCache::new();
        let t0 = Instant::now();
        let ttl = Duration::from_secs(3600);
        let a = cache
            .get_or_refresh(t0, ttl, || Ok::<_, anyhow::Error>(vec![1, 2, 3]))
            .unwrap();
        let b = cache
            .get_or_refresh(t0 + Duration::from_secs(10), ttl, || {
                Ok::<_, anyhow::Error>(vec![9])
            })
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.rebuilds(), 1);

        let c = cache
            .get_or_refresh(t0 + ttl + Duration::from_secs(1), ttl, || {
                Ok::<_, anyhow::Error>(vec![9])
            })
            .unwrap();
        assert_eq!(*c, vec![9]);
        assert_eq!(cache.rebuilds(), 2);
    }

    #[test]
    fn failed_rebuild_keeps_old_snapshot() {
        let cache = SnapshotCache::new();
        let t0 = Instant::now();
        let ttl = Duration::from_secs(1);
        cache
            .get_or_refresh(t0, ttl, || Ok::<_, anyhow::Error>("v1".to_string()))
            .unwrap();
        let stale = cache
            .get_or_refresh(t0 + Duration::from_secs(5), ttl, || anyhow::bail!("source down"))
            .unwrap();
        assert_eq!(*stale, "v1");

        let empty: SnapshotCache<String> = SnapshotCache::new();
        assert!(empty
            .get_or_refresh(t0, ttl, || anyhow::bail!("source down"))
            .is_err());
    }

    #[test]
    fn concurrent_callers_share_one_rebuild() {
        use std::sync::Barrier;

        let cache = SnapshotCache::new();
        let t0 = Instant::now();
        let ttl = Duration::from_secs(60);
        cache
            .get_or_refresh(t0, ttl, || Ok::<_, anyhow::Error>(0u32))
            .unwrap();

        let expired = t0 + ttl + Duration::from_secs(1);
        let barrier = Barrier::new(2);
        let results: Vec<Arc<u32>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..2u32)
                .map(|i| {
                    let (cache, barrier) = (&cache, &barrier);
                    s.spawn(move || {
                        barrier.wait();
                        cache
                            .get_or_refresh(expired, ttl, || {
                                std::thread::sleep(Duration::from_millis(50));
                                Ok::<_, anyhow::Error>(i + 1)
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        // priming plus exactly one of the two expired reads
        assert_eq!(cache.rebuilds(), 2);
        assert_eq!(cache.hits(), 1);
        assert!(Arc::ptr_eq(&results[0], &results[1]));
    }
}
