use crate::engine::DuplicateGroup;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

lazy_static::lazy_static! {
    /// Process-wide group cache shared by every engine that doesn't bring its own.
    pub static ref GROUP_CACHE: Arc<GroupCache> = Arc::new(GroupCache::new());
}

/// One completed scan.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub created: Instant,
    pub character_count: usize,
    pub min_score: u32,
    pub groups: Arc<Vec<DuplicateGroup>>,
}

impl CacheEntry {
    /// Count and threshold must match and the entry must be younger than `ttl`.
    /// Edits that keep the collection size are not detected.
    pub fn is_fresh(&self, character_count: usize, min_score: u32, ttl: Duration) -> bool {
        self.character_count == character_count
            && self.min_score == min_score
            && self.created.elapsed() < ttl
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entry: Option<CacheEntry>,
    scanning: bool,
}

/// Coarse TTL cache for duplicate scan results.
///
/// At most one scan per cache runs at a time: a second caller blocks until the
/// in-flight scan lands and then reads its result. The data lock itself is
/// only held for lookups and stores, never while a scan runs.
#[derive(Debug, Default)]
pub struct GroupCache {
    state: Mutex<CacheState>,
    scan_done: Condvar,
}

pub(crate) enum Lookup<'a> {
    Hit(Arc<Vec<DuplicateGroup>>),
    Miss(ScanPermit<'a>),
}

/// Marks a scan in flight. Dropping it, stored or not, wakes waiting callers.
pub(crate) struct ScanPermit<'a> {
    cache: &'a GroupCache,
}

impl ScanPermit<'_> {
    pub(crate) fn store(&self, entry: CacheEntry) {
        self.cache.lock().entry = Some(entry);
    }
}

impl Drop for ScanPermit<'_> {
    fn drop(&mut self) {
        self.cache.lock().scanning = false;
        self.cache.scan_done.notify_all();
    }
}

impl GroupCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // A panic mid-store leaves at worst a stale entry behind.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Wait out any in-flight scan, then either serve a fresh entry or hand
    /// back a permit to run a new scan.
    pub(crate) fn acquire(
        &self,
        character_count: usize,
        min_score: u32,
        ttl: Duration,
        force_refresh: bool,
    ) -> Lookup<'_> {
        let mut state = self.lock();
        while state.scanning {
            trace!("Waiting for in-flight duplicate scan");
            state = self
                .scan_done
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }

        if !force_refresh {
            if let Some(groups) = lookup(&state.entry, character_count, min_score, ttl) {
                return Lookup::Hit(groups);
            }
        }

        state.scanning = true;
        Lookup::Miss(ScanPermit { cache: self })
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entry.is_none()
    }

    pub fn clear(&self) {
        if self.lock().entry.take().is_some() {
            info!("Duplicate group cache cleared");
        }
    }
}

fn lookup(
    entry: &Option<CacheEntry>,
    character_count: usize,
    min_score: u32,
    ttl: Duration,
) -> Option<Arc<Vec<DuplicateGroup>>> {
    match entry {
        Some(entry) if entry.is_fresh(character_count, min_score, ttl) => {
            trace!(
                "Cache hit: {} groups, age {:.1}s",
                entry.groups.len(),
                entry.created.elapsed().as_secs_f64()
            );
            Some(Arc::clone(&entry.groups))
        }
        Some(_) => {
            debug!("Cache entry stale, rescanning");
            None
        }
        None => None,
    }
}

/// Remove the process-wide cache entry. Call after characters are deleted,
/// imported or edited.
pub fn clear_duplicate_cache() {
    GROUP_CACHE.clear();
}
