use crate::cache::{CacheEntry, GroupCache, Lookup, GROUP_CACHE};
use crate::config::AppConfig;
use crate::error::Error;
use crate::model::CharacterRecord;
use crate::normalize::NormalizedCharacter;
use crate::progress::{ProgressReporter, SilentReporter};
use crate::similarity::{Confidence, Field, Scorer};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// A record found to duplicate a group's reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateMatch {
    pub character: CharacterRecord,
    pub confidence: Confidence,
    pub score: u32,
    pub breakdown: BTreeMap<Field, u32>,
    pub match_reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// First unprocessed record in scan order; not chosen on content.
    pub reference: CharacterRecord,
    /// Sorted by score, highest first.
    pub duplicates: Vec<DuplicateMatch>,
    /// Highest confidence among the duplicates.
    pub confidence: Confidence,
}

impl DuplicateGroup {
    pub fn best_score(&self) -> u32 {
        self.duplicates.first().map(|d| d.score).unwrap_or(0)
    }

    /// Reference followed by every duplicate.
    pub fn members(&self) -> impl Iterator<Item = &CharacterRecord> {
        std::iter::once(&self.reference).chain(self.duplicates.iter().map(|d| &d.character))
    }
}

#[derive(Debug)]
pub struct ScanResult {
    pub groups: Arc<Vec<DuplicateGroup>>,
    pub from_cache: bool,
    pub comparisons: usize,
    pub duration: Duration,
}

/// Cooperative cancellation flag, checked at every chunk boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct ScanEngine {
    scorer: Scorer,
    ttl: Duration,
    chunk_size: usize,
    cache: Arc<GroupCache>,
    cancel: Option<CancelToken>,
}

impl ScanEngine {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            scorer: Scorer::new(config.min_score),
            ttl: Duration::from_secs(config.cache_ttl_secs),
            chunk_size: config.chunk_size.max(1),
            cache: Arc::clone(&GROUP_CACHE),
            cancel: None,
        }
    }

    /// Use a private cache instead of the process-wide one.
    pub fn with_cache(mut self, cache: Arc<GroupCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Partition `characters` into duplicate groups.
    ///
    /// 1. Serve from cache when count and threshold are unchanged and the
    ///    entry is younger than the TTL, unless `force_refresh`
    /// 2. Normalize every record once
    /// 3. Greedy index-ascending all-pairs scan; a matched record is
    ///    excluded from the rest of the scan
    /// 4. Sort groups by confidence, then best score
    ///
    /// O(N^2) comparisons. Progress is reported and cancellation checked every
    /// `chunk_size` outer iterations.
    pub fn scan(
        &self,
        characters: &[CharacterRecord],
        force_refresh: bool,
        reporter: &dyn ProgressReporter,
    ) -> Result<ScanResult, Error> {
        let start = Instant::now();
        let min_score = self.scorer.min_score();
        let permit = match self
            .cache
            .acquire(characters.len(), min_score, self.ttl, force_refresh)
        {
            Lookup::Hit(groups) => {
                reporter.on_cache_hit(groups.len());
                return Ok(ScanResult {
                    groups,
                    from_cache: true,
                    comparisons: 0,
                    duration: start.elapsed(),
                });
            }
            Lookup::Miss(permit) => permit,
        };

        info!("Scanning {} characters for duplicates...", characters.len());
        reporter.on_scan_start(characters.len());

        let normalized: Vec<NormalizedCharacter> = characters
            .par_iter()
            .map(NormalizedCharacter::from_record)
            .collect();
        debug!(
            "Normalized {} characters in {:.2}s",
            normalized.len(),
            start.elapsed().as_secs_f64()
        );

        let (mut groups, comparisons) = self.group(characters, &normalized, reporter)?;
        sort_groups(&mut groups);

        let groups = Arc::new(groups);
        permit.store(CacheEntry {
            created: Instant::now(),
            character_count: characters.len(),
            min_score,
            groups: Arc::clone(&groups),
        });
        drop(permit);

        let duration = start.elapsed();
        reporter.on_scan_progress(100);
        reporter.on_scan_complete(groups.len(), duration.as_secs_f64());
        info!(
            "Found {} duplicate groups in {:.2}s ({} comparisons)",
            groups.len(),
            duration.as_secs_f64(),
            comparisons
        );

        Ok(ScanResult {
            groups,
            from_cache: false,
            comparisons,
            duration,
        })
    }

    fn group(
        &self,
        characters: &[CharacterRecord],
        normalized: &[NormalizedCharacter],
        reporter: &dyn ProgressReporter,
    ) -> Result<(Vec<DuplicateGroup>, usize), Error> {
        let total = normalized.len();
        let mut processed = vec![false; total];
        let mut groups = Vec::new();
        let mut comparisons = 0usize;

        for i in 0..total {
            if i % self.chunk_size == 0 {
                if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                    info!("Duplicate scan cancelled at {}/{}", i, total);
                    return Err(Error::Cancelled);
                }
                reporter.on_scan_progress((i * 100 / total) as u8);
            }
            if processed[i] {
                continue;
            }

            let mut duplicates = Vec::new();
            for j in (i + 1)..total {
                if processed[j] {
                    continue;
                }
                comparisons += 1;
                let result = self.scorer.score_normalized(&normalized[i], &normalized[j]);
                if let Some(confidence) = result.confidence {
                    processed[j] = true;
                    duplicates.push(DuplicateMatch {
                        character: characters[j].clone(),
                        confidence,
                        score: result.score,
                        breakdown: result.breakdown,
                        match_reason: result.match_reasons.join(", "),
                    });
                }
            }

            if duplicates.is_empty() {
                continue;
            }
            processed[i] = true;
            duplicates.sort_by(|a, b| b.score.cmp(&a.score));
            let confidence = duplicates
                .iter()
                .map(|d| d.confidence)
                .max()
                .unwrap_or(Confidence::Low);
            groups.push(DuplicateGroup {
                reference: characters[i].clone(),
                duplicates,
                confidence,
            });
        }

        Ok((groups, comparisons))
    }
}

fn sort_groups(groups: &mut [DuplicateGroup]) {
    groups.sort_by(|a, b| {
        b.confidence
            .cmp(&a.confidence)
            .then_with(|| b.best_score().cmp(&a.best_score()))
    });
}

/// Find duplicate groups with the default settings and the process-wide cache.
pub fn find_duplicate_groups(
    characters: &[CharacterRecord],
    force_refresh: bool,
) -> Result<Arc<Vec<DuplicateGroup>>, Error> {
    let engine = ScanEngine::new(&AppConfig::default());
    Ok(engine.scan(characters, force_refresh, &SilentReporter)?.groups)
}
