use crate::model::CharacterRecord;
use crate::normalize::NormalizedCharacter;
use crate::similarity::{Confidence, Field, Scorer};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Score given to a record whose source path matches the candidate's.
pub const PROVENANCE_SCORE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportMatch {
    pub character: CharacterRecord,
    pub confidence: Confidence,
    pub score: u32,
    pub breakdown: BTreeMap<Field, u32>,
    pub match_reasons: Vec<String>,
    /// True when the match came from the source path rather than the scorer.
    pub provenance: bool,
}

/// Find existing records that may be the same character as `candidate`,
/// sorted by score, highest first.
///
/// A source path match is definitive and skips fuzzy scoring for that
/// record. The candidate is assumed not to be part of `existing`.
pub fn check_for_duplicates(
    candidate: &CharacterRecord,
    existing: &[CharacterRecord],
    scorer: &Scorer,
) -> Vec<ImportMatch> {
    let normalized = NormalizedCharacter::from_record(candidate);
    let candidate_source = normalized_source(candidate);

    let mut matches: Vec<ImportMatch> = existing
        .par_iter()
        .filter_map(|record| {
            if let (Some(wanted), Some(have)) = (&candidate_source, normalized_source(record)) {
                if wanted.contains(&have) || have.contains(wanted.as_str()) {
                    debug!("Source path match for '{}'", record.name);
                    return Some(ImportMatch {
                        character: record.clone(),
                        confidence: Confidence::High,
                        score: PROVENANCE_SCORE,
                        breakdown: BTreeMap::new(),
                        match_reasons: vec!["Same source path".to_string()],
                        provenance: true,
                    });
                }
            }

            let result =
                scorer.score_normalized(&normalized, &NormalizedCharacter::from_record(record));
            let confidence = result.confidence?;
            Some(ImportMatch {
                character: record.clone(),
                confidence,
                score: result.score,
                breakdown: result.breakdown,
                match_reasons: result.match_reasons,
                provenance: false,
            })
        })
        .collect();

    matches.sort_by(|a, b| b.score.cmp(&a.score));

    if !matches.is_empty() {
        info!(
            "'{}' may duplicate {} existing character(s)",
            candidate.name,
            matches.len()
        );
    }
    matches
}

/// Pre-import check with the default threshold.
pub fn check_new_character_for_duplicates(
    candidate: &CharacterRecord,
    existing: &[CharacterRecord],
) -> Vec<ImportMatch> {
    check_for_duplicates(candidate, existing, &Scorer::default())
}

fn normalized_source(record: &CharacterRecord) -> Option<String> {
    record
        .source_path
        .as_deref()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
}
