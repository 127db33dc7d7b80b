use crate::config::{clamp_min_score, DEFAULT_MIN_SCORE};
use crate::model::CharacterRecord;
use crate::normalize::{NormalizedCharacter, TextField};
use ahash::AHashSet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::trace;

pub const HIGH_CONFIDENCE_SCORE: u32 = 60;
pub const MEDIUM_CONFIDENCE_SCORE: u32 = 40;

const EXACT_NAME_POINTS: u32 = 25;
const NAME_VARIANT_POINTS: u32 = 20;
const FUZZY_NAME_WEIGHT: f64 = 15.0;
const FUZZY_NAME_MIN: f64 = 0.70;
const FUZZY_NAME_REASON_MIN: f64 = 0.85;
const CREATOR_POINTS: u32 = 20;
const CONTENT_MIN: f64 = 0.30;
const MAX_REASONS: usize = 3;

/// Closed, ordered confidence classification. `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Classify a score. Scores of zero or below `min_score` have no confidence.
    pub fn classify(score: u32, min_score: u32) -> Option<Confidence> {
        if score == 0 || score < min_score {
            None
        } else if score >= HIGH_CONFIDENCE_SCORE {
            Some(Confidence::High)
        } else if score >= MEDIUM_CONFIDENCE_SCORE {
            Some(Confidence::Medium)
        } else {
            Some(Confidence::Low)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields that can contribute points, in computation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Creator,
    Description,
    FirstMes,
    Personality,
    Scenario,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Creator => "creator",
            Field::Description => "description",
            Field::FirstMes => "first_mes",
            Field::Personality => "personality",
            Field::Scenario => "scenario",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimilarityResult {
    pub score: u32,
    /// Points per contributing field. Fields that scored nothing are absent.
    pub breakdown: BTreeMap<Field, u32>,
    pub confidence: Option<Confidence>,
    pub match_reasons: Vec<String>,
}

impl SimilarityResult {
    pub fn is_match(&self) -> bool {
        self.confidence.is_some()
    }
}

/// How one content field is weighted.
struct ContentRule {
    field: Field,
    weight: f64,
    reason_min: Option<f64>,
    label: &'static str,
}

const CONTENT_RULES: [ContentRule; 4] = [
    ContentRule {
        field: Field::Description,
        weight: 20.0,
        reason_min: Some(0.70),
        label: "description",
    },
    ContentRule {
        field: Field::FirstMes,
        weight: 15.0,
        reason_min: Some(0.70),
        label: "first message",
    },
    ContentRule {
        field: Field::Personality,
        weight: 10.0,
        reason_min: Some(0.80),
        label: "personality",
    },
    ContentRule {
        field: Field::Scenario,
        weight: 5.0,
        reason_min: None,
        label: "scenario",
    },
];

/// Weighted multi-field similarity scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scorer {
    min_score: u32,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SCORE)
    }
}

impl Scorer {
    /// Out-of-range thresholds are clamped to 0..=100.
    pub fn new(min_score: i64) -> Self {
        Self {
            min_score: clamp_min_score(min_score),
        }
    }

    pub fn min_score(&self) -> u32 {
        self.min_score
    }

    pub fn score(&self, a: &CharacterRecord, b: &CharacterRecord) -> SimilarityResult {
        let a = NormalizedCharacter::from_record(a);
        let b = NormalizedCharacter::from_record(b);
        self.score_normalized(&a, &b)
    }

    /// Score two pre-normalized characters. Has no notion of identity, so a
    /// caller comparing a record with itself gets a full-strength match.
    pub fn score_normalized(
        &self,
        a: &NormalizedCharacter,
        b: &NormalizedCharacter,
    ) -> SimilarityResult {
        let mut breakdown = BTreeMap::new();
        let mut reasons: Vec<String> = Vec::new();

        let (name_points, name_reason) = match score_name(a, b) {
            Some(hit) => hit,
            None => return SimilarityResult::default(),
        };
        breakdown.insert(Field::Name, name_points);
        if let Some(reason) = name_reason {
            reasons.push(reason);
        }

        if !a.creator.is_empty() && a.creator == b.creator {
            breakdown.insert(Field::Creator, CREATOR_POINTS);
            reasons.push("Same creator".to_string());
        }

        for rule in &CONTENT_RULES {
            let (fa, fb) = (content_field(a, rule.field), content_field(b, rule.field));
            if fa.is_empty() || fb.is_empty() {
                continue;
            }
            let similarity = field_similarity(fa, fb);
            if similarity < CONTENT_MIN {
                continue;
            }
            let points = (similarity * rule.weight).round() as u32;
            if points == 0 {
                continue;
            }
            breakdown.insert(rule.field, points);
            if let Some(reason_min) = rule.reason_min {
                if similarity >= reason_min {
                    reasons.push(format!(
                        "Similar {} ({}%)",
                        rule.label,
                        percent(similarity)
                    ));
                }
            }
        }

        let score: u32 = breakdown.values().sum();
        let confidence = Confidence::classify(score, self.min_score);
        reasons.truncate(MAX_REASONS);
        if reasons.is_empty() && confidence.is_some() {
            reasons.push(format!("{} point similarity score", score));
        }

        trace!(
            "'{}' vs '{}': score {} ({:?})",
            a.name_lower,
            b.name_lower,
            score,
            confidence
        );

        SimilarityResult {
            score,
            breakdown,
            confidence,
            match_reasons: reasons,
        }
    }
}

/// Score two records with the default threshold.
pub fn score_similarity(a: &CharacterRecord, b: &CharacterRecord) -> SimilarityResult {
    Scorer::default().score(a, b)
}

fn score_name(a: &NormalizedCharacter, b: &NormalizedCharacter) -> Option<(u32, Option<String>)> {
    if a.name_lower.is_empty() || b.name_lower.is_empty() {
        return None;
    }
    if a.name_lower == b.name_lower {
        return Some((EXACT_NAME_POINTS, Some("Exact name match".to_string())));
    }

    let (na, nb) = (&a.normalized_name, &b.normalized_name);
    let (len_a, len_b) = (na.chars().count(), nb.chars().count());
    if na == nb && len_a > 2 {
        return Some((NAME_VARIANT_POINTS, Some("Name variant match".to_string())));
    }
    if len_a <= 2 || len_b <= 2 {
        return None;
    }

    let similarity = string_similarity(na, nb);
    if similarity < FUZZY_NAME_MIN {
        return None;
    }
    let points = (similarity * FUZZY_NAME_WEIGHT).round() as u32;
    let reason = (similarity >= FUZZY_NAME_REASON_MIN)
        .then(|| format!("Similar name ({}%)", percent(similarity)));
    Some((points, reason))
}

fn content_field(c: &NormalizedCharacter, field: Field) -> &TextField {
    match field {
        Field::Description => &c.description,
        Field::FirstMes => &c.first_mes,
        Field::Personality => &c.personality,
        _ => &c.scenario,
    }
}

/// Word overlap when both sides carry a word set, edit-distance ratio otherwise.
fn field_similarity(a: &TextField, b: &TextField) -> f64 {
    if a.text == b.text {
        return 1.0;
    }
    match (&a.words, &b.words) {
        (Some(wa), Some(wb)) => jaccard(wa, wb),
        _ => string_similarity(&a.text, &b.text),
    }
}

/// `1 - levenshtein / max_len` over characters.
///
/// Strings whose lengths differ by more than half of the longer one return 0
/// without computing the distance.
pub fn string_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let (len_a, len_b) = (a.chars().count(), b.chars().count());
    let longer = len_a.max(len_b);
    let shorter = len_a.min(len_b);
    if longer == 0 {
        return 1.0;
    }
    if (longer - shorter) as f64 > longer as f64 * 0.5 {
        return 0.0;
    }
    let distance = strsim::levenshtein(a, b);
    1.0 - distance as f64 / longer as f64
}

/// Jaccard index `|A ∩ B| / |A ∪ B|`; empty sets share nothing.
pub fn jaccard(a: &AHashSet<String>, b: &AHashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = small.iter().filter(|w| large.contains(*w)).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

fn percent(similarity: f64) -> u32 {
    (similarity * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::word_set;

    #[test]
    fn test_string_similarity_basics() {
        assert_eq!(string_similarity("alice", "alice"), 1.0);
        assert_eq!(string_similarity("", ""), 1.0);
        assert!((string_similarity("kitten", "sitting") - (1.0 - 3.0 / 7.0)).abs() < 1e-9);
    }

    #[test]
    fn test_string_similarity_length_gate() {
        // 3 vs 9 chars: difference 6 > 4.5
        assert_eq!(string_similarity("abc", "abcdefghi"), 0.0);
        assert_eq!(string_similarity("", "abc"), 0.0);
    }

    #[test]
    fn test_string_similarity_is_symmetric() {
        let pairs = [("zara", "sara"), ("marianne", "marion"), ("bob", "rob")];
        for (a, b) in pairs {
            assert_eq!(string_similarity(a, b), string_similarity(b, a));
        }
    }

    #[test]
    fn test_jaccard() {
        let a = word_set("red green blue");
        let b = word_set("red green yellow");
        assert!((jaccard(&a, &b) - 0.5).abs() < 1e-9);
        assert_eq!(jaccard(&a, &a), 1.0);
        assert_eq!(jaccard(&a, &AHashSet::new()), 0.0);
    }

    #[test]
    fn test_confidence_classification() {
        assert_eq!(Confidence::classify(0, 0), None);
        assert_eq!(Confidence::classify(34, 35), None);
        assert_eq!(Confidence::classify(35, 35), Some(Confidence::Low));
        assert_eq!(Confidence::classify(40, 35), Some(Confidence::Medium));
        assert_eq!(Confidence::classify(59, 35), Some(Confidence::Medium));
        assert_eq!(Confidence::classify(60, 35), Some(Confidence::High));
        assert_eq!(Confidence::classify(20, 0), Some(Confidence::Low));
        assert_eq!(Confidence::classify(95, 100), None);
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(Confidence::High > Confidence::Medium);
        assert!(Confidence::Medium > Confidence::Low);
    }

    #[test]
    fn test_scorer_clamps_threshold() {
        assert_eq!(Scorer::new(-10).min_score(), 0);
        assert_eq!(Scorer::new(500).min_score(), 100);
        assert_eq!(Scorer::default().min_score(), 35);
    }
}
