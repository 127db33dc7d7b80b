use crate::model::CharacterRecord;
use ahash::AHashSet;
use regex::Regex;

/// Texts shorter than this are compared directly instead of by word overlap.
pub const WORD_SET_MIN_CHARS: usize = 50;

/// Shortest token kept in a word set.
const MIN_WORD_CHARS: usize = 3;

lazy_static::lazy_static! {
    static ref VERSION_SUFFIX: Regex = Regex::new(
        r"(?i)\s*[-:]?\s*[(\[]?\s*\b(?:v|ver\.?|version)\s*\d+(?:\.\d+)*\s*[)\]]?\s*$"
    )
    .expect("version suffix pattern");
    static ref STATUS_SUFFIX: Regex = Regex::new(
        r"(?i)(?:\s*[(\[]\s*(?:updated?|new|old|alt|alternate|copy|edit(?:ed)?|fixed|remake)\s*[)\]]|\s+-\s*(?:updated?|new|old|alt|alternate|copy|edit(?:ed)?|fixed|remake))\s*$"
    )
    .expect("status suffix pattern");
}

/// Lowercase a name, strip trailing version/status suffixes such as `v2`,
/// `(updated)`, `ver. 3` or `- v4.1`, and collapse whitespace.
pub fn normalize_name(name: &str) -> String {
    let mut current = collapse_whitespace(&name.to_lowercase());
    loop {
        let stripped = VERSION_SUFFIX.replace(&current, "");
        let stripped = STATUS_SUFFIX.replace(&stripped, "").into_owned();
        if stripped == current {
            break;
        }
        current = stripped;
    }
    collapse_whitespace(&current)
}

/// Lowercase, trimmed, single-spaced form used for equality checks.
pub fn normalize_text(text: &str) -> String {
    collapse_whitespace(&text.to_lowercase())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Set of lowercase alphanumeric tokens at least three characters long.
pub fn word_set(text: &str) -> AHashSet<String> {
    let lowered = text.to_lowercase();
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_WORD_CHARS)
        .map(str::to_string)
        .collect()
}

/// A content field prepared for repeated comparison.
#[derive(Debug, Clone, Default)]
pub struct TextField {
    /// Trimmed lowercase text, empty when the source was blank.
    pub text: String,
    /// Word set, present only when the source text, padding included, is at
    /// least `WORD_SET_MIN_CHARS` long.
    pub words: Option<AHashSet<String>>,
}

impl TextField {
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        let words = if raw.chars().count() >= WORD_SET_MIN_CHARS {
            Some(word_set(trimmed))
        } else {
            None
        };
        Self {
            text: trimmed.to_lowercase(),
            words,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Per-scan derived form of a `CharacterRecord`.
#[derive(Debug, Clone, Default)]
pub struct NormalizedCharacter {
    pub name_lower: String,
    pub normalized_name: String,
    pub creator: String,
    pub description: TextField,
    pub first_mes: TextField,
    pub personality: TextField,
    pub scenario: TextField,
}

impl NormalizedCharacter {
    pub fn from_record(record: &CharacterRecord) -> Self {
        Self {
            name_lower: record.name.trim().to_lowercase(),
            normalized_name: normalize_name(&record.name),
            creator: normalize_text(&record.creator),
            description: TextField::new(&record.description),
            first_mes: TextField::new(&record.first_mes),
            personality: TextField::new(&record.personality),
            scenario: TextField::new(&record.scenario),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name_strips_version_suffixes() {
        assert_eq!(normalize_name("Alice v2"), "alice");
        assert_eq!(normalize_name("Alice ver. 3"), "alice");
        assert_eq!(normalize_name("Alice - v4.1"), "alice");
        assert_eq!(normalize_name("Alice (v2)"), "alice");
        assert_eq!(normalize_name("Alice Version 10"), "alice");
    }

    #[test]
    fn test_normalize_name_strips_status_suffixes() {
        assert_eq!(normalize_name("Alice (updated)"), "alice");
        assert_eq!(normalize_name("Alice [ALT]"), "alice");
        assert_eq!(normalize_name("Alice - copy"), "alice");
        assert_eq!(normalize_name("  Alice   Smith  v2 (Updated) "), "alice smith");
    }

    #[test]
    fn test_normalize_name_keeps_embedded_v() {
        assert_eq!(normalize_name("Rev2"), "rev2");
        assert_eq!(normalize_name("Steve"), "steve");
        assert_eq!(normalize_name("Newton"), "newton");
    }

    #[test]
    fn test_word_set_filters_short_tokens() {
        let words = word_set("A cat, the DOG and an owl-bear!");
        assert!(words.contains("cat"));
        assert!(words.contains("dog"));
        assert!(words.contains("owl"));
        assert!(words.contains("bear"));
        assert!(words.contains("the"));
        assert!(!words.contains("an"));
        assert!(!words.contains("a"));
    }

    #[test]
    fn test_text_field_word_set_threshold() {
        let short = TextField::new("  Short text  ");
        assert_eq!(short.text, "short text");
        assert!(short.words.is_none());

        let long = TextField::new(&"word ".repeat(12));
        assert!(long.words.is_some());

        assert!(TextField::new("   ").is_empty());
    }

    #[test]
    fn test_text_field_gate_counts_source_length() {
        // 44 chars of text padded to 55
        let padded = format!("{}{}", "word ".repeat(9).trim_end(), " ".repeat(11));
        assert_eq!(padded.chars().count(), 55);
        let field = TextField::new(&padded);
        assert_eq!(field.text.chars().count(), 44);
        assert!(field.words.is_some());
    }

    #[test]
    fn test_normalize_name_keeps_hyphenated_parts() {
        assert_eq!(normalize_name("Rose-Old"), "rose-old");
        assert_eq!(normalize_name("Jean-Alt"), "jean-alt");
        assert_eq!(normalize_name("Mary-New"), "mary-new");
        assert_eq!(normalize_name("Rose - Old"), "rose");
    }
}
