use char_duper_core::import_check::PROVENANCE_SCORE;
use char_duper_core::similarity::{Confidence, Scorer};
use char_duper_core::{check_for_duplicates, check_new_character_for_duplicates, CharacterRecord};

fn existing() -> Vec<CharacterRecord> {
    vec![
        CharacterRecord::new("Alice")
            .with_creator("Bob")
            .with_avatar("alice.png"),
        CharacterRecord::new("Alice v2")
            .with_creator("Bob")
            .with_avatar("alice_v2.png"),
        CharacterRecord::new("Totally Different")
            .with_creator("Someone")
            .with_avatar("different.png")
            .with_source_path("characters/someone/totally-different"),
        CharacterRecord::new("Xylophone").with_avatar("xylo.png"),
    ]
}

#[test]
fn test_candidate_matches_sorted_by_score() {
    let candidate = CharacterRecord::new("alice").with_creator("BOB");

    let matches = check_new_character_for_duplicates(&candidate, &existing());
    let avatars: Vec<&str> = matches.iter().map(|m| m.character.avatar.as_str()).collect();
    assert_eq!(avatars, vec!["alice.png", "alice_v2.png"]);
    assert_eq!(matches[0].score, 45);
    assert_eq!(matches[1].score, 40);
    assert!(matches.iter().all(|m| !m.provenance));
}

#[test]
fn test_source_path_short_circuits_scorer() {
    let candidate = CharacterRecord::new("Renamed Upload")
        .with_source_path("Characters/Someone/Totally-Different");

    let matches = check_new_character_for_duplicates(&candidate, &existing());
    assert_eq!(matches.len(), 1);
    let m = &matches[0];
    assert_eq!(m.character.avatar, "different.png");
    assert_eq!(m.score, PROVENANCE_SCORE);
    assert_eq!(m.confidence, Confidence::High);
    assert!(m.provenance);
    assert!(m.breakdown.is_empty());
    assert_eq!(m.match_reasons, vec!["Same source path".to_string()]);
}

#[test]
fn test_source_path_substring_match() {
    let candidate = CharacterRecord::new("Renamed Upload")
        .with_source_path("https://hub.example/characters/someone/totally-different");

    let matches = check_new_character_for_duplicates(&candidate, &existing());
    assert_eq!(matches.len(), 1);
    assert!(matches[0].provenance);
}

#[test]
fn test_blank_source_path_is_ignored() {
    let candidate = CharacterRecord::new("Renamed Upload").with_source_path("   ");
    let mut records = existing();
    records[3].source_path = Some(String::new());

    let matches = check_new_character_for_duplicates(&candidate, &records);
    assert!(matches.is_empty());
}

#[test]
fn test_provenance_ranks_above_fuzzy_matches() {
    let candidate = CharacterRecord::new("Alice")
        .with_creator("Bob")
        .with_source_path("characters/someone/totally-different");

    let matches = check_new_character_for_duplicates(&candidate, &existing());
    assert_eq!(matches.len(), 3);
    assert_eq!(matches[0].character.avatar, "different.png");
    assert!(matches[0].provenance);
}

#[test]
fn test_threshold_applies_to_candidates() {
    let candidate = CharacterRecord::new("Alice").with_creator("Bob");

    let matches = check_for_duplicates(&candidate, &existing(), &Scorer::new(42));
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].character.avatar, "alice.png");
}

#[test]
fn test_no_existing_characters() {
    let candidate = CharacterRecord::new("Alice");
    assert!(check_new_character_for_duplicates(&candidate, &[]).is_empty());
}
