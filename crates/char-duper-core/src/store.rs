use crate::error::Error;
use crate::model::CharacterRecord;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize)]
#[serde(untagged)]
enum CollectionFile {
    List(Vec<CharacterRecord>),
    Wrapped { characters: Vec<CharacterRecord> },
}

/// Load an ordered character collection from a JSON file.
///
/// Accepts either a bare array of records or an object with a `characters`
/// array. Order is preserved since scan results depend on it.
pub fn load_characters(path: &Path) -> Result<Vec<CharacterRecord>, Error> {
    let data = fs::read_to_string(path)?;
    let characters = parse_characters(&data)?;
    debug!(
        "Loaded {} characters from {}",
        characters.len(),
        path.display()
    );
    Ok(characters)
}

pub fn parse_characters(data: &str) -> Result<Vec<CharacterRecord>, Error> {
    let characters = match serde_json::from_str::<CollectionFile>(data)? {
        CollectionFile::List(list) => list,
        CollectionFile::Wrapped { characters } => characters,
    };
    Ok(characters)
}

/// Load a single record, used for import candidates.
pub fn load_character(path: &Path) -> Result<CharacterRecord, Error> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Find a record by its avatar handle.
pub fn find_by_avatar<'a>(
    characters: &'a [CharacterRecord],
    avatar: &str,
) -> Option<&'a CharacterRecord> {
    characters.iter().find(|c| c.avatar == avatar)
}
