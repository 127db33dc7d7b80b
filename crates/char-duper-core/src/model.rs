use serde::{Deserialize, Deserializer, Serialize};

/// A character record as the surrounding gallery stores it.
///
/// Text fields that are missing or `null` in the source data deserialize to
/// the empty string and simply contribute nothing when scored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub creator: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub personality: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub scenario: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub first_mes: String,
    /// Opaque identity handle. Never parsed.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub avatar: String,
    /// Path the record was originally fetched from, if known.
    #[serde(
        default,
        alias = "sourcePath",
        alias = "full_path",
        skip_serializing_if = "Option::is_none"
    )]
    pub source_path: Option<String>,
}

impl CharacterRecord {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_creator(mut self, creator: &str) -> Self {
        self.creator = creator.to_string();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_personality(mut self, personality: &str) -> Self {
        self.personality = personality.to_string();
        self
    }

    pub fn with_scenario(mut self, scenario: &str) -> Self {
        self.scenario = scenario.to_string();
        self
    }

    pub fn with_first_mes(mut self, first_mes: &str) -> Self {
        self.first_mes = first_mes.to_string();
        self
    }

    pub fn with_avatar(mut self, avatar: &str) -> Self {
        self.avatar = avatar.to_string();
        self
    }

    pub fn with_source_path(mut self, source_path: &str) -> Self {
        self.source_path = Some(source_path.to_string());
        self
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
