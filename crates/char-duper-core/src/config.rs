use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;

pub const DEFAULT_MIN_SCORE: i64 = 35;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;
pub const DEFAULT_CHUNK_SIZE: usize = 50;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_characters_path")]
    pub characters_path: String,
    #[serde(default = "default_min_score")]
    pub min_score: i64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            characters_path: default_characters_path(),
            min_score: DEFAULT_MIN_SCORE,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

fn default_characters_path() -> String {
    "characters.json".to_string()
}

fn default_min_score() -> i64 {
    DEFAULT_MIN_SCORE
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

pub fn clamp_min_score(value: i64) -> u32 {
    value.clamp(0, 100) as u32
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("CHAR_DUPER").try_parsing(true))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_min_score() {
        assert_eq!(clamp_min_score(-5), 0);
        assert_eq!(clamp_min_score(0), 0);
        assert_eq!(clamp_min_score(35), 35);
        assert_eq!(clamp_min_score(250), 100);
    }

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config = Config::builder()
            .set_override("min_score", 50)
            .unwrap()
            .build()
            .unwrap();
        let app: AppConfig = config.try_deserialize().unwrap();
        assert_eq!(app.min_score, 50);
        assert_eq!(app.cache_ttl_secs, 60);
        assert_eq!(app.chunk_size, 50);
        assert_eq!(app.characters_path, "characters.json");
    }
}
