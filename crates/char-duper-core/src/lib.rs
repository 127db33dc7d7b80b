pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod import_check;
pub mod model;
pub mod normalize;
pub mod progress;
pub mod similarity;
pub mod store;

pub use cache::{clear_duplicate_cache, GroupCache};
pub use config::AppConfig;
pub use engine::{
    find_duplicate_groups, CancelToken, DuplicateGroup, DuplicateMatch, ScanEngine, ScanResult,
};
pub use error::Error;
pub use import_check::{check_for_duplicates, check_new_character_for_duplicates, ImportMatch};
pub use model::CharacterRecord;
pub use progress::{ProgressReporter, SilentReporter};
pub use similarity::{score_similarity, Confidence, Field, Scorer, SimilarityResult};
