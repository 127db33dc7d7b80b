use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "char-duper")]
#[command(about = "Find duplicate characters in a character collection", long_about = None)]
pub struct Cli {
    /// Character collection JSON file (overrides `characters_path`)
    #[arg(short, long, global = true)]
    pub characters: Option<PathBuf>,

    /// Minimum score for a match (overrides `min_score`)
    #[arg(short, long, global = true)]
    pub min_score: Option<i64>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find duplicate groups across the whole collection
    Scan {
        /// Ignore any cached result
        #[arg(long)]
        force: bool,
        /// Also write the groups to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Check one import candidate against the collection
    Check {
        /// JSON file holding the candidate record
        candidate: PathBuf,
    },
    /// Show the score breakdown for two characters, by avatar
    Compare { first: String, second: String },
    /// Print configuration values
    PrintConfig,
}
