mod commands;
mod logging;
mod progress;

use std::path::Path;
use std::process;

use anyhow::{bail, Context};
use char_duper_core::similarity::Confidence;
use char_duper_core::{
    check_for_duplicates, store, AppConfig, CharacterRecord, DuplicateGroup, ScanEngine, Scorer,
};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use progress::CliReporter;
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let mut config = match char_duper_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();
    if let Some(path) = &args.characters {
        config.characters_path = path.to_string_lossy().into_owned();
    }
    if let Some(min_score) = args.min_score {
        config.min_score = min_score;
    }

    let outcome = match args.command {
        Some(Commands::Scan { force, csv }) => run_scan(&config, force, csv.as_deref()),
        Some(Commands::Check { candidate }) => run_check(&config, &candidate),
        Some(Commands::Compare { first, second }) => run_compare(&config, &first, &second),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = outcome {
        error!("Error: {:#}", err);
        process::exit(1);
    }

    Ok(())
}

fn load_collection(config: &AppConfig) -> anyhow::Result<Vec<CharacterRecord>> {
    let path = Path::new(&config.characters_path);
    store::load_characters(path)
        .with_context(|| format!("loading characters from {}", path.display()))
}

fn run_scan(config: &AppConfig, force: bool, csv_path: Option<&Path>) -> anyhow::Result<()> {
    let characters = load_collection(config)?;
    let engine = ScanEngine::new(config);
    let reporter = CliReporter::new();
    let result = engine.scan(&characters, force, &reporter)?;

    println!();
    for group in result.groups.iter() {
        print_group(group);
    }

    let duplicate_count: usize = result.groups.iter().map(|g| g.duplicates.len()).sum();
    info!(
        "{} duplicate groups, {} possible duplicates among {} characters ({} comparisons in {})",
        format!("{}", result.groups.len()).red(),
        format!("{}", duplicate_count).red(),
        characters.len(),
        result.comparisons,
        format!("{:.2}s", result.duration.as_secs_f64()).green(),
    );

    if let Some(path) = csv_path {
        write_csv(path, &result.groups)
            .with_context(|| format!("writing CSV to {}", path.display()))?;
        info!("Wrote duplicate groups to {}", path.display());
    }

    Ok(())
}

fn run_check(config: &AppConfig, candidate_path: &Path) -> anyhow::Result<()> {
    let characters = load_collection(config)?;
    let candidate = store::load_character(candidate_path)
        .with_context(|| format!("loading candidate from {}", candidate_path.display()))?;

    let matches = check_for_duplicates(&candidate, &characters, &Scorer::new(config.min_score));
    if matches.is_empty() {
        println!("{} has no likely duplicates", candidate.name.green());
        return Ok(());
    }

    println!(
        "{} may already exist ({} matches):",
        candidate.name.bold(),
        matches.len()
    );
    for m in &matches {
        println!(
            "  {} {} ({}) score {} - {}",
            confidence_label(m.confidence),
            m.character.name,
            m.character.avatar.dimmed(),
            m.score,
            m.match_reasons.join(", "),
        );
    }
    Ok(())
}

fn run_compare(config: &AppConfig, first: &str, second: &str) -> anyhow::Result<()> {
    let characters = load_collection(config)?;
    let Some(a) = store::find_by_avatar(&characters, first) else {
        bail!("no character with avatar '{}'", first);
    };
    let Some(b) = store::find_by_avatar(&characters, second) else {
        bail!("no character with avatar '{}'", second);
    };

    let result = Scorer::new(config.min_score).score(a, b);
    println!("{} vs {}", a.name.bold(), b.name.bold());
    for (field, points) in &result.breakdown {
        println!("  {:<12} {:>3}", field.as_str(), points);
    }
    let verdict = match result.confidence {
        Some(confidence) => confidence_label(confidence),
        None => "no match".dimmed(),
    };
    println!("  {:<12} {:>3}  {}", "total", result.score, verdict);
    for reason in &result.match_reasons {
        println!("  - {}", reason);
    }
    Ok(())
}

fn print_group(group: &DuplicateGroup) {
    println!(
        "{} {} ({}){}",
        confidence_label(group.confidence),
        group.reference.name.bold(),
        group.reference.avatar.dimmed(),
        creator_suffix(&group.reference),
    );
    for dup in &group.duplicates {
        println!(
            "    {} {} ({}){} score {} - {}",
            "└".dimmed(),
            dup.character.name,
            dup.character.avatar.dimmed(),
            creator_suffix(&dup.character),
            dup.score,
            dup.match_reason,
        );
    }
}

fn creator_suffix(record: &CharacterRecord) -> String {
    if record.creator.trim().is_empty() {
        String::new()
    } else {
        format!(" by {}", record.creator.trim())
    }
}

fn confidence_label(confidence: Confidence) -> ColoredString {
    let label = format!("[{}]", confidence);
    match confidence {
        Confidence::High => label.red().bold(),
        Confidence::Medium => label.yellow(),
        Confidence::Low => label.cyan(),
    }
}

fn write_csv(path: &Path, groups: &[DuplicateGroup]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "group", "role", "name", "creator", "avatar", "confidence", "score", "reason",
    ])?;

    for (index, group) in groups.iter().enumerate() {
        let group_id = (index + 1).to_string();
        writer.write_record([
            group_id.as_str(),
            "reference",
            group.reference.name.as_str(),
            group.reference.creator.as_str(),
            group.reference.avatar.as_str(),
            group.confidence.as_str(),
            "",
            "",
        ])?;
        for dup in &group.duplicates {
            let score = dup.score.to_string();
            writer.write_record([
                group_id.as_str(),
                "duplicate",
                dup.character.name.as_str(),
                dup.character.creator.as_str(),
                dup.character.avatar.as_str(),
                dup.confidence.as_str(),
                score.as_str(),
                dup.match_reason.as_str(),
            ])?;
        }
    }

    writer.flush()?;
    Ok(())
}
