//! Run command - clean once, then upload.

use std::path::PathBuf;

use colored::Colorize;
use lendclean::{Lendclean, LendcleanConfig, RunMode, RunSummary, UploadOutcome};

pub fn run(
    config: Option<PathBuf>,
    input: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match config {
        Some(path) => LendcleanConfig::load(&path)?,
        None => LendcleanConfig::default(),
    };
    if let Some(input) = input {
        config.input = input;
    }
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }

    if verbose {
        println!("{} {}", "Config:".cyan().bold(), serde_json::to_string(&config)?);
    }

    let summary = Lendclean::with_config(config).run()?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    match summary.mode {
        RunMode::Transformed => {
            println!("{} {}", "Cleaned".green().bold(), summary.cleaned_path.display());
            if let Some(source) = &summary.source {
                println!("  Source:  {} ({})", source.file.white(), source.hash.dimmed());
            }
            if let (Some(rows), Some(columns)) = (summary.rows, summary.columns) {
                println!(
                    "  Shape:   {} rows x {} columns",
                    rows.to_string().white().bold(),
                    columns.to_string().white().bold()
                );
            }
            println!(
                "  Lookup:  {} records in {}",
                summary
                    .lookup_records
                    .unwrap_or_default()
                    .to_string()
                    .white()
                    .bold(),
                summary.lookup_path.display()
            );
        }
        RunMode::UploadOnly => {
            println!(
                "{} {} exists; transformation skipped",
                "Note:".yellow().bold(),
                summary.cleaned_path.display()
            );
        }
    }

    println!();
    if summary.uploads.is_empty() {
        println!("{} store unavailable, nothing uploaded", "Upload:".yellow().bold());
        return;
    }
    println!("{}", "Upload:".cyan().bold());
    for upload in &summary.uploads {
        let outcome = match &upload.outcome {
            UploadOutcome::Created => upload.outcome.to_string().green(),
            UploadOutcome::AlreadyExists => upload.outcome.to_string().yellow(),
            UploadOutcome::Failed(_) => upload.outcome.to_string().red(),
        };
        println!("  {:<32} {}", upload.table, outcome);
    }
}
