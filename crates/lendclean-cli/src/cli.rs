//! CLI argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

/// Lendclean: clean a loan extract and record every repaired value
#[derive(Parser)]
#[command(name = "lendclean")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON configuration file (absent fields use defaults)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Raw loan file, overriding the configured input
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Directory for the cleaned and lookup files, overriding the configured one
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
