//! Lendclean CLI - loan data cleaning pipeline.

mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::Cli;

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let result = commands::run::run(cli.config, cli.input, cli.output_dir, cli.verbose);

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
