//! Logging setup using `tracing-subscriber`.
//!
//! `RUST_LOG` wins when set; otherwise `--verbose` selects `debug` and the
//! default is `info`. Logs go to stderr so the run summary on stdout stays clean.

use tracing_subscriber::EnvFilter;

pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lendclean={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}
