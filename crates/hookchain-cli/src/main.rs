//! hookchain CLI entry point.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use hookchain_core::config::AppConfig;

mod commands;
mod harness;
mod output;

use commands::Cli;

fn main() {
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };
    init_logging(&config);

    if let Err(e) = cli.execute(config) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Initialize the tracing subscriber from the logging section.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
