mod cli;
mod controls;
mod error;
mod export;
mod filter;
mod fmt;
mod generator;
mod html;
mod importer;
mod models;
mod pipeline;
mod render;
mod settings;
mod summary;
mod theme;
mod tui;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_logger(cli.log_level);

    let result = match cli.command {
        Commands::Dashboard { selection } => cli::dashboard::run(&selection),
        Commands::Report {
            selection,
            format,
            output,
        } => cli::report::run(&selection, format, output.as_deref()),
        Commands::Export { selection, output } => cli::export::run(&selection, output.as_deref()),
        Commands::Template { output } => cli::export::template(output.as_deref()),
        Commands::Completions { shell } => {
            cli::completions::run(shell);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr. `RUST_LOG` wins over `--log-level` when set.
fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
