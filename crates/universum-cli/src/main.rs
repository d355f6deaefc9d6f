//! # universum: Universum CLI
//!
//! Assembles CI runs from components: every component declares its own
//! options, the container wires the dependency graph, and the entry
//! component drives the run.

mod commands;
mod modules;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use universum_common::config::{LogFormat, LoggingConfig};
use universum_common::constants::LOG_FILTER_ENV;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&LoggingConfig {
        format: cli.log_format,
        ..LoggingConfig::default()
    });
    commands::execute(cli)
}

fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match config.format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
