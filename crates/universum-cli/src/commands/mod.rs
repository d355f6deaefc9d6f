//! CLI command definitions and dispatch.

pub mod components;
pub mod plan;
pub mod run;

use clap::{Parser, Subcommand};
use universum_common::config::LogFormat;

/// Universum, a component-based continuous integration driver.
#[derive(Parser, Debug)]
#[command(name = "universum", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Diagnostic log format (`RUST_LOG` selects the level).
    #[arg(long, global = true, env = "UNIVERSUM_LOG_FORMAT", default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the registered component types.
    Components(components::ComponentsArgs),
    /// Show construction order and options of an entry component.
    Plan(plan::PlanArgs),
    /// Parse component options and run an entry component.
    Run(run::RunArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Components(args) => components::execute(&args),
        Command::Plan(args) => plan::execute(&args),
        Command::Run(args) => run::execute(args),
    }
}
