//! `universum run`: Parse component options and run an entry component.

use std::fmt::Write as _;

use anyhow::{Context, bail};
use clap::Args;
use universum_common::constants::{APP_NAME, BIN_NAME};
use universum_gravity::{
    ArgumentError, ModuleArgumentParser, Params, Session, TypeRef, define_arguments_recursive,
};

use crate::modules;
use crate::modules::main_module::Main;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Name of the entry component.
    pub entry: String,

    /// Options of the entry component and everything it depends on
    /// (`universum run Main -- --help` lists them).
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub options: Vec<String>,
}

/// Executes the `run` command.
///
/// # Errors
///
/// Returns an error if the component graph cannot be built, the entry
/// component is not runnable, or the run reports errors.
pub fn execute(args: RunArgs) -> anyhow::Result<()> {
    let registry = modules::registry();
    let entry = TypeRef::named(args.entry.as_str());

    let mut parser = ModuleArgumentParser::new(format!("{BIN_NAME} run"))
        .about(format!("{APP_NAME} component options"));
    define_arguments_recursive(&registry, &entry, &mut parser)?;
    let settings = match parser.parse(&args.options) {
        Ok(settings) => settings,
        Err(ArgumentError::Parse(e)) => e.exit(),
        Err(e) => return Err(e.into()),
    };

    let mut session = Session::new(&registry, &settings);
    let handle = session
        .construct_ref(&entry, Params::new())
        .with_context(|| format!("failed to construct {}", args.entry))?;
    let Some(main) = session.get::<Main>(handle) else {
        bail!("{} is not a runnable entry component", args.entry);
    };
    tracing::info!(entry = %args.entry, components = session.len(), "starting run");

    if main.run() {
        return Ok(());
    }
    let errors = main.errors();
    let mut message = format!("{} error(s) reported:", errors.len());
    for error in &errors {
        let _ = write!(message, "\n  {error}");
    }
    bail!(message)
}
