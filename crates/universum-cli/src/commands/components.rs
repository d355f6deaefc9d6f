//! `universum components`: List the registered component types.

use clap::Args;
use universum_gravity::name_to_type_map;

use crate::modules;
use crate::output::{heading, list_or_dash};

/// Arguments for the `components` command.
#[derive(Args, Debug)]
pub struct ComponentsArgs {
    /// Also show the implementing Rust type.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Executes the `components` command.
///
/// # Errors
///
/// Returns an error if two registered components share a name.
pub fn execute(args: &ComponentsArgs) -> anyhow::Result<()> {
    let registry = modules::registry();
    let names = name_to_type_map(&registry)?;

    println!("{}", heading("Registered components"));
    println!();
    println!("{:<20} {:<28} {:<40}", "NAME", "PARENTS", "DEPENDENCIES");
    for id in names.values() {
        let Some(ty) = registry.get(*id) else {
            continue;
        };
        let parents = list_or_dash(ty.parents().iter().map(ToString::to_string));
        let dependencies = list_or_dash(
            ty.dependencies()
                .iter()
                .map(|d| format!("{}: {}", d.field(), d.target())),
        );
        println!("{:<20} {parents:<28} {dependencies:<40}", ty.name());
        if args.verbose {
            println!("{:<20} {}", "", ty.rust_type());
        }
    }
    println!();
    println!("  {} component(s) registered.", names.len());
    Ok(())
}
