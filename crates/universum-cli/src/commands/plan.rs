//! `universum plan`: Show the construction order and options of an entry component.

use clap::Args;
use universum_common::constants::BIN_NAME;
use universum_gravity::{ModuleArgumentParser, TypeRef, define_arguments_recursive, resolve_order};

use crate::modules;
use crate::output::heading;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Name of the entry component.
    #[arg(default_value = "Main")]
    pub entry: String,
}

/// Executes the `plan` command.
///
/// Resolves the component graph of the entry component, then lists every
/// reachable type in construction order together with the options of its
/// namespace.
///
/// # Errors
///
/// Returns an error if the entry is unknown, the graph has a cycle, or
/// two components declare conflicting options.
pub fn execute(args: &PlanArgs) -> anyhow::Result<()> {
    let registry = modules::registry();
    let root = registry.resolve(&TypeRef::named(args.entry.as_str()))?;
    let order = resolve_order(&registry, root)?;

    let mut parser = ModuleArgumentParser::new(BIN_NAME);
    define_arguments_recursive(&registry, &TypeRef::named(args.entry.as_str()), &mut parser)?;

    println!("{}", heading(&format!("Construction plan for: {}", args.entry)));
    println!();
    for id in &order {
        let Some(ty) = registry.get(*id) else {
            continue;
        };
        println!("  + {}", ty.name());
        for option in parser.options_of(ty.name()) {
            println!(
                "      --{:<20} -> {}",
                option.long(),
                option.destination()
            );
            if let Some(help) = option.help_text() {
                println!("        {help}");
            }
        }
    }
    println!();
    println!("  {} component(s) will be constructed lazily from {}.", order.len(), args.entry);
    Ok(())
}
