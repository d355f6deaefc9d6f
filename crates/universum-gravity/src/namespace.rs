//! Builds the option namespaces of a component graph.

use crate::arguments::ModuleArgumentParser;
use crate::descriptor::TypeRef;
use crate::error::Result;
use crate::graph::resolve_order;
use crate::registry::Registry;

/// Registers the options of every component reachable from `root`.
///
/// Each reachable type gets its own namespace, named after the type, and
/// its `define_arguments` runs exactly once however many paths lead to it.
/// Types outside the graph of `root` get no namespace.
///
/// # Errors
///
/// Returns a lookup error or [`crate::GravityError::CircularDependency`]
/// before anything is registered, or the first option registration error.
pub fn define_arguments_recursive(
    registry: &Registry,
    root: &TypeRef,
    parser: &mut ModuleArgumentParser,
) -> Result<()> {
    let root_id = registry.resolve(root)?;
    let order = resolve_order(registry, root_id)?;
    for id in order {
        let ty = registry.ty(id);
        if parser.has_namespace(ty.name()) {
            continue;
        }
        let mut scope = parser.scope(ty.name());
        (ty.define_arguments)(&mut scope)?;
        tracing::debug!(namespace = ty.name(), "defined component arguments");
    }
    Ok(())
}
