//! # universum-gravity
//!
//! Component container for the Universum CI driver.
//!
//! Handles:
//! - **Registry**: explicit, scopable registration of component types.
//! - **Graph**: dependency resolution with minimal cycle reporting.
//! - **Session**: per-run construction with shared instances and ordered
//!   parent initialization.
//! - **Namespace**: one settings namespace per reachable component type.
//! - **Arguments**: namespaced option registration and parsing.

pub mod arguments;
pub mod component;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod graph;
pub mod linearize;
pub mod namespace;
pub mod params;
pub mod registry;
pub mod session;
pub mod settings;

pub use arguments::{ArgumentError, ArgumentScope, ModuleArgumentParser, OptionSpec};
pub use component::Component;
pub use context::InitContext;
pub use descriptor::{Declaration, TypeRef};
pub use error::{ErrorKind, GravityError, Result};
pub use graph::resolve_order;
pub use namespace::define_arguments_recursive;
pub use params::Params;
pub use registry::{ComponentId, ComponentType, Registry, RegistryScope};
pub use session::{Constructed, Instance, InstanceHandle, Session, construct};
pub use settings::{Namespace, SettingValue, SettingsTree};

use std::collections::BTreeMap;

/// Live name-to-type map of `registry`.
///
/// # Errors
///
/// Returns [`GravityError::Ambiguous`] if two live types share a name.
pub fn name_to_type_map(registry: &Registry) -> Result<BTreeMap<&'static str, ComponentId>> {
    registry.name_to_type_map()
}
