//! Explicit registry of component types.
//!
//! Types are registered at startup (or inside a [`RegistryScope`] for
//! test-local and plugin types). Lookups only ever see live entries.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use crate::arguments::{ArgumentError, ArgumentScope};
use crate::component::Component;
use crate::context::InitContext;
use crate::descriptor::{Declaration, Dependency, Signature, TypeRef};
use crate::error::{GravityError, Result};
use crate::params::Params;

type DefineArgumentsFn = fn(&mut ArgumentScope<'_>) -> std::result::Result<(), ArgumentError>;
type ParentParamsFn = fn(&InitContext<'_, '_>) -> Result<Params>;
type ConstructFn = fn(&mut InitContext<'_, '_>) -> Result<Rc<dyn Any>>;

/// Stable identifier of a registered component type.
///
/// Ids carry the registration serial of their type, so an id outliving its
/// [`RegistryScope`] never matches a type registered later in the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId {
    index: usize,
    serial: u64,
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// Everything the container knows about one component type.
pub struct ComponentType {
    serial: u64,
    name: &'static str,
    type_id: TypeId,
    rust_type: &'static str,
    parents: Vec<TypeRef>,
    dependencies: Vec<Dependency>,
    signature: Signature,
    pub(crate) define_arguments: DefineArgumentsFn,
    pub(crate) parent_params: ParentParamsFn,
    pub(crate) construct: ConstructFn,
}

impl ComponentType {
    fn of<T: Component>(serial: u64) -> Self {
        let mut decl = Declaration::default();
        T::declare(&mut decl);
        Self {
            serial,
            name: T::NAME,
            type_id: TypeId::of::<T>(),
            rust_type: std::any::type_name::<T>(),
            parents: decl.parents,
            dependencies: decl.dependencies,
            signature: decl.signature,
            define_arguments: T::define_arguments,
            parent_params: T::parent_params,
            construct: construct_erased::<T>,
        }
    }

    /// Component name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Fully qualified Rust type implementing the component.
    pub const fn rust_type(&self) -> &'static str {
        self.rust_type
    }

    /// Declared parents, in declaration order.
    pub fn parents(&self) -> &[TypeRef] {
        &self.parents
    }

    /// Declared dependency fields, in declaration order.
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Looks up a dependency by field name.
    pub fn dependency(&self, field: &str) -> Option<&Dependency> {
        self.dependencies.iter().find(|d| d.field() == field)
    }

    /// Initializer signature.
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentType")
            .field("name", &self.name)
            .field("rust_type", &self.rust_type)
            .field("parents", &self.parents)
            .field("dependencies", &self.dependencies)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

fn construct_erased<T: Component>(ctx: &mut InitContext<'_, '_>) -> Result<Rc<dyn Any>> {
    T::construct(ctx).map(|value| Rc::new(value) as Rc<dyn Any>)
}

/// Registry of live component types.
#[derive(Debug, Default)]
pub struct Registry {
    types: Vec<ComponentType>,
    next_serial: u64,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T`, returning its id.
    ///
    /// Registering a type that is already live returns the existing id.
    pub fn register<T: Component>(&mut self) -> ComponentId {
        let type_id = TypeId::of::<T>();
        if let Some(index) = self.types.iter().position(|t| t.type_id == type_id) {
            return self.id_at(index);
        }
        tracing::trace!(component = T::NAME, "registering component type");
        let serial = self.next_serial;
        self.next_serial += 1;
        self.types.push(ComponentType::of::<T>(serial));
        self.id_at(self.types.len() - 1)
    }

    /// Opens a scope whose registrations are removed when it is dropped.
    pub fn scope(&mut self) -> RegistryScope<'_> {
        let mark = self.types.len();
        RegistryScope {
            registry: self,
            mark,
        }
    }

    /// Every live component type, in registration order.
    pub fn all_known_types(&self) -> impl Iterator<Item = (ComponentId, &ComponentType)> {
        self.types
            .iter()
            .enumerate()
            .map(|(index, ty)| {
                (
                    ComponentId {
                        index,
                        serial: ty.serial,
                    },
                    ty,
                )
            })
    }

    /// Returns the type behind `id`, if it is still live.
    pub fn get(&self, id: ComponentId) -> Option<&ComponentType> {
        self.types.get(id.index).filter(|ty| ty.serial == id.serial)
    }

    /// Like [`Registry::get`], for ids handed in from outside the crate.
    pub(crate) fn live(&self, id: ComponentId) -> Result<&ComponentType> {
        self.get(id).ok_or_else(|| GravityError::NotFound {
            name: id.to_string(),
        })
    }

    /// Type behind an id this registry handed out and that is still live.
    pub(crate) fn ty(&self, id: ComponentId) -> &ComponentType {
        &self.types[id.index]
    }

    fn id_at(&self, index: usize) -> ComponentId {
        ComponentId {
            index,
            serial: self.types[index].serial,
        }
    }

    /// Finds the single live type called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`GravityError::NotFound`] when no live type has that name
    /// and [`GravityError::Ambiguous`] when several do.
    pub fn by_name(&self, name: &str) -> Result<ComponentId> {
        let mut matches = self
            .all_known_types()
            .filter(|(_, ty)| ty.name == name)
            .map(|(id, _)| id);
        let first = matches.next().ok_or_else(|| GravityError::NotFound {
            name: name.to_owned(),
        })?;
        let others = matches.count();
        if others > 0 {
            return Err(GravityError::Ambiguous {
                name: name.to_owned(),
                count: others + 1,
            });
        }
        Ok(first)
    }

    /// Resolves a type reference against the live types.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if the reference does not match exactly one
    /// live type.
    pub fn resolve(&self, target: &TypeRef) -> Result<ComponentId> {
        match target {
            TypeRef::Type { id, name } => self
                .types
                .iter()
                .position(|t| t.type_id == *id)
                .map(|index| self.id_at(index))
                .ok_or_else(|| GravityError::NotFound {
                    name: (*name).to_owned(),
                }),
            TypeRef::Named(name) => self.by_name(name),
        }
    }

    /// Live name-to-type map.
    ///
    /// # Errors
    ///
    /// Returns [`GravityError::Ambiguous`] if two live types share a name.
    pub fn name_to_type_map(&self) -> Result<BTreeMap<&'static str, ComponentId>> {
        let mut map = BTreeMap::new();
        for (id, ty) in self.all_known_types() {
            if map.insert(ty.name, id).is_some() {
                return Err(GravityError::Ambiguous {
                    name: ty.name.to_owned(),
                    count: self.types.iter().filter(|t| t.name == ty.name).count(),
                });
            }
        }
        Ok(map)
    }

    /// Number of live types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Registrations that only live until the guard is dropped.
#[derive(Debug)]
pub struct RegistryScope<'r> {
    registry: &'r mut Registry,
    mark: usize,
}

impl Deref for RegistryScope<'_> {
    type Target = Registry;

    fn deref(&self) -> &Registry {
        self.registry
    }
}

impl DerefMut for RegistryScope<'_> {
    fn deref_mut(&mut self) -> &mut Registry {
        self.registry
    }
}

impl Drop for RegistryScope<'_> {
    fn drop(&mut self) {
        let removed = self.registry.types.len().saturating_sub(self.mark);
        self.registry.types.truncate(self.mark);
        tracing::trace!(removed, "closed registry scope");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! leaf {
        ($ty:ident, $name:literal) => {
            pub struct $ty;

            impl Component for $ty {
                const NAME: &'static str = $name;

                fn construct(_ctx: &mut InitContext<'_, '_>) -> Result<Self> {
                    Ok(Self)
                }
            }
        };
    }

    leaf!(First, "First");
    leaf!(Second, "Second");
    leaf!(Static, "Static");

    mod other {
        use super::*;
        leaf!(First, "First");
    }

    #[test]
    fn register_is_idempotent() {
        let mut registry = Registry::new();
        let a = registry.register::<First>();
        let b = registry.register::<First>();
        assert_eq!(a, b);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn scoped_types_disappear_with_the_scope() {
        let mut registry = Registry::new();
        let _ = registry.register::<Static>();
        {
            let mut scope = registry.scope();
            let _ = scope.register::<First>();
            let _ = scope.register::<Second>();
            let map = scope.name_to_type_map().expect("map");
            assert_eq!(map.keys().copied().collect::<Vec<_>>(), ["First", "Second", "Static"]);
        }
        let map = registry.name_to_type_map().expect("map");
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), ["Static"]);
        assert!(matches!(
            registry.by_name("First"),
            Err(GravityError::NotFound { .. })
        ));
    }

    #[test]
    fn same_name_in_sequential_scopes() {
        let mut registry = Registry::new();
        {
            let mut scope = registry.scope();
            let id = scope.register::<First>();
            assert_eq!(scope.by_name("First").expect("first"), id);
        }
        {
            let mut scope = registry.scope();
            let id = scope.register::<other::First>();
            assert_eq!(scope.by_name("First").expect("other first"), id);
            assert_eq!(
                scope.get(id).map(ComponentType::rust_type),
                Some(std::any::type_name::<other::First>())
            );
        }
    }

    #[test]
    fn ids_from_a_closed_scope_are_stale() {
        let mut registry = Registry::new();
        let stale = {
            let mut scope = registry.scope();
            scope.register::<First>()
        };
        assert!(registry.get(stale).is_none());
        let err = crate::graph::resolve_order(&registry, stale).expect_err("stale id");
        assert!(matches!(err, GravityError::NotFound { .. }), "got: {err}");

        let reused = registry.register::<Second>();
        assert_ne!(reused, stale);
        assert!(registry.get(stale).is_none(), "stale id must not alias Second");
        assert_eq!(registry.get(reused).map(ComponentType::name), Some("Second"));
    }

    #[test]
    fn same_name_live_twice_is_ambiguous() {
        let mut registry = Registry::new();
        let _ = registry.register::<First>();
        let _ = registry.register::<other::First>();
        let err = registry.by_name("First").expect_err("ambiguous");
        assert!(matches!(err, GravityError::Ambiguous { count: 2, .. }), "got: {err}");
        assert!(registry.name_to_type_map().is_err());
        // Rust type references stay unambiguous.
        assert!(registry.resolve(&TypeRef::of::<other::First>()).is_ok());
    }

    #[test]
    fn unregistered_type_reference_is_not_found() {
        let registry = Registry::new();
        let err = registry
            .resolve(&TypeRef::of::<Second>())
            .expect_err("not registered");
        assert_eq!(err.to_string(), "component type not found: Second");
    }
}
