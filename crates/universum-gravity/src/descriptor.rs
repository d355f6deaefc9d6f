//! Declarations a component type makes about itself: the types it
//! depends on, the parent types it extends, and the shape of its
//! initializer.

use std::any::TypeId;
use std::fmt;

use crate::component::Component;

/// Reference to a component type, by Rust type or by registered name.
///
/// Names are resolved against the registry only when a graph is built,
/// so a type may name another that is registered later.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A concrete Rust type.
    Type {
        /// Rust type identity.
        id: TypeId,
        /// Component name of the type.
        name: &'static str,
    },
    /// A component name, resolved lazily.
    Named(String),
}

impl TypeRef {
    /// References the component type `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self::Type {
            id: TypeId::of::<T>(),
            name: T::NAME,
        }
    }

    /// References a component type by name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Name used for the referenced type in messages and lookups.
    pub fn name(&self) -> &str {
        match self {
            Self::Type { name, .. } => *name,
            Self::Named(name) => name.as_str(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<String> for TypeRef {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

/// A named dependency edge owned by one component type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    field: String,
    target: TypeRef,
}

impl Dependency {
    /// Field the dependency is requested through.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Referenced component type.
    pub const fn target(&self) -> &TypeRef {
        &self.target
    }
}

/// One named initializer parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: String,
    required: bool,
}

impl Param {
    /// Parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether construction fails when the parameter is not supplied.
    pub const fn is_required(&self) -> bool {
        self.required
    }
}

/// What an initializer accepts besides its dependencies.
///
/// Positional call-site values bind to `params` in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    takes_settings: bool,
    params: Vec<Param>,
}

impl Signature {
    /// Whether the initializer reads its settings namespace.
    pub const fn takes_settings(&self) -> bool {
        self.takes_settings
    }

    /// Declared parameters in positional order.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Returns `true` when a parameter called `name` is declared.
    pub fn accepts(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }
}

/// Builder handed to [`Component::declare`].
///
/// Declaring a field or parameter twice keeps the last declaration, the
/// way an attribute is overridden.
#[derive(Debug, Clone, Default)]
pub struct Declaration {
    pub(crate) parents: Vec<TypeRef>,
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) signature: Signature,
}

impl Declaration {
    /// Declares a dependency on the component type `D` under `field`.
    pub fn depends_on<D: Component>(&mut self, field: &str) -> &mut Self {
        self.dependency(field, TypeRef::of::<D>())
    }

    /// Declares a dependency on a component type by name under `field`.
    pub fn depends_on_named(&mut self, field: &str, name: impl Into<String>) -> &mut Self {
        self.dependency(field, TypeRef::named(name))
    }

    /// Declares the component type `P` as a parent.
    pub fn extends<P: Component>(&mut self) -> &mut Self {
        self.parent(TypeRef::of::<P>())
    }

    /// Declares a parent by name.
    pub fn extends_named(&mut self, name: impl Into<String>) -> &mut Self {
        self.parent(TypeRef::named(name))
    }

    /// Makes the settings namespace of the type a required input.
    pub const fn takes_settings(&mut self) -> &mut Self {
        self.signature.takes_settings = true;
        self
    }

    /// Declares a required parameter.
    pub fn param(&mut self, name: &str) -> &mut Self {
        self.add_param(name, true)
    }

    /// Declares an optional parameter.
    pub fn optional_param(&mut self, name: &str) -> &mut Self {
        self.add_param(name, false)
    }

    fn dependency(&mut self, field: &str, target: TypeRef) -> &mut Self {
        if let Some(existing) = self.dependencies.iter_mut().find(|d| d.field == field) {
            existing.target = target;
        } else {
            self.dependencies.push(Dependency {
                field: field.to_owned(),
                target,
            });
        }
        self
    }

    fn parent(&mut self, parent: TypeRef) -> &mut Self {
        if !self.parents.contains(&parent) {
            self.parents.push(parent);
        }
        self
    }

    fn add_param(&mut self, name: &str, required: bool) -> &mut Self {
        if let Some(existing) = self.signature.params.iter_mut().find(|p| p.name == name) {
            existing.required = required;
        } else {
            self.signature.params.push(Param {
                name: name.to_owned(),
                required,
            });
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redeclared_field_keeps_last_target() {
        let mut decl = Declaration::default();
        let _ = decl
            .depends_on_named("dep", "First")
            .depends_on_named("other", "Other")
            .depends_on_named("dep", "Second");
        assert_eq!(decl.dependencies.len(), 2);
        assert_eq!(decl.dependencies[0].field(), "dep");
        assert_eq!(decl.dependencies[0].target().name(), "Second");
    }

    #[test]
    fn params_keep_positional_order() {
        let mut decl = Declaration::default();
        let _ = decl.takes_settings().param("param").optional_param("named_parm");
        let names: Vec<_> = decl.signature.params().iter().map(Param::name).collect();
        assert_eq!(names, ["param", "named_parm"]);
        assert!(decl.signature.takes_settings());
        assert!(decl.signature.accepts("named_parm"));
        assert!(!decl.signature.accepts("settings"));
    }

    #[test]
    fn parents_are_unique() {
        let mut decl = Declaration::default();
        let _ = decl.extends_named("Base").extends_named("Base");
        assert_eq!(decl.parents, vec![TypeRef::named("Base")]);
    }
}
