//! What an initializer sees while its component is being built.

use std::any::Any;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use universum_common::types::SessionId;

use crate::component::Component;
use crate::error::{GravityError, Result};
use crate::linearize::linearize;
use crate::params::Params;
use crate::registry::{ComponentId, Registry};
use crate::session::{Instance, Session};
use crate::settings::Namespace;

/// Construction context of one member of a component hierarchy.
///
/// Gives access to the member's settings namespace, the parameters bound to
/// its declared signature, its dependency fields and the ancestors built
/// before it.
pub struct InitContext<'s, 'r> {
    session: &'s mut Session<'r>,
    component: ComponentId,
    settings: Option<&'r Namespace>,
    values: BTreeMap<String, Value>,
    parents: &'s [(ComponentId, Rc<dyn Any>)],
}

impl<'s, 'r> InitContext<'s, 'r> {
    pub(crate) fn new(
        session: &'s mut Session<'r>,
        component: ComponentId,
        settings: Option<&'r Namespace>,
        values: BTreeMap<String, Value>,
        parents: &'s [(ComponentId, Rc<dyn Any>)],
    ) -> Self {
        Self {
            session,
            component,
            settings,
            values,
            parents,
        }
    }

    pub(crate) fn into_values(self) -> BTreeMap<String, Value> {
        self.values
    }

    /// Name of the component being initialized.
    pub fn name(&self) -> &'static str {
        self.registry().ty(self.component).name()
    }

    /// Session the instance will belong to.
    pub fn session_id(&self) -> SessionId {
        self.session.id()
    }

    /// Registry the session resolves against.
    pub fn registry(&self) -> &'r Registry {
        self.session.registry()
    }

    /// Settings namespace of the component.
    ///
    /// # Errors
    ///
    /// Returns [`GravityError::SettingsNotAccepted`] unless the component
    /// declared that it takes settings.
    pub fn settings(&self) -> Result<&'r Namespace> {
        self.settings.ok_or_else(|| GravityError::SettingsNotAccepted {
            component: self.name().to_owned(),
        })
    }

    /// Reads a supplied parameter.
    ///
    /// # Errors
    ///
    /// Returns [`GravityError::MissingParameter`] when no value was bound to
    /// `name` and [`GravityError::InvalidParameter`] when it does not
    /// deserialize into `T`.
    pub fn param<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        self.optional_param(name)?
            .ok_or_else(|| GravityError::MissingParameter {
                component: self.name().to_owned(),
                parameter: name.to_owned(),
            })
    }

    /// Reads a parameter that may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`GravityError::InvalidParameter`] when the value does not
    /// deserialize into `T`.
    pub fn optional_param<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.values
            .get(name)
            .map(|value| {
                T::deserialize(value).map_err(|source| GravityError::InvalidParameter {
                    component: self.name().to_owned(),
                    parameter: name.to_owned(),
                    source,
                })
            })
            .transpose()
    }

    /// Returns the instance behind a dependency field, building it on first use.
    ///
    /// Fields declared by ancestors are inherited; the most derived
    /// declaration of a field wins.
    ///
    /// # Errors
    ///
    /// See [`InitContext::dependency_with`].
    pub fn dependency<D: Component>(&mut self, field: &str) -> Result<Instance<D>> {
        self.dependency_with(field, Params::new())
    }

    /// Like [`InitContext::dependency`], passing call-site parameters to the
    /// dependency's initializer.
    ///
    /// Parameters only take effect when this call builds the instance; an
    /// instance already in the session is returned as is.
    ///
    /// # Errors
    ///
    /// Returns [`GravityError::UnknownDependency`] for a field neither the
    /// component nor any ancestor declares,
    /// [`GravityError::DependencyType`] when the target provides no `D`, and
    /// any error raised while building the dependency.
    pub fn dependency_with<D: Component>(&mut self, field: &str, params: Params) -> Result<Instance<D>> {
        let registry = self.registry();
        let owner = registry.ty(self.component);
        let declared = linearize(registry, self.component)?
            .into_iter()
            .find_map(|id| registry.ty(id).dependency(field))
            .ok_or_else(|| GravityError::UnknownDependency {
                component: owner.name().to_owned(),
                field: field.to_owned(),
            })?;
        let target = registry.resolve(declared.target())?;
        let handle = self.session.build(target, params)?;
        self.session
            .get::<D>(handle)
            .ok_or_else(|| GravityError::DependencyType {
                component: owner.name().to_owned(),
                field: field.to_owned(),
                target: registry.ty(target).name().to_owned(),
                requested: D::NAME,
            })
    }

    /// Returns an ancestor that was initialized before this component.
    ///
    /// # Errors
    ///
    /// Returns [`GravityError::NotAParent`] if `P` is not an already
    /// initialized ancestor.
    pub fn parent<P: Component>(&self) -> Result<Rc<P>> {
        self.parents
            .iter()
            .find_map(|(_, facet)| Rc::clone(facet).downcast::<P>().ok())
            .ok_or_else(|| GravityError::NotAParent {
                component: self.name().to_owned(),
                requested: P::NAME,
            })
    }
}
