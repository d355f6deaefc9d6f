//! Construction sessions.
//!
//! A [`Session`] owns every instance it builds in an arena and builds each
//! component type at most once. Instances are addressed by
//! [`InstanceHandle`]s that carry the session id, so handles from different
//! sessions never compare equal.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use serde_json::Value;
use universum_common::types::SessionId;

use crate::component::Component;
use crate::context::InitContext;
use crate::descriptor::TypeRef;
use crate::error::{GravityError, Result};
use crate::graph::resolve_order;
use crate::linearize::linearize;
use crate::params::Params;
use crate::registry::{ComponentId, Registry};
use crate::settings::{Namespace, SettingsTree};

/// Address of a constructed instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle {
    session: SessionId,
    index: usize,
}

impl InstanceHandle {
    /// Session that owns the instance.
    pub const fn session(&self) -> SessionId {
        self.session
    }
}

impl fmt::Display for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.session, self.index)
    }
}

/// A typed, shared reference to a constructed component.
///
/// Two instances are equal when they are the same arena entry of the same
/// session.
pub struct Instance<T> {
    handle: InstanceHandle,
    component: &'static str,
    value: Rc<T>,
}

impl<T> Instance<T> {
    /// Arena handle of the instance.
    pub const fn handle(&self) -> InstanceHandle {
        self.handle
    }

    /// Name of the component type that was constructed.
    ///
    /// For a parent facet this is the derived type the facet belongs to.
    pub const fn component_name(&self) -> &'static str {
        self.component
    }

    /// Shared pointer to the value.
    pub const fn as_rc(&self) -> &Rc<T> {
        &self.value
    }

    /// Converts into the shared pointer.
    pub fn into_rc(self) -> Rc<T> {
        self.value
    }
}

impl<T> Deref for Instance<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> Clone for Instance<T> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle,
            component: self.component,
            value: Rc::clone(&self.value),
        }
    }
}

impl<T> PartialEq for Instance<T> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<T> Eq for Instance<T> {}

impl<T> fmt::Debug for Instance<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.component, self.handle)
    }
}

/// One constructed hierarchy: the type itself first, then its ancestors.
struct InstanceSlot {
    component: ComponentId,
    facets: Vec<(ComponentId, Rc<dyn Any>)>,
}

/// Per-request instance cache.
pub struct Session<'r> {
    id: SessionId,
    registry: &'r Registry,
    settings: &'r SettingsTree,
    cache: HashMap<ComponentId, usize>,
    arena: Vec<InstanceSlot>,
    constructing: Vec<ComponentId>,
}

/// A member of a hierarchy with its bound inputs, ready to be constructed.
struct Planned<'r> {
    id: ComponentId,
    settings: Option<&'r Namespace>,
    values: BTreeMap<String, Value>,
}

impl<'r> Session<'r> {
    /// Opens an empty session over `registry` and parsed `settings`.
    pub fn new(registry: &'r Registry, settings: &'r SettingsTree) -> Self {
        Self {
            id: SessionId::generate(),
            registry,
            settings,
            cache: HashMap::new(),
            arena: Vec::new(),
            constructing: Vec::new(),
        }
    }

    /// Identifier of this session.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Registry the session resolves against.
    pub const fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Builds `T`, or returns the instance this session already holds.
    ///
    /// # Errors
    ///
    /// Returns any lookup, construction or component error.
    pub fn construct<T: Component>(&mut self) -> Result<Instance<T>> {
        self.construct_with(Params::new())
    }

    /// Builds `T` with call-site parameters.
    ///
    /// # Errors
    ///
    /// Returns any lookup, construction or component error.
    pub fn construct_with<T: Component>(&mut self, params: Params) -> Result<Instance<T>> {
        let handle = self.construct_ref(&TypeRef::of::<T>(), params)?;
        self.get::<T>(handle).ok_or_else(|| GravityError::NotFound {
            name: T::NAME.to_owned(),
        })
    }

    /// Builds the component referenced by `root`.
    ///
    /// The dependency order of `root` is resolved first, so a cycle or an
    /// unresolvable reference anywhere in its graph fails before any
    /// initializer runs. Dependencies are then built when first requested.
    ///
    /// # Errors
    ///
    /// Returns any lookup, construction or component error.
    pub fn construct_ref(&mut self, root: &TypeRef, params: Params) -> Result<InstanceHandle> {
        let id = self.registry.resolve(root)?;
        let order = resolve_order(self.registry, id)?;
        tracing::info!(
            root = %root,
            session = %self.id,
            reachable = order.len(),
            "constructing component"
        );
        self.build(id, params)
    }

    /// Returns the instance behind `handle` viewed as `T`.
    ///
    /// `T` may be the constructed type or any of its ancestors.
    pub fn get<T: Component>(&self, handle: InstanceHandle) -> Option<Instance<T>> {
        if handle.session != self.id {
            return None;
        }
        let slot = self.arena.get(handle.index)?;
        let value = slot
            .facets
            .iter()
            .find_map(|(_, facet)| Rc::clone(facet).downcast::<T>().ok())?;
        Some(Instance {
            handle,
            component: self.registry.ty(slot.component).name(),
            value,
        })
    }

    /// Handle of the instance built for `id`, if any.
    pub fn instance_of(&self, id: ComponentId) -> Option<InstanceHandle> {
        self.cache.get(&id).map(|&index| InstanceHandle {
            session: self.id,
            index,
        })
    }

    /// Number of constructed instances.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns `true` before anything was constructed.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Constructed instances in construction order.
    pub fn constructed(&self) -> impl Iterator<Item = (InstanceHandle, &'static str)> + '_ {
        self.arena.iter().enumerate().map(|(index, slot)| {
            (
                InstanceHandle {
                    session: self.id,
                    index,
                },
                self.registry.ty(slot.component).name(),
            )
        })
    }

    pub(crate) fn build(&mut self, id: ComponentId, params: Params) -> Result<InstanceHandle> {
        if let Some(handle) = self.instance_of(id) {
            if !params.is_empty() {
                tracing::debug!(
                    component = self.registry.ty(id).name(),
                    "instance already built, call-site parameters ignored"
                );
            }
            return Ok(handle);
        }
        if let Some(start) = self.constructing.iter().position(|&c| c == id) {
            let cycle = self.constructing[start..]
                .iter()
                .chain(std::iter::once(&id))
                .map(|&c| self.registry.ty(c).name())
                .collect::<Vec<_>>()
                .join("->");
            return Err(GravityError::CircularDependency { cycle });
        }

        self.constructing.push(id);
        let built = self.build_hierarchy(id, params);
        let _ = self.constructing.pop();
        let facets = built?;

        let index = self.arena.len();
        self.arena.push(InstanceSlot {
            component: id,
            facets,
        });
        let _ = self.cache.insert(id, index);
        tracing::debug!(
            component = self.registry.ty(id).name(),
            index,
            "component constructed"
        );
        Ok(InstanceHandle {
            session: self.id,
            index,
        })
    }

    /// Binds the inputs of every member of the hierarchy of `id`, most
    /// derived first, then constructs the members bases first.
    fn build_hierarchy(&mut self, id: ComponentId, params: Params) -> Result<Vec<(ComponentId, Rc<dyn Any>)>> {
        let registry = self.registry;
        let root_name = registry.ty(id).name();
        let lineage = linearize(registry, id)?;

        let (mut pending, mut bag) = params.into_parts();
        let mut pending_from = root_name;
        let mut plan = Vec::with_capacity(lineage.len());
        for &member in &lineage {
            let ty = registry.ty(member);
            let settings = self.settings_for(member)?;
            let mut values = BTreeMap::new();

            let declared = ty.signature().params();
            if pending.len() > declared.len() {
                return Err(GravityError::UnexpectedParameter {
                    component: pending_from.to_owned(),
                    parameter: format!("#{}", declared.len()),
                });
            }
            for (param, value) in declared.iter().zip(pending.drain(..)) {
                if bag.contains_key(param.name()) {
                    return Err(GravityError::DuplicateParameter {
                        component: ty.name().to_owned(),
                        parameter: param.name().to_owned(),
                    });
                }
                let _ = values.insert(param.name().to_owned(), value);
            }
            for param in declared {
                if values.contains_key(param.name()) {
                    continue;
                }
                if let Some(value) = bag.remove(param.name()) {
                    let _ = values.insert(param.name().to_owned(), value);
                } else if param.is_required() {
                    return Err(GravityError::MissingParameter {
                        component: ty.name().to_owned(),
                        parameter: param.name().to_owned(),
                    });
                }
            }

            let ctx = InitContext::new(self, member, settings, values, &[]);
            let handed = (ty.parent_params)(&ctx).map_err(|e| e.attribute(ty.name()))?;
            let (positional, named) = handed.into_parts();
            let values = ctx.into_values();
            for (name, value) in named {
                if bag.contains_key(&name) {
                    return Err(GravityError::DuplicateParameter {
                        component: ty.name().to_owned(),
                        parameter: name,
                    });
                }
                let _ = bag.insert(name, value);
            }
            pending = positional;
            pending_from = ty.name();
            plan.push(Planned {
                id: member,
                settings,
                values,
            });
        }
        if !pending.is_empty() {
            return Err(GravityError::UnexpectedParameter {
                component: pending_from.to_owned(),
                parameter: "#0".to_owned(),
            });
        }
        if let Some(name) = bag.into_keys().next() {
            return Err(GravityError::UnexpectedParameter {
                component: root_name.to_owned(),
                parameter: name,
            });
        }

        let mut built: Vec<(ComponentId, Rc<dyn Any>)> = Vec::with_capacity(plan.len());
        for planned in plan.into_iter().rev() {
            let ty = registry.ty(planned.id);
            tracing::trace!(component = ty.name(), of = root_name, "initializing");
            let facet = {
                let mut ctx = InitContext::new(self, planned.id, planned.settings, planned.values, &built);
                (ty.construct)(&mut ctx).map_err(|e| e.attribute(ty.name()))?
            };
            built.push((planned.id, facet));
        }
        built.reverse();
        Ok(built)
    }

    fn settings_for(&self, id: ComponentId) -> Result<Option<&'r Namespace>> {
        let ty = self.registry.ty(id);
        if !ty.signature().takes_settings() {
            return Ok(None);
        }
        self.settings
            .namespace(ty.name())
            .map(Some)
            .ok_or_else(|| GravityError::MissingSettings {
                component: ty.name().to_owned(),
            })
    }
}

impl fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("instances", &self.constructed().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// A root instance together with the session that built it.
#[derive(Debug)]
pub struct Constructed<'r, T> {
    root: Instance<T>,
    session: Session<'r>,
}

impl<'r, T> Constructed<'r, T> {
    /// The requested instance.
    pub const fn root(&self) -> &Instance<T> {
        &self.root
    }

    /// The session holding every instance built for the root.
    pub const fn session(&self) -> &Session<'r> {
        &self.session
    }

    /// Splits into the root instance and its session.
    pub fn into_parts(self) -> (Instance<T>, Session<'r>) {
        (self.root, self.session)
    }
}

impl<T> Deref for Constructed<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.root
    }
}

/// Builds `T` in a fresh session.
///
/// # Errors
///
/// Returns any lookup, construction or component error.
pub fn construct<'r, T: Component>(
    registry: &'r Registry,
    settings: &'r SettingsTree,
    params: Params,
) -> Result<Constructed<'r, T>> {
    let mut session = Session::new(registry, settings);
    let root = session.construct_with::<T>(params)?;
    Ok(Constructed { root, session })
}
