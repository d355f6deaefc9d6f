//! Deterministic parent order for multi-parent component types.
//!
//! Uses C3 linearization: a type precedes its parents, parents keep their
//! declared order, and every ancestor appears exactly once even when it is
//! reachable through several parents.

use std::collections::HashMap;

use crate::error::{GravityError, Result};
use crate::registry::{ComponentId, Registry};

/// Linearizes the hierarchy of `id`: the type itself first, then each
/// ancestor once, bases last.
///
/// # Errors
///
/// Returns [`GravityError::Linearization`] when the declared parent orders
/// contradict each other, a lookup error for a stale `id` or unresolvable
/// parents, and
/// [`GravityError::CircularDependency`] for a type that is its own ancestor.
pub fn linearize(registry: &Registry, id: ComponentId) -> Result<Vec<ComponentId>> {
    let _ = registry.live(id)?;
    let mut memo = HashMap::new();
    let mut stack = Vec::new();
    c3(registry, id, &mut memo, &mut stack)
}

fn c3(
    registry: &Registry,
    id: ComponentId,
    memo: &mut HashMap<ComponentId, Vec<ComponentId>>,
    stack: &mut Vec<ComponentId>,
) -> Result<Vec<ComponentId>> {
    if let Some(known) = memo.get(&id) {
        return Ok(known.clone());
    }
    if let Some(start) = stack.iter().position(|&s| s == id) {
        let cycle = stack[start..]
            .iter()
            .chain(std::iter::once(&id))
            .map(|&s| registry.ty(s).name())
            .collect::<Vec<_>>()
            .join("->");
        return Err(GravityError::CircularDependency { cycle });
    }

    stack.push(id);
    let parents = registry
        .ty(id)
        .parents()
        .iter()
        .map(|p| registry.resolve(p))
        .collect::<Result<Vec<_>>>()?;
    let mut sequences = Vec::with_capacity(parents.len() + 1);
    for &parent in &parents {
        sequences.push(c3(registry, parent, memo, stack)?);
    }
    sequences.push(parents);
    let _ = stack.pop();

    let mut result = vec![id];
    merge(registry, id, sequences, &mut result)?;
    let _ = memo.insert(id, result.clone());
    Ok(result)
}

fn merge(
    registry: &Registry,
    owner: ComponentId,
    mut sequences: Vec<Vec<ComponentId>>,
    result: &mut Vec<ComponentId>,
) -> Result<()> {
    loop {
        sequences.retain(|s| !s.is_empty());
        let heads: Vec<ComponentId> = sequences.iter().filter_map(|s| s.first().copied()).collect();
        if heads.is_empty() {
            return Ok(());
        }
        let next = heads.iter().copied().find(|candidate| {
            !sequences
                .iter()
                .any(|s| s.get(1..).is_some_and(|tail| tail.contains(candidate)))
        });
        let Some(next) = next else {
            let detail = heads
                .iter()
                .map(|&h| registry.ty(h).name())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(GravityError::Linearization {
                component: registry.ty(owner).name().to_owned(),
                detail,
            });
        };
        result.push(next);
        for sequence in sequences.iter_mut() {
            if sequence.first() == Some(&next) {
                let _ = sequence.remove(0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::context::InitContext;
    use crate::descriptor::Declaration;

    macro_rules! node {
        ($ty:ident $(: $($parent:ident),+)?) => {
            struct $ty;

            impl Component for $ty {
                const NAME: &'static str = stringify!($ty);

                fn declare(_decl: &mut Declaration) {
                    $($(let _ = _decl.extends::<$parent>();)+)?
                }

                fn construct(_ctx: &mut InitContext<'_, '_>) -> Result<Self> {
                    Ok(Self)
                }
            }
        };
    }

    node!(Root);
    node!(Derived1: Root);
    node!(Derived2: Root);
    node!(Bottom: Derived1, Derived2);
    node!(Base1);
    node!(Base2);
    node!(Base3);
    node!(Base4);
    node!(Multi: Base1, Base2, Base3, Base4);
    node!(Left: Base1, Base2);
    node!(Right: Base2, Base1);
    node!(Crossed: Left, Right);

    fn names(registry: &Registry, ids: &[ComponentId]) -> Vec<&'static str> {
        ids.iter().map(|&id| registry.ty(id).name()).collect()
    }

    #[test]
    fn parentless_type_is_alone() {
        let mut registry = Registry::new();
        let root = registry.register::<Root>();
        let order = linearize(&registry, root).expect("linearize");
        assert_eq!(names(&registry, &order), ["Root"]);
    }

    #[test]
    fn diamond_hierarchy_visits_common_base_last() {
        let mut registry = Registry::new();
        let _ = registry.register::<Root>();
        let _ = registry.register::<Derived1>();
        let _ = registry.register::<Derived2>();
        let bottom = registry.register::<Bottom>();
        let order = linearize(&registry, bottom).expect("linearize");
        assert_eq!(
            names(&registry, &order),
            ["Bottom", "Derived1", "Derived2", "Root"]
        );
    }

    #[test]
    fn four_parents_keep_declared_order() {
        let mut registry = Registry::new();
        let _ = registry.register::<Base1>();
        let _ = registry.register::<Base2>();
        let _ = registry.register::<Base3>();
        let _ = registry.register::<Base4>();
        let multi = registry.register::<Multi>();
        let order = linearize(&registry, multi).expect("linearize");
        assert_eq!(
            names(&registry, &order),
            ["Multi", "Base1", "Base2", "Base3", "Base4"]
        );
    }

    #[test]
    fn contradictory_orders_fail() {
        let mut registry = Registry::new();
        let _ = registry.register::<Base1>();
        let _ = registry.register::<Base2>();
        let _ = registry.register::<Left>();
        let _ = registry.register::<Right>();
        let crossed = registry.register::<Crossed>();
        let err = linearize(&registry, crossed).expect_err("inconsistent");
        assert!(
            matches!(&err, GravityError::Linearization { component, .. } if component == "Crossed"),
            "got: {err}"
        );
    }

    #[test]
    fn stale_id_is_lookup_error() {
        let mut registry = Registry::new();
        let stale = {
            let mut scope = registry.scope();
            scope.register::<Root>()
        };
        let err = linearize(&registry, stale).expect_err("stale id");
        assert!(matches!(err, GravityError::NotFound { .. }), "got: {err}");
    }

    #[test]
    fn missing_parent_is_lookup_error() {
        let mut registry = Registry::new();
        let multi = registry.register::<Multi>();
        let err = linearize(&registry, multi).expect_err("unregistered parent");
        assert!(matches!(err, GravityError::NotFound { .. }), "got: {err}");
    }
}
