//! Dependency graph management using `petgraph`.
//!
//! Builds a directed graph from a root component's declared parents and
//! dependency fields and resolves a dependencies-first construction order.
//! Edges point from a dependent to what it depends on, so a depth-first
//! post-order walk yields dependencies before their users.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::error::{GravityError, Result};
use crate::registry::{ComponentId, Registry};

/// A dependency graph of components.
#[derive(Debug)]
pub struct DependencyGraph<N> {
    /// Edge weights record declaration order among a node's outgoing edges.
    graph: DiGraph<N, usize>,
}

impl<N: Clone + fmt::Display> DependencyGraph<N> {
    /// Creates an empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
        }
    }

    /// Adds a component node to the graph.
    pub fn add_component(&mut self, node: N) -> NodeIndex {
        self.graph.add_node(node)
    }

    /// Adds a dependency edge: `dependent` depends on `dependency`.
    ///
    /// Edges of one node are walked in the order they were added.
    pub fn add_dependency(&mut self, dependent: NodeIndex, dependency: NodeIndex) {
        let ordinal = self.graph.edges(dependent).count();
        let _ = self.graph.add_edge(dependent, dependency, ordinal);
    }

    /// Number of components in the graph.
    pub fn component_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Direct dependencies of `node`, in declaration order.
    pub fn dependencies_of(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self
            .graph
            .edges(node)
            .map(|e| (*e.weight(), e.target()))
            .collect();
        edges.sort_unstable_by_key(|(ordinal, _)| *ordinal);
        edges.into_iter().map(|(_, target)| target).collect()
    }

    /// Returns the construction order of everything reachable from `root`.
    ///
    /// Every reachable component appears exactly once, after all of its
    /// dependencies. Shared dependencies are visited once.
    ///
    /// # Errors
    ///
    /// Returns [`GravityError::CircularDependency`] naming only the
    /// repeating segment of the path: `A->B->C->D->B` reports `B->C->D->B`.
    pub fn resolve_order(&self, root: NodeIndex) -> Result<Vec<N>> {
        let mut walk = Walk {
            path: Vec::new(),
            done: HashSet::new(),
            order: Vec::new(),
        };
        self.visit(root, &mut walk)?;
        Ok(walk.order)
    }

    fn visit(&self, node: NodeIndex, walk: &mut Walk<N>) -> Result<()> {
        if walk.done.contains(&node) {
            return Ok(());
        }
        if let Some(start) = walk.path.iter().position(|&n| n == node) {
            let cycle = walk.path[start..]
                .iter()
                .chain(std::iter::once(&node))
                .map(|&n| self.graph[n].to_string())
                .collect::<Vec<_>>()
                .join("->");
            return Err(GravityError::CircularDependency { cycle });
        }

        walk.path.push(node);
        for dependency in self.dependencies_of(node) {
            self.visit(dependency, walk)?;
        }
        let _ = walk.path.pop();

        let _ = walk.done.insert(node);
        walk.order.push(self.graph[node].clone());
        Ok(())
    }
}

impl<N: Clone + fmt::Display> Default for DependencyGraph<N> {
    fn default() -> Self {
        Self::new()
    }
}

struct Walk<N> {
    path: Vec<NodeIndex>,
    done: HashSet<NodeIndex>,
    order: Vec<N>,
}

/// A registered component as a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentNode {
    /// Registry id.
    pub id: ComponentId,
    /// Component name, used in cycle reports.
    pub name: &'static str,
}

impl fmt::Display for ComponentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl DependencyGraph<ComponentNode> {
    /// Builds the graph of everything reachable from `root`.
    ///
    /// Parents come before dependency fields among a node's edges; named
    /// references are resolved here.
    ///
    /// # Errors
    ///
    /// Returns [`GravityError::NotFound`] for a `root` that is no longer
    /// live, and a lookup error if any reference does not resolve to exactly
    /// one live type.
    pub fn from_registry(registry: &Registry, root: ComponentId) -> Result<(Self, NodeIndex)> {
        let _ = registry.live(root)?;
        let mut graph = Self::new();
        let mut nodes = HashMap::new();
        let mut queue = VecDeque::from([root]);
        let root_index = graph.add_component(node(registry, root));
        let _ = nodes.insert(root, root_index);

        while let Some(current) = queue.pop_front() {
            let ty = registry.ty(current);
            let from = nodes[&current];
            let targets = ty
                .parents()
                .iter()
                .chain(ty.dependencies().iter().map(|d| d.target()));
            for target in targets {
                let id = registry.resolve(target)?;
                let to = *nodes.entry(id).or_insert_with(|| {
                    queue.push_back(id);
                    graph.add_component(node(registry, id))
                });
                tracing::trace!(from = ty.name(), to = %target, "dependency edge");
                graph.add_dependency(from, to);
            }
        }
        Ok((graph, root_index))
    }
}

fn node(registry: &Registry, id: ComponentId) -> ComponentNode {
    ComponentNode {
        id,
        name: registry.ty(id).name(),
    }
}

/// Resolves the construction order for `root` against `registry`.
///
/// # Errors
///
/// Returns a lookup error for unresolvable references and
/// [`GravityError::CircularDependency`] for cycles.
pub fn resolve_order(registry: &Registry, root: ComponentId) -> Result<Vec<ComponentId>> {
    let (graph, root_index) = DependencyGraph::from_registry(registry, root)?;
    let order: Vec<ComponentId> = graph
        .resolve_order(root_index)?
        .into_iter()
        .map(|n| n.id)
        .collect();
    tracing::debug!(
        root = registry.ty(root).name(),
        components = order.len(),
        "resolved construction order"
    );
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle_of(result: Result<Vec<&str>>) -> String {
        match result {
            Err(GravityError::CircularDependency { cycle }) => cycle,
            other => format!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn single_node_resolves() {
        let mut graph = DependencyGraph::new();
        let api = graph.add_component("api");
        let order = graph.resolve_order(api).expect("should resolve");
        assert_eq!(order, vec!["api"]);
    }

    #[test]
    fn linear_dependency_chain() {
        let mut graph = DependencyGraph::new();
        let api = graph.add_component("api");
        let db = graph.add_component("db");
        graph.add_dependency(api, db);

        let order = graph.resolve_order(api).expect("should resolve");
        assert_eq!(order, vec!["db", "api"]);
    }

    #[test]
    fn diamond_dependency_visits_shared_node_once() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_component("a");
        let b = graph.add_component("b");
        let c = graph.add_component("c");
        let d = graph.add_component("d");
        graph.add_dependency(a, b);
        graph.add_dependency(a, c);
        graph.add_dependency(b, d);
        graph.add_dependency(c, d);

        let order = graph.resolve_order(a).expect("should resolve");
        assert_eq!(order, vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn edges_follow_declaration_order() {
        let mut graph = DependencyGraph::new();
        let root = graph.add_component("root");
        let names = ["z", "y", "x", "w"];
        for name in names {
            let n = graph.add_component(name);
            graph.add_dependency(root, n);
        }
        let order = graph.resolve_order(root).expect("should resolve");
        assert_eq!(order, vec!["z", "y", "x", "w", "root"]);
    }

    #[test]
    fn unreachable_nodes_are_not_ordered() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_component("a");
        let b = graph.add_component("b");
        let _ = graph.add_component("island");
        graph.add_dependency(a, b);
        let order = graph.resolve_order(b).expect("should resolve");
        assert_eq!(order, vec!["b"]);
        assert_eq!(graph.component_count(), 3);
    }

    #[test]
    fn three_node_cycle_reports_full_loop() {
        let mut graph = DependencyGraph::new();
        let m = graph.add_component("M");
        let n = graph.add_component("N");
        let o = graph.add_component("O");
        graph.add_dependency(m, n);
        graph.add_dependency(n, o);
        graph.add_dependency(o, m);

        assert_eq!(cycle_of(graph.resolve_order(m)), "M->N->O->M");
        assert_eq!(cycle_of(graph.resolve_order(n)), "N->O->M->N");
    }

    #[test]
    fn cycle_report_trims_discovery_prefix() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_component("A");
        let b = graph.add_component("B");
        let c = graph.add_component("C");
        let d = graph.add_component("D");
        graph.add_dependency(a, b);
        graph.add_dependency(b, c);
        graph.add_dependency(c, d);
        graph.add_dependency(d, b);

        assert_eq!(cycle_of(graph.resolve_order(a)), "B->C->D->B");
    }

    #[test]
    fn self_dependency_is_minimal_cycle() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_component("A");
        graph.add_dependency(a, a);
        assert_eq!(cycle_of(graph.resolve_order(a)), "A->A");
    }
}
