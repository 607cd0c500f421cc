//! Service dependency graph using `petgraph`.
//!
//! Builds a directed graph from the `@name` references of a namespace's
//! definitions and aliases, then resolves an instantiation order.

use std::collections::HashMap;

use ctn_common::constants::SELF_SERVICE;
use ctn_common::error::{CtnError, Result};
use petgraph::graph::NodeIndex;

use crate::namespace::Namespace;

/// A dependency graph of services.
#[derive(Debug, Default)]
pub struct ServiceGraph {
    graph: petgraph::Graph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
    missing: Vec<(String, String)>,
}

impl ServiceGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph of every definition and alias in `namespace`.
    ///
    /// References to names the namespace does not define are recorded in
    /// [`missing`](Self::missing) rather than failing, since the container
    /// may supply them from elsewhere. The self-reference is never missing.
    #[must_use]
    pub fn from_namespace(namespace: &Namespace) -> Self {
        let mut graph = Self::new();
        for name in namespace.services().keys().chain(namespace.aliases().keys()) {
            let _ = graph.add_service(name.as_str());
        }
        for (name, definition) in namespace.services() {
            for dependency in definition.dependencies() {
                graph.link(namespace, name, dependency);
            }
        }
        for (name, target) in namespace.aliases() {
            graph.link(namespace, name, target);
        }
        tracing::debug!(
            services = graph.graph.node_count(),
            edges = graph.graph.edge_count(),
            missing = graph.missing.len(),
            "built service graph"
        );
        graph
    }

    fn link(&mut self, namespace: &Namespace, dependent: &str, dependency: &str) {
        if dependency == SELF_SERVICE {
            return;
        }
        if !namespace.has_service(dependency) {
            self.missing
                .push((dependent.to_string(), dependency.to_string()));
            return;
        }
        let from = self.add_service(dependent);
        let to = self.add_service(dependency);
        self.add_dependency(from, to);
    }

    /// Adds a service node, returning the existing node for a known name.
    pub fn add_service(&mut self, name: impl Into<String>) -> NodeIndex {
        let name = name.into();
        if let Some(&idx) = self.nodes.get(&name) {
            return idx;
        }
        let idx = self.graph.add_node(name.clone());
        let _ = self.nodes.insert(name, idx);
        idx
    }

    /// Adds a dependency edge: `dependent` depends on `dependency`.
    ///
    /// The graph edge points from `dependency` to `dependent`
    /// so that topological sort yields dependencies first.
    pub fn add_dependency(&mut self, dependent: NodeIndex, dependency: NodeIndex) {
        let _ = self.graph.update_edge(dependency, dependent, ());
    }

    /// `(dependent, dependency)` pairs whose dependency is not defined.
    #[must_use]
    pub fn missing(&self) -> &[(String, String)] {
        &self.missing
    }

    /// Number of services in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the graph has no services.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Names of the services `name` depends on directly.
    #[must_use]
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        let Some(&idx) = self.nodes.get(name) else {
            return Vec::new();
        };
        let mut names: Vec<&str> = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .filter_map(|n| self.graph.node_weight(n).map(String::as_str))
            .collect();
        names.sort_unstable();
        names
    }

    /// Returns an instantiation order: every service appears after the
    /// services it depends on.
    ///
    /// # Errors
    ///
    /// Returns a resolution error naming a service on the cycle if the
    /// graph contains one.
    pub fn resolve_order(&self) -> Result<Vec<String>> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .iter()
                .filter_map(|&idx| self.graph.node_weight(idx).cloned())
                .collect()),
            Err(cycle) => {
                let name = self
                    .graph
                    .node_weight(cycle.node_id())
                    .cloned()
                    .unwrap_or_default();
                Err(CtnError::resolution(
                    name,
                    "circular dependency detected in service graph",
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namespace(source: &str) -> Namespace {
        let mut ns = Namespace::new();
        ns.parse(source).expect("should compile");
        ns
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).expect(name)
    }

    #[test]
    fn empty_graph_resolves_to_empty() {
        let graph = ServiceGraph::new();
        assert!(graph.is_empty());
        assert!(graph.resolve_order().expect("should resolve").is_empty());
    }

    #[test]
    fn constructor_and_call_dependencies_come_first() {
        let graph = ServiceGraph::from_namespace(&namespace(
            "@kernel: App\\Kernel(@router)\n\
             - setLogger(@logger)\n\
             @router: App\\Router\n\
             @logger: App\\Logger(@handler)\n\
             @handler: App\\Handler",
        ));
        let order = graph.resolve_order().expect("should resolve");
        assert_eq!(order.len(), 4);
        assert!(position(&order, "router") < position(&order, "kernel"));
        assert!(position(&order, "logger") < position(&order, "kernel"));
        assert!(position(&order, "handler") < position(&order, "logger"));
        assert_eq!(graph.dependencies_of("kernel"), vec!["logger", "router"]);
    }

    #[test]
    fn aliases_depend_on_their_target() {
        let graph = ServiceGraph::from_namespace(&namespace(
            "@app: App\\App(@log)\n@log: @logger\n@logger: App\\Logger",
        ));
        let order = graph.resolve_order().expect("should resolve");
        assert!(position(&order, "logger") < position(&order, "log"));
        assert!(position(&order, "log") < position(&order, "app"));
    }

    #[test]
    fn unknown_dependencies_are_reported() {
        let graph = ServiceGraph::from_namespace(&namespace(
            "@app: App\\App(@db, @container)",
        ));
        assert_eq!(
            graph.missing(),
            &[("app".to_string(), "db".to_string())]
        );
    }

    #[test]
    fn cycle_detection() {
        let graph = ServiceGraph::from_namespace(&namespace(
            "@a: App\\A(@b)\n@b: App\\B\n- setA(@a)",
        ));
        let err = graph.resolve_order().unwrap_err();
        assert!(err.to_string().contains("circular"), "got: {err}");
    }

    #[test]
    fn repeated_references_add_one_edge() {
        let graph = ServiceGraph::from_namespace(&namespace(
            "@a: App\\A(@b, @b)\n- attach(@b)\n@b: App\\B",
        ));
        assert_eq!(graph.dependencies_of("a"), vec!["b"]);
        assert_eq!(graph.len(), 2);
    }
}
