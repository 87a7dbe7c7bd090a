//! Dependency graph management using `petgraph`.
//!
//! Builds a directed graph from service and connection-string references
//! and resolves the order in which resources should be started.

use std::collections::HashMap;

use appwire_common::error::{AppwireError, Result};
use appwire_common::types::ResourceId;

use crate::callbacks::{ContextCallback, EnvironmentCallback};
use crate::resource::AppModel;

/// A dependency graph of resources.
#[derive(Debug)]
pub struct DependencyGraph {
    graph: petgraph::Graph<String, ()>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: petgraph::Graph::new(),
        }
    }

    /// Builds the graph of every resource in `model` and its references.
    #[must_use]
    pub fn from_model(model: &AppModel) -> Self {
        let mut graph = Self::new();
        let nodes: HashMap<ResourceId, petgraph::graph::NodeIndex> = model
            .resources()
            .iter()
            .map(|r| (r.id(), graph.add_resource(r.name())))
            .collect();

        for resource in model.resources() {
            let Some(&dependent) = nodes.get(&resource.id()) else {
                continue;
            };
            for dependency in dependencies_of(resource) {
                if let Some(&dependency) = nodes.get(&dependency) {
                    graph.add_dependency(dependent, dependency);
                }
            }
        }
        graph
    }

    /// Adds a resource node to the graph.
    pub fn add_resource(&mut self, name: impl Into<String>) -> petgraph::graph::NodeIndex {
        self.graph.add_node(name.into())
    }

    /// Adds a dependency edge: `dependent` depends on `dependency`.
    ///
    /// The graph edge points from `dependency` to `dependent`
    /// so that topological sort yields dependencies first.
    pub fn add_dependency(
        &mut self,
        dependent: petgraph::graph::NodeIndex,
        dependency: petgraph::graph::NodeIndex,
    ) {
        let _ = self.graph.update_edge(dependency, dependent, ());
    }

    /// Number of dependency edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns a start order for all resources, dependencies first.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles.
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
                Err(AppwireError::invalid(format!(
                    "cyclic dependency detected in resource graph at \"{name}\""
                )))
            }
        }
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Resources `resource` depends on, through service or connection-string
/// references, in registration order.
fn dependencies_of(resource: &crate::resource::Resource) -> Vec<ResourceId> {
    let mut ids: Vec<ResourceId> = resource
        .annotations()
        .service_references()
        .iter()
        .map(crate::reference::ServiceReference::target)
        .collect();
    ids.extend(
        resource
            .annotations()
            .environment_callbacks()
            .iter()
            .filter_map(|c| match c {
                EnvironmentCallback::Context(ContextCallback::ConnectionString(r)) => {
                    Some(r.source)
                }
                _ => None,
            }),
    );
    ids
}
