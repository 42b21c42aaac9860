//! The flattened, ordered form of a dependency graph.

use crate::dependency::Dependency;
use crate::param::ParameterSpec;
use heron_core::Source;
use std::sync::Arc;

/// How body parameters read the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    /// No parameter reads the body.
    None,
    /// Exactly one non-embedded body parameter exists; it receives the whole
    /// body and its errors are located at `["body", ...]`.
    Single,
    /// Every body parameter reads the field named by its key; errors are
    /// located at `["body", key, ...]`.
    Embedded,
}

/// One step of a [`ResolutionPlan`].
#[derive(Debug, Clone)]
pub struct PlanNode {
    pub(crate) dependency: Arc<Dependency>,
    pub(crate) cacheable: bool,
    pub(crate) inputs: Vec<Option<usize>>,
    pub(crate) guards: Vec<usize>,
}

impl PlanNode {
    /// The dependency this step evaluates.
    #[must_use]
    pub fn dependency(&self) -> &Arc<Dependency> {
        &self.dependency
    }

    /// Whether the result may be shared through the request cache.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.cacheable
    }

    /// Plan indices of the steps feeding this one: one per dependency
    /// parameter in declaration order, followed by guards.
    pub fn children(&self) -> impl Iterator<Item = usize> + '_ {
        self.inputs.iter().flatten().copied().chain(self.guards.iter().copied())
    }

    /// Pairs each declared parameter with the step that provides it, if it is
    /// dependency-sourced.
    pub fn bindings(&self) -> impl Iterator<Item = (&ParameterSpec, Option<usize>)> + '_ {
        self.dependency.params().iter().zip(self.inputs.iter().copied())
    }
}

/// Topologically ordered steps for one route, children before parents.
///
/// Built once at registration by [`GraphBuilder`](crate::GraphBuilder) and
/// shared read-only by every request. The last node is the route's handler.
#[derive(Debug, Clone)]
pub struct ResolutionPlan {
    pub(crate) nodes: Vec<PlanNode>,
    pub(crate) body_mode: BodyMode,
}

impl ResolutionPlan {
    /// All steps, in execution order.
    #[must_use]
    pub fn nodes(&self) -> &[PlanNode] {
        &self.nodes
    }

    /// The handler step.
    #[must_use]
    pub fn root(&self) -> &PlanNode {
        &self.nodes[self.nodes.len() - 1]
    }

    /// Index of the handler step.
    #[must_use]
    pub fn root_index(&self) -> usize {
        self.nodes.len() - 1
    }

    /// How body parameters read the body.
    #[must_use]
    pub fn body_mode(&self) -> BodyMode {
        self.body_mode
    }

    /// Dependency names in execution order.
    #[must_use]
    pub fn order(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.dependency.name()).collect()
    }

    /// Every parameter of every step reading `source`, in plan order.
    pub fn params_from(&self, source: Source) -> impl Iterator<Item = &ParameterSpec> + '_ {
        self.nodes
            .iter()
            .flat_map(|n| n.dependency.params())
            .filter(move |p| p.source() == source)
    }
}
