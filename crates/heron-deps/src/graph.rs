//! Resolution plan construction.
//!
//! [`GraphBuilder`] walks a handler's declared parameters depth-first and
//! flattens the dependency graph into a [`ResolutionPlan`]:
//!
//! - children come before parents, ties broken by declaration order
//! - a dependency referenced with caching enabled gets exactly one node,
//!   however many times it is referenced
//! - a reference with caching disabled always gets a node of its own
//! - a dependency that transitively requires itself is a [`GraphError::Cycle`]
//!
//! Named references and overrides are looked up in a [`DependencyRegistry`].

use crate::dependency::{Dependency, DependencyId, DependencyRef};
use crate::error::{GraphError, GraphResult};
use crate::plan::{BodyMode, PlanNode, ResolutionPlan};
use heron_core::Source;
use indexmap::{IndexMap, IndexSet};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Dependencies addressable by name, plus replacements installed for tests.
///
/// # Example
///
/// ```
/// use heron_deps::{Dependency, DependencyRegistry};
/// use serde_json::json;
///
/// let real = Dependency::builder("get_db").sync_fn(|_| Ok(json!("postgres")));
/// let fake = Dependency::builder("fake_db").sync_fn(|_| Ok(json!("memory")));
///
/// let mut registry = DependencyRegistry::new();
/// registry.register(&real);
/// registry.override_with("get_db", &fake);
///
/// assert_eq!(registry.lookup("get_db").map(|d| d.name()), Some("fake_db"));
/// assert_eq!(registry.effective(&real).id(), fake.id());
///
/// registry.clear_overrides();
/// assert_eq!(registry.effective(&real).id(), real.id());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DependencyRegistry {
    named: IndexMap<String, Arc<Dependency>>,
    overrides: IndexMap<String, Arc<Dependency>>,
}

impl DependencyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `dependency` addressable through [`DependencyRef::named`].
    /// A later registration under the same name replaces the earlier one.
    pub fn register(&mut self, dependency: &Arc<Dependency>) {
        self.named
            .insert(dependency.name().to_string(), Arc::clone(dependency));
    }

    /// Replaces every use of the dependency called `name` with `replacement`.
    pub fn override_with(&mut self, name: impl Into<String>, replacement: &Arc<Dependency>) {
        self.overrides.insert(name.into(), Arc::clone(replacement));
    }

    /// Removes every override.
    pub fn clear_overrides(&mut self) {
        self.overrides.clear();
    }

    /// Returns true if any override is installed.
    #[must_use]
    pub fn has_overrides(&self) -> bool {
        !self.overrides.is_empty()
    }

    /// Finds a dependency by name, preferring an override.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Arc<Dependency>> {
        self.overrides.get(name).or_else(|| self.named.get(name))
    }

    /// Returns the override for `dependency`, or `dependency` itself.
    #[must_use]
    pub fn effective(&self, dependency: &Arc<Dependency>) -> Arc<Dependency> {
        Arc::clone(self.overrides.get(dependency.name()).unwrap_or(dependency))
    }

    /// Number of registered (not overriding) dependencies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.named.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.named.is_empty()
    }
}

/// Builds [`ResolutionPlan`]s against a registry.
#[derive(Debug, Clone, Copy)]
pub struct GraphBuilder<'a> {
    registry: &'a DependencyRegistry,
}

#[derive(Default)]
struct BuildState {
    nodes: Vec<PlanNode>,
    cached: HashMap<DependencyId, usize>,
    stack: Vec<(DependencyId, String)>,
}

impl BuildState {
    fn cycle_through(&self, dependency: &Dependency) -> Option<Vec<String>> {
        let pos = self.stack.iter().position(|(id, _)| *id == dependency.id())?;
        let mut path: Vec<String> = self.stack[pos..].iter().map(|(_, name)| name.clone()).collect();
        path.push(dependency.name().to_string());
        Some(path)
    }
}

impl<'a> GraphBuilder<'a> {
    /// Creates a builder resolving names and overrides through `registry`.
    #[must_use]
    pub fn new(registry: &'a DependencyRegistry) -> Self {
        Self { registry }
    }

    /// Flattens the graph rooted at `root` (a route handler).
    ///
    /// The handler itself is never overridden and never cached.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphError`] for cycles, unknown names, and malformed
    /// parameter declarations.
    ///
    /// # Example
    ///
    /// ```
    /// use heron_core::FieldSchema;
    /// use heron_deps::{Dependency, DependencyRef, DependencyRegistry, GraphBuilder, ParameterSpec};
    /// use serde_json::json;
    ///
    /// let get_db = Dependency::builder("get_db").sync_fn(|_| Ok(json!("db")));
    /// let get_user = Dependency::builder("get_user")
    ///     .param(ParameterSpec::depends("db", DependencyRef::to(&get_db)))
    ///     .sync_fn(|_| Ok(json!("user")));
    /// let handler = Dependency::builder("read_me")
    ///     .param(ParameterSpec::depends("user", DependencyRef::to(&get_user)))
    ///     .param(ParameterSpec::depends("db", DependencyRef::to(&get_db)))
    ///     .handler(|_| async { Ok(()) });
    ///
    /// let registry = DependencyRegistry::new();
    /// let plan = GraphBuilder::new(&registry).build(&handler).unwrap();
    /// assert_eq!(plan.order(), vec!["get_db", "get_user", "read_me"]);
    /// ```
    pub fn build(&self, root: &Arc<Dependency>) -> GraphResult<ResolutionPlan> {
        let mut state = BuildState::default();
        self.visit(root, false, &mut state)?;

        let body_mode = body_mode(&state.nodes);
        let plan = ResolutionPlan {
            nodes: state.nodes,
            body_mode,
        };
        tracing::debug!(
            handler = %root.name(),
            nodes = plan.nodes().len(),
            order = ?plan.order(),
            body_mode = ?body_mode,
            "Built resolution plan"
        );
        Ok(plan)
    }

    fn visit(
        &self,
        dependency: &Arc<Dependency>,
        cacheable: bool,
        state: &mut BuildState,
    ) -> GraphResult<usize> {
        if cacheable {
            if let Some(&index) = state.cached.get(&dependency.id()) {
                return Ok(index);
            }
        }
        if let Some(path) = state.cycle_through(dependency) {
            return Err(GraphError::cycle(path));
        }
        check_params(dependency)?;

        state
            .stack
            .push((dependency.id(), dependency.name().to_string()));

        let mut inputs = Vec::with_capacity(dependency.params().len());
        for param in dependency.params() {
            let input = match param.dependency() {
                Some(reference) => {
                    let child = self.target(reference, dependency)?;
                    Some(self.visit(&child, reference.use_cache(), state)?)
                }
                None => None,
            };
            inputs.push(input);
        }

        let mut guards = Vec::with_capacity(dependency.guards().len());
        for reference in dependency.guards() {
            let child = self.target(reference, dependency)?;
            guards.push(self.visit(&child, reference.use_cache(), state)?);
        }

        state.stack.pop();

        let index = state.nodes.len();
        state.nodes.push(PlanNode {
            dependency: Arc::clone(dependency),
            cacheable,
            inputs,
            guards,
        });
        if cacheable {
            state.cached.insert(dependency.id(), index);
        }
        Ok(index)
    }

    fn target(&self, reference: &DependencyRef, required_by: &Dependency) -> GraphResult<Arc<Dependency>> {
        match reference.inline() {
            Some(dependency) => Ok(self.registry.effective(dependency)),
            None => self
                .registry
                .lookup(reference.name())
                .cloned()
                .ok_or_else(|| GraphError::UnknownDependency {
                    name: reference.name().to_string(),
                    required_by: required_by.name().to_string(),
                }),
        }
    }
}

fn check_params(dependency: &Dependency) -> GraphResult<()> {
    let mut seen = HashSet::new();
    for param in dependency.params() {
        if !seen.insert(param.name()) {
            return Err(GraphError::DuplicateParameter {
                dependency: dependency.name().to_string(),
                parameter: param.name().to_string(),
            });
        }
        match param.source() {
            Source::Path if !param.is_required() => {
                return Err(GraphError::OptionalPathParameter {
                    dependency: dependency.name().to_string(),
                    parameter: param.name().to_string(),
                });
            }
            Source::Dependency if param.dependency().is_none() => {
                return Err(GraphError::UnboundDependency {
                    dependency: dependency.name().to_string(),
                    parameter: param.name().to_string(),
                });
            }
            _ => {}
        }
    }
    Ok(())
}

fn body_mode(nodes: &[PlanNode]) -> BodyMode {
    let mut keys = IndexSet::new();
    let mut embedded = false;
    for param in nodes
        .iter()
        .flat_map(|n| n.dependency.params())
        .filter(|p| p.source() == Source::Body)
    {
        keys.insert(param.key());
        embedded |= param.is_embedded();
    }
    match keys.len() {
        0 => BodyMode::None,
        1 if !embedded => BodyMode::Single,
        _ => BodyMode::Embedded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::ParameterSpec;
    use heron_core::FieldSchema;
    use serde_json::json;

    fn leaf(name: &str) -> Arc<Dependency> {
        Dependency::builder(name).sync_fn(|_| Ok(json!(null)))
    }

    fn handler(params: Vec<ParameterSpec>) -> Arc<Dependency> {
        params
            .into_iter()
            .fold(Dependency::builder("handler"), |b, p| b.param(p))
            .handler(|_| async { Ok(()) })
    }

    #[test]
    fn test_shared_dependency_gets_one_node() {
        let db = leaf("get_db");
        let a = Dependency::builder("a")
            .param(ParameterSpec::depends("db", DependencyRef::to(&db)))
            .sync_fn(|_| Ok(()));
        let b = Dependency::builder("b")
            .param(ParameterSpec::depends("db", DependencyRef::to(&db)))
            .sync_fn(|_| Ok(()));
        let root = handler(vec![
            ParameterSpec::depends("a", DependencyRef::to(&a)),
            ParameterSpec::depends("b", DependencyRef::to(&b)),
        ]);

        let plan = GraphBuilder::new(&DependencyRegistry::new()).build(&root).unwrap();
        assert_eq!(plan.order(), vec!["get_db", "a", "b", "handler"]);
        assert_eq!(plan.nodes()[1].children().collect::<Vec<_>>(), vec![0]);
        assert_eq!(plan.nodes()[2].children().collect::<Vec<_>>(), vec![0]);
        assert!(!plan.root().is_cacheable());
    }

    #[test]
    fn test_no_cache_gets_own_node() {
        let db = leaf("get_db");
        let root = handler(vec![
            ParameterSpec::depends("first", DependencyRef::to(&db)),
            ParameterSpec::depends("second", DependencyRef::to(&db).no_cache()),
            ParameterSpec::depends("third", DependencyRef::to(&db)),
        ]);

        let plan = GraphBuilder::new(&DependencyRegistry::new()).build(&root).unwrap();
        assert_eq!(plan.order(), vec!["get_db", "get_db", "handler"]);
        assert!(plan.nodes()[0].is_cacheable());
        assert!(!plan.nodes()[1].is_cacheable());
        assert_eq!(plan.root().children().collect::<Vec<_>>(), vec![0, 1, 0]);
    }

    #[test]
    fn test_named_cycle_is_rejected() {
        let a = Dependency::builder("a")
            .param(ParameterSpec::depends("b", DependencyRef::named("b")))
            .sync_fn(|_| Ok(()));
        let b = Dependency::builder("b")
            .param(ParameterSpec::depends("a", DependencyRef::named("a")))
            .sync_fn(|_| Ok(()));
        let mut registry = DependencyRegistry::new();
        registry.register(&a);
        registry.register(&b);

        let root = handler(vec![ParameterSpec::depends("a", DependencyRef::to(&a))]);
        let err = GraphBuilder::new(&registry).build(&root).unwrap_err();
        assert_eq!(
            err.cycle_path().map(<[String]>::to_vec),
            Some(vec!["a".to_string(), "b".to_string(), "a".to_string()])
        );
    }

    #[test]
    fn test_unknown_name() {
        let root = handler(vec![ParameterSpec::depends("db", DependencyRef::named("get_db"))]);
        let err = GraphBuilder::new(&DependencyRegistry::new()).build(&root).unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownDependency {
                name: "get_db".into(),
                required_by: "handler".into(),
            }
        );
    }

    #[test]
    fn test_parameter_checks() {
        let registry = DependencyRegistry::new();
        let dup = handler(vec![
            ParameterSpec::query("q", FieldSchema::string()),
            ParameterSpec::header("q", FieldSchema::string()),
        ]);
        assert!(matches!(
            GraphBuilder::new(&registry).build(&dup),
            Err(GraphError::DuplicateParameter { .. })
        ));

        let optional_path = handler(vec![ParameterSpec::path("id", FieldSchema::integer()).optional()]);
        assert!(matches!(
            GraphBuilder::new(&registry).build(&optional_path),
            Err(GraphError::OptionalPathParameter { .. })
        ));

        let unbound = handler(vec![ParameterSpec::new("db", Source::Dependency, FieldSchema::any())]);
        assert!(matches!(
            GraphBuilder::new(&registry).build(&unbound),
            Err(GraphError::UnboundDependency { .. })
        ));
    }

    #[test]
    fn test_override_replaces_inline_reference() {
        let real = leaf("get_db");
        let fake = leaf("fake_db");
        let root = handler(vec![ParameterSpec::depends("db", DependencyRef::to(&real))]);

        let mut registry = DependencyRegistry::new();
        registry.override_with("get_db", &fake);
        let plan = GraphBuilder::new(&registry).build(&root).unwrap();
        assert_eq!(plan.order(), vec!["fake_db", "handler"]);
        assert!(registry.has_overrides());
    }

    #[test]
    fn test_body_modes() {
        let registry = DependencyRegistry::new();
        let none = handler(vec![ParameterSpec::query("q", FieldSchema::string())]);
        assert_eq!(GraphBuilder::new(&registry).build(&none).unwrap().body_mode(), BodyMode::None);

        let single = handler(vec![ParameterSpec::body("item", FieldSchema::any())]);
        assert_eq!(GraphBuilder::new(&registry).build(&single).unwrap().body_mode(), BodyMode::Single);

        let embedded = handler(vec![ParameterSpec::body("item", FieldSchema::any()).embed()]);
        assert_eq!(
            GraphBuilder::new(&registry).build(&embedded).unwrap().body_mode(),
            BodyMode::Embedded
        );

        let many = handler(vec![
            ParameterSpec::body("item", FieldSchema::any()),
            ParameterSpec::body("user", FieldSchema::any()),
        ]);
        assert_eq!(GraphBuilder::new(&registry).build(&many).unwrap().body_mode(), BodyMode::Embedded);
        assert_eq!(
            GraphBuilder::new(&registry)
                .build(&many)
                .unwrap()
                .params_from(Source::Body)
                .count(),
            2
        );
    }
}
