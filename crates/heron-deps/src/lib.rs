//! # Heron Deps
//!
//! Dependency declaration, graph construction, and per-request resolution
//! for the Heron request pipeline.
//!
//! Every route handler is a [`Dependency`] whose [`ParameterSpec`]s say where
//! each input comes from. At registration time [`GraphBuilder`] flattens the
//! handler and everything it depends on into a [`ResolutionPlan`]. At request
//! time [`resolve`] runs the plan against a
//! [`RequestContext`](heron_extract::RequestContext).
//!
//! | Stage | Type | When |
//! |-------|------|------|
//! | Declare | [`Dependency`], [`ParameterSpec`], [`DependencyRef`] | startup |
//! | Build | [`GraphBuilder`], [`DependencyRegistry`] → [`ResolutionPlan`] | startup, fatal on [`GraphError`] |
//! | Resolve | [`resolve`] → [`Arguments`] or [`ResolveError`] | every request |
//! | Release | [`RequestScope`] | end of every request |
//!
//! ## Outcomes
//!
//! | Failure | Aggregated | Result |
//! |---------|------------|--------|
//! | Missing or invalid parameter | yes | [`ResolveError::Invalid`] (422) |
//! | [`HttpError`](heron_core::HttpError) from a dependency | with validation errors | [`ResolveError::Domain`] when alone |
//! | Any other dependency error | no | [`ResolveError::Fault`] (500) |
//!
//! ## Example
//!
//! ```rust
//! use heron_core::FieldSchema;
//! use heron_deps::{resolve, Dependency, DependencyCache, DependencyRef, DependencyRegistry,
//!     GraphBuilder, ParameterSpec, RequestScope, ResolveOptions};
//! use heron_extract::RequestContext;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let get_db = Dependency::builder("get_db").sync_fn(|_| Ok(json!("pool")));
//! let read_item = Dependency::builder("read_item")
//!     .param(ParameterSpec::path("item_id", FieldSchema::integer()))
//!     .param(ParameterSpec::depends("db", DependencyRef::to(&get_db)))
//!     .handler(|_| async { Ok(()) });
//!
//! let plan = GraphBuilder::new(&DependencyRegistry::new()).build(&read_item).unwrap();
//! let ctx = RequestContext::builder().path_param("item_id", "7").build();
//! let scope = RequestScope::new();
//!
//! let args = resolve(&plan, &ctx, &DependencyCache::new(), &scope, ResolveOptions::default())
//!     .await
//!     .unwrap();
//! assert_eq!(args.value::<i64>("item_id").unwrap(), 7);
//! assert_eq!(args.json("db"), Some(&json!("pool")));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/heron-deps/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod args;
mod cache;
mod dependency;
mod error;
mod graph;
mod param;
mod plan;
mod resolver;
mod scope;

pub use args::{ArgValue, ArgumentError, Arguments};
pub use cache::{Cached, DependencyCache};
pub use dependency::{
    CallFuture, CallStyle, Dependency, DependencyBuilder, DependencyId, DependencyRef, ErasedCallable,
};
pub use error::{GraphError, GraphResult};
pub use graph::{DependencyRegistry, GraphBuilder};
pub use param::ParameterSpec;
pub use plan::{BodyMode, PlanNode, ResolutionPlan};
pub use resolver::{resolve, ResolveError, ResolveOptions};
pub use scope::{RequestScope, ScopeOutcome};
