//! Dependency declarations.
//!
//! A [`Dependency`] is a named callable together with the parameters it
//! declares. Handlers are dependencies too: a path operation's handler is
//! simply the root of its dependency graph.
//!
//! Callables come in three flavours, all stored behind the same erased
//! signature:
//!
//! | Constructor | Callable | Use for |
//! |---|---|---|
//! | [`DependencyBuilder::sync_fn`] | `Fn(Arguments) -> Result<T>` | cheap, non-blocking work |
//! | [`DependencyBuilder::handler`] | `Fn(Arguments) -> impl Future` | async work |
//! | [`DependencyBuilder::generator`] | `Fn(Arguments, RequestScope) -> impl Future` | resources that need cleanup |
//!
//! # Example
//!
//! ```
//! use heron_core::FieldSchema;
//! use heron_deps::{ArgValue, Dependency, DependencyRef, ParameterSpec, ScopeOutcome};
//!
//! struct Db;
//!
//! let get_db = Dependency::builder("get_db").generator(|_args, scope| async move {
//!     scope.defer("close db", |_outcome: ScopeOutcome| {});
//!     Ok(ArgValue::shared(Db))
//! });
//!
//! let list_items = Dependency::builder("list_items")
//!     .param(ParameterSpec::query("limit", FieldSchema::integer()))
//!     .param(ParameterSpec::depends("db", DependencyRef::to(&get_db)))
//!     .handler(|args| async move {
//!         let limit: i64 = args.value("limit")?;
//!         Ok(serde_json::json!({ "limit": limit }))
//!     });
//!
//! assert_eq!(list_items.params().len(), 2);
//! assert!(get_db.has_cleanup());
//! ```

use crate::args::{ArgValue, Arguments};
use crate::param::ParameterSpec;
use crate::scope::RequestScope;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Stable identity of a declared dependency, assigned at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyId(u64);

impl DependencyId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DependencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Future returned by an erased callable.
pub type CallFuture = BoxFuture<'static, anyhow::Result<ArgValue>>;

/// A type-erased dependency callable.
pub type ErasedCallable = Arc<dyn Fn(Arguments, RequestScope) -> CallFuture + Send + Sync>;

/// How the callable runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStyle {
    /// Runs inline on the resolving task.
    Sync,
    /// Awaited in place.
    Async,
}

/// A declared dependency: callable plus parameters.
pub struct Dependency {
    id: DependencyId,
    name: String,
    params: Vec<ParameterSpec>,
    guards: Vec<DependencyRef>,
    callable: ErasedCallable,
    style: CallStyle,
    cleanup: bool,
}

impl Dependency {
    /// Starts declaring a dependency.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> DependencyBuilder {
        DependencyBuilder {
            name: name.into(),
            params: Vec::new(),
            guards: Vec::new(),
        }
    }

    /// Returns the identity used as cache key.
    #[must_use]
    pub fn id(&self) -> DependencyId {
        self.id
    }

    /// Returns the declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared parameters, in order.
    #[must_use]
    pub fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    /// Returns dependencies that run first but whose results are discarded.
    #[must_use]
    pub fn guards(&self) -> &[DependencyRef] {
        &self.guards
    }

    /// Returns how the callable runs.
    #[must_use]
    pub fn style(&self) -> CallStyle {
        self.style
    }

    /// Whether the callable may register cleanup actions.
    #[must_use]
    pub fn has_cleanup(&self) -> bool {
        self.cleanup
    }

    /// Invokes the callable.
    pub fn call(&self, args: Arguments, scope: RequestScope) -> CallFuture {
        (self.callable)(args, scope)
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("params", &self.params)
            .field("guards", &self.guards)
            .field("style", &self.style)
            .field("cleanup", &self.cleanup)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Dependency`].
#[derive(Debug)]
pub struct DependencyBuilder {
    name: String,
    params: Vec<ParameterSpec>,
    guards: Vec<DependencyRef>,
}

impl DependencyBuilder {
    /// Declares a parameter.
    #[must_use]
    pub fn param(mut self, spec: ParameterSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Declares a dependency that must succeed before this one runs, without
    /// binding its result to a parameter.
    #[must_use]
    pub fn guard(mut self, dependency: DependencyRef) -> Self {
        self.guards.push(dependency);
        self
    }

    fn finish(self, callable: ErasedCallable, style: CallStyle, cleanup: bool) -> Arc<Dependency> {
        Arc::new(Dependency {
            id: DependencyId::next(),
            name: self.name,
            params: self.params,
            guards: self.guards,
            callable,
            style,
            cleanup,
        })
    }

    /// Finishes with a synchronous callable.
    pub fn sync_fn<F, T>(self, f: F) -> Arc<Dependency>
    where
        F: Fn(Arguments) -> anyhow::Result<T> + Send + Sync + 'static,
        T: Into<ArgValue>,
    {
        let callable: ErasedCallable = Arc::new(move |args: Arguments, _scope: RequestScope| -> CallFuture {
            futures_util::future::ready(erase(f(args))).boxed()
        });
        self.finish(callable, CallStyle::Sync, false)
    }

    /// Finishes with an asynchronous callable.
    pub fn handler<F, Fut, T>(self, f: F) -> Arc<Dependency>
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Into<ArgValue> + 'static,
    {
        let callable: ErasedCallable = Arc::new(move |args: Arguments, _scope: RequestScope| -> CallFuture {
            f(args).map(erase).boxed()
        });
        self.finish(callable, CallStyle::Async, false)
    }

    /// Finishes with an asynchronous callable that receives the request
    /// scope and may register cleanup actions on it.
    pub fn generator<F, Fut, T>(self, f: F) -> Arc<Dependency>
    where
        F: Fn(Arguments, RequestScope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Into<ArgValue> + 'static,
    {
        let callable: ErasedCallable = Arc::new(move |args: Arguments, scope: RequestScope| -> CallFuture {
            f(args, scope).map(erase).boxed()
        });
        self.finish(callable, CallStyle::Async, true)
    }
}

fn erase<T: Into<ArgValue>>(result: anyhow::Result<T>) -> anyhow::Result<ArgValue> {
    result.map(Into::into)
}

/// A reference from a parameter to the dependency that provides it.
#[derive(Debug, Clone)]
pub struct DependencyRef {
    target: RefTarget,
    use_cache: bool,
}

#[derive(Debug, Clone)]
enum RefTarget {
    Inline(Arc<Dependency>),
    Named(String),
}

impl DependencyRef {
    /// References a dependency directly.
    #[must_use]
    pub fn to(dependency: &Arc<Dependency>) -> Self {
        Self {
            target: RefTarget::Inline(Arc::clone(dependency)),
            use_cache: true,
        }
    }

    /// References a dependency registered under `name`; resolved when the
    /// plan is built.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            target: RefTarget::Named(name.into()),
            use_cache: true,
        }
    }

    /// Evaluates the dependency afresh for this reference instead of sharing
    /// the per-request cached result.
    #[must_use]
    pub fn no_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    /// Whether the result is shared through the per-request cache.
    #[must_use]
    pub fn use_cache(&self) -> bool {
        self.use_cache
    }

    /// The referenced dependency's name.
    #[must_use]
    pub fn name(&self) -> &str {
        match &self.target {
            RefTarget::Inline(dep) => dep.name(),
            RefTarget::Named(name) => name,
        }
    }

    /// The referenced dependency, if it was given directly.
    #[must_use]
    pub fn inline(&self) -> Option<&Arc<Dependency>> {
        match &self.target {
            RefTarget::Inline(dep) => Some(dep),
            RefTarget::Named(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ScopeOutcome;
    use heron_core::FieldSchema;
    use serde_json::json;

    #[test]
    fn test_ids_are_unique() {
        let a = Dependency::builder("a").sync_fn(|_| Ok(()));
        let b = Dependency::builder("a").sync_fn(|_| Ok(()));
        assert_ne!(a.id(), b.id());
        assert!(a.id() < b.id());
    }

    #[test]
    fn test_builder_records_metadata() {
        let base = Dependency::builder("base").sync_fn(|_| Ok(json!(1)));
        let dep = Dependency::builder("child")
            .param(ParameterSpec::query("q", FieldSchema::string()))
            .guard(DependencyRef::to(&base))
            .handler(|_| async { Ok(json!(2)) });

        assert_eq!(dep.name(), "child");
        assert_eq!(dep.params().len(), 1);
        assert_eq!(dep.guards()[0].name(), "base");
        assert_eq!(dep.style(), CallStyle::Async);
        assert!(!dep.has_cleanup());
        assert_eq!(base.style(), CallStyle::Sync);
    }

    #[test]
    fn test_refs() {
        let dep = Dependency::builder("get_user").sync_fn(|_| Ok(()));
        let inline = DependencyRef::to(&dep);
        assert!(inline.use_cache());
        assert_eq!(inline.inline().map(|d| d.id()), Some(dep.id()));

        let named = DependencyRef::named("get_user").no_cache();
        assert!(!named.use_cache());
        assert!(named.inline().is_none());
        assert_eq!(named.name(), "get_user");
    }

    #[tokio::test]
    async fn test_call_sync_and_async() {
        let sync = Dependency::builder("double").sync_fn(|args: Arguments| {
            let n: i64 = args.value("n")?;
            Ok(json!(n * 2))
        });
        let mut args = Arguments::new();
        args.insert("n", ArgValue::from(json!(21)));

        let out = sync.call(args, RequestScope::new()).await.unwrap();
        assert_eq!(out.as_json(), Some(&json!(42)));

        let failing =
            Dependency::builder("boom").handler(|_| async { Err::<(), _>(anyhow::anyhow!("boom")) });
        assert!(failing.call(Arguments::new(), RequestScope::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_async_callables_return_owned_values() {
        let greet = Dependency::builder("greet").handler(|args: Arguments| async move {
            let name: String = args.value("name")?;
            Ok(json!(format!("hello {name}")))
        });
        let mut args = Arguments::new();
        args.insert("name", ArgValue::from(json!("ada")));
        let out = greet.call(args, RequestScope::new()).await.unwrap();
        assert_eq!(out.as_json(), Some(&json!("hello ada")));

        let session = Dependency::builder("session").generator(|_, scope: RequestScope| async move {
            scope.defer("close session", |_| {});
            Ok(ArgValue::shared(String::from("sess-1")))
        });
        assert!(session.has_cleanup());

        let scope = RequestScope::new();
        let out = session.call(Arguments::new(), scope.clone()).await.unwrap();
        assert_eq!(out.downcast::<String>().as_deref().map(String::as_str), Some("sess-1"));
        scope.close(ScopeOutcome::Completed).await;
    }
}
