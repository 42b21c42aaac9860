//! Operation registry and request entry point.

use crate::error::AppError;
use crate::operation::PathOperation;
use crate::reply::into_payload;
use crate::request_id::{RequestId, REQUEST_ID_HEADER};
use bytes::Bytes;
use heron_config::HeronConfig;
use heron_core::{classify, CallError, Fault, HttpError};
use heron_deps::{
    resolve, Dependency, DependencyCache, DependencyRegistry, GraphBuilder, RequestScope, ResolutionPlan,
    ResolveError, ResolveOptions, ScopeOutcome,
};
use heron_extract::{Params, RequestContext};
use heron_response::{fault_response, http_error_response, validation_error_response};
use heron_telemetry::{log_request_complete, log_request_error, log_request_start};
use http::{HeaderValue, Request, Response};
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

#[derive(Debug)]
struct Route {
    operation: PathOperation,
    plan: Arc<ResolutionPlan>,
}

/// A set of path operations with their resolution plans, ready to serve.
///
/// Plans are built when the app is assembled. Any [`GraphError`] stops
/// assembly, so a running `App` only holds valid plans.
///
/// [`GraphError`]: heron_deps::GraphError
///
/// # Example
///
/// ```
/// use heron::{App, PathOperation};
/// use heron_core::FieldSchema;
/// use heron_deps::{Dependency, ParameterSpec};
/// use heron_extract::RequestContext;
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let list_items = Dependency::builder("list_items")
///     .param(ParameterSpec::query("limit", FieldSchema::integer()))
///     .handler(|args| async move {
///         let limit: i64 = args.value("limit")?;
///         Ok(json!({"limit": limit}))
///     });
///
/// let app = App::builder()
///     .operation(PathOperation::new("list_items", list_items).path("/items"))
///     .build()
///     .unwrap();
///
/// let ok = app.handle("list_items", RequestContext::builder().uri("/items?limit=5").build()).await;
/// assert_eq!(ok.status(), 200);
/// assert_eq!(ok.body().as_ref(), br#"{"limit":5}"#);
///
/// let invalid = app.handle("list_items", RequestContext::builder().uri("/items").build()).await;
/// assert_eq!(invalid.status(), 422);
/// # });
/// ```
#[derive(Debug)]
pub struct App {
    config: HeronConfig,
    registry: DependencyRegistry,
    routes: IndexMap<String, Route>,
    trust_request_id: bool,
}

/// Builder for [`App`].
#[derive(Debug, Default)]
pub struct AppBuilder {
    config: HeronConfig,
    registry: DependencyRegistry,
    operations: Vec<PathOperation>,
    trust_request_id: bool,
}

impl AppBuilder {
    /// Uses `config` instead of [`HeronConfig::default`].
    #[must_use]
    pub fn config(mut self, config: HeronConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a dependency so that [`DependencyRef::named`] references
    /// and overrides can find it.
    ///
    /// [`DependencyRef::named`]: heron_deps::DependencyRef::named
    #[must_use]
    pub fn dependency(mut self, dependency: &Arc<Dependency>) -> Self {
        self.registry.register(dependency);
        self
    }

    /// Adds a path operation.
    #[must_use]
    pub fn operation(mut self, operation: PathOperation) -> Self {
        self.operations.push(operation);
        self
    }

    /// Reuses valid incoming `x-request-id` headers instead of generating
    /// new IDs.
    #[must_use]
    pub fn trust_request_id(mut self, trust: bool) -> Self {
        self.trust_request_id = trust;
        self
    }

    /// Validates the configuration and builds every plan.
    ///
    /// # Errors
    ///
    /// - [`AppError::Config`] if the configuration is invalid
    /// - [`AppError::DuplicateOperation`] if two operations share an ID
    /// - [`AppError::Graph`] for the first operation whose plan fails
    pub fn build(self) -> Result<App, AppError> {
        self.config.validate()?;
        let routes = plan_routes(&self.registry, self.operations)?;

        tracing::info!(
            service.name = %self.config.service.name,
            operations = routes.len(),
            dependencies = self.registry.len(),
            "Application assembled"
        );

        Ok(App {
            config: self.config,
            registry: self.registry,
            routes,
            trust_request_id: self.trust_request_id,
        })
    }
}

fn plan_routes(
    registry: &DependencyRegistry,
    operations: impl IntoIterator<Item = PathOperation>,
) -> Result<IndexMap<String, Route>, AppError> {
    let builder = GraphBuilder::new(registry);
    let mut routes = IndexMap::new();

    for operation in operations {
        if routes.contains_key(operation.id()) {
            return Err(AppError::DuplicateOperation(operation.id().to_string()));
        }
        let plan = builder.build(operation.handler()).map_err(|source| AppError::Graph {
            operation: operation.id().to_string(),
            source,
        })?;
        tracing::debug!(
            operation_id = operation.id(),
            http.method = %operation.http_method(),
            http.path = operation.path_template(),
            nodes = plan.nodes().len(),
            "Operation registered"
        );
        routes.insert(
            operation.id().to_string(),
            Route {
                operation,
                plan: Arc::new(plan),
            },
        );
    }

    Ok(routes)
}

impl App {
    /// Starts a builder.
    #[must_use]
    pub fn builder() -> AppBuilder {
        AppBuilder::default()
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &HeronConfig {
        &self.config
    }

    /// Looks up an operation by ID.
    #[must_use]
    pub fn operation(&self, operation_id: &str) -> Option<&PathOperation> {
        self.routes.get(operation_id).map(|r| &r.operation)
    }

    /// The resolution plan of an operation.
    #[must_use]
    pub fn plan(&self, operation_id: &str) -> Option<&ResolutionPlan> {
        self.routes.get(operation_id).map(|r| r.plan.as_ref())
    }

    /// Operation IDs in registration order.
    pub fn operation_ids(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    /// Replaces the dependency registered as `name` with `replacement` in
    /// every plan.
    ///
    /// All plans are rebuilt. If any of them fails (for example because the
    /// replacement closes a cycle) the app is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Graph`] for the first plan that fails to build.
    pub fn override_dependency(
        &mut self,
        name: impl Into<String>,
        replacement: &Arc<Dependency>,
    ) -> Result<(), AppError> {
        let name = name.into();
        let mut registry = self.registry.clone();
        registry.override_with(name.clone(), replacement);
        self.replan(registry)?;
        tracing::debug!(dependency = %name, replacement = replacement.name(), "Dependency overridden");
        Ok(())
    }

    /// Removes every override and rebuilds the plans.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Graph`] if a plan fails to build.
    pub fn clear_overrides(&mut self) -> Result<(), AppError> {
        if !self.registry.has_overrides() {
            return Ok(());
        }
        let mut registry = self.registry.clone();
        registry.clear_overrides();
        self.replan(registry)
    }

    fn replan(&mut self, registry: DependencyRegistry) -> Result<(), AppError> {
        let operations: Vec<PathOperation> = self.routes.values().map(|r| r.operation.clone()).collect();
        self.routes = plan_routes(&registry, operations)?;
        self.registry = registry;
        Ok(())
    }

    /// Serves an `http::Request` for the operation `operation_id`.
    pub async fn handle_request(
        &self,
        operation_id: &str,
        request: Request<Bytes>,
        path_params: Params,
    ) -> Response<Bytes> {
        self.handle(operation_id, RequestContext::from_request(request, path_params))
            .await
    }

    /// Runs the pipeline for one request with a fresh dependency cache.
    pub async fn handle(&self, operation_id: &str, ctx: RequestContext) -> Response<Bytes> {
        self.handle_with_cache(operation_id, ctx, &DependencyCache::new())
            .await
    }

    /// Runs the pipeline for one request, sharing `cache` with other
    /// operations invoked for the same request.
    ///
    /// Never fails: every outcome is a response. Unknown operation IDs get
    /// 404.
    pub async fn handle_with_cache(
        &self,
        operation_id: &str,
        ctx: RequestContext,
        cache: &DependencyCache,
    ) -> Response<Bytes> {
        let started = Instant::now();
        let request_id = RequestId::assign(ctx.headers(), self.trust_request_id);
        log_request_start!(request_id, ctx.method(), ctx.uri().path(), operation_id);

        let mut response = match self.routes.get(operation_id) {
            Some(route) => {
                let span = tracing::info_span!(
                    "request",
                    request_id = %request_id,
                    operation_id = %operation_id,
                    service.name = %self.config.service.name,
                );
                self.dispatch(route, &ctx, cache, request_id)
                    .instrument(span)
                    .await
            }
            None => {
                tracing::warn!(request_id = %request_id, operation_id, "Unknown operation");
                http_error_response(&HttpError::not_found("Not Found"))
            }
        };

        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        log_request_complete!(request_id, response.status().as_u16(), elapsed_ms);
        response
    }

    async fn dispatch(
        &self,
        route: &Route,
        ctx: &RequestContext,
        cache: &DependencyCache,
        request_id: RequestId,
    ) -> Response<Bytes> {
        let limit = self.config.pipeline.max_body_bytes;
        let size = ctx.body().len();
        if size > limit {
            tracing::warn!(limit, size, "Request body too large");
            return http_error_response(&HttpError::payload_too_large(limit, size));
        }

        let scope = RequestScope::new();
        let run = self.run(route, ctx, cache, &scope);
        let outcome = match self.config.pipeline.request_timeout() {
            Some(timeout) => tokio::time::timeout(timeout, run)
                .await
                .unwrap_or_else(|_| Err(ResolveError::Fault(Fault::Timeout(timeout)))),
            None => run.await,
        };

        match outcome {
            Ok(response) => {
                scope.close(ScopeOutcome::Completed).await;
                response
            }
            Err(error) => {
                scope.close(ScopeOutcome::Failed).await;
                self.error_response(&error, request_id)
            }
        }
    }

    async fn run(
        &self,
        route: &Route,
        ctx: &RequestContext,
        cache: &DependencyCache,
        scope: &RequestScope,
    ) -> Result<Response<Bytes>, ResolveError> {
        let options = ResolveOptions {
            convert_underscores: self.config.pipeline.convert_underscores,
        };
        let args = resolve(&route.plan, ctx, cache, scope, options).await?;

        let handler = route.operation.handler();
        let value = handler
            .call(args, scope.clone())
            .await
            .map_err(|e| match classify(handler.name(), e) {
                CallError::Http(err) => {
                    tracing::warn!(status = err.status().as_u16(), detail = err.detail(), "Handler rejected request");
                    ResolveError::Domain(err)
                }
                CallError::Fault(fault) => ResolveError::Fault(fault),
            })?;

        let payload = into_payload(&value).map_err(ResolveError::Fault)?;
        route
            .operation
            .packager()
            .package(&payload)
            .map_err(ResolveError::Fault)
    }

    fn error_response(&self, error: &ResolveError, request_id: RequestId) -> Response<Bytes> {
        match error {
            ResolveError::Invalid { report, domain } => {
                tracing::debug!(
                    errors = report.len(),
                    domain_errors = domain.len(),
                    "Request failed validation"
                );
                validation_error_response(report)
            }
            ResolveError::Domain(err) => http_error_response(err),
            ResolveError::Fault(fault) => {
                log_request_error!(request_id, fault.error_code(), fault);
                fault_response(fault, self.config.pipeline.expose_fault_detail)
            }
        }
    }
}
