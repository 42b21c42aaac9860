//! Per-request plan execution.
//!
//! [`resolve`] walks a [`ResolutionPlan`] in order. For every node it reads
//! and validates the declared parameters, then calls the dependency once all
//! of its inputs succeeded. Validation is exhaustive: a failing parameter or
//! dependency only stops the branch above it, so the caller receives every
//! field problem of the request at once.
//!
//! The handler (the plan's last node) is not called. Its arguments are
//! returned to the caller instead.

use crate::args::{ArgValue, Arguments};
use crate::cache::{Cached, DependencyCache};
use crate::param::ParameterSpec;
use crate::plan::{BodyMode, PlanNode, ResolutionPlan};
use crate::scope::RequestScope;
use heron_core::validation::loc;
use heron_core::{classify, CallError, Coercion, ErrorReport, Fault, HttpError, Location, Source, ValidationError};
use heron_extract::{ExtractError, ParsedBody, RequestContext};
use http::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Request-time settings for [`resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Default `_` to `-` conversion for header parameter names.
    pub convert_underscores: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            convert_underscores: true,
        }
    }
}

/// Why the handler's arguments could not be produced.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// At least one parameter was missing or invalid.
    ///
    /// Domain errors raised by other branches of the same request are kept
    /// alongside but are not what the client sees.
    #[error("request validation failed with {} error(s)", report.len())]
    Invalid {
        /// Every field problem, in plan order.
        report: ErrorReport,
        /// Domain errors raised by sibling branches.
        domain: Vec<HttpError>,
    },

    /// A dependency rejected the request and nothing else was wrong.
    #[error(transparent)]
    Domain(HttpError),

    /// A dependency failed unexpectedly; resolution was aborted.
    #[error(transparent)]
    Fault(Fault),
}

impl ResolveError {
    /// The HTTP status this outcome maps to.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Invalid { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Domain(err) => err.status(),
            Self::Fault(fault) => fault.status_code(),
        }
    }
}

enum BodyState {
    Unread,
    Parsed(ParsedBody),
    Unusable,
}

#[derive(Default)]
struct NodeErrors {
    fields: Vec<ValidationError>,
    domain: Option<HttpError>,
}

impl NodeErrors {
    fn reject(&mut self, error: HttpError) {
        if self.domain.is_none() {
            self.domain = Some(error);
        }
    }

    fn extract_failure(&mut self, error: ExtractError) {
        match error.into_report_entry() {
            Ok(field) => self.fields.push(field),
            Err(http) => self.reject(http),
        }
    }
}

struct Resolution<'a> {
    plan: &'a ResolutionPlan,
    ctx: &'a RequestContext,
    options: ResolveOptions,
    body: BodyState,
    report: ErrorReport,
    domain: Vec<HttpError>,
    results: Vec<Option<ArgValue>>,
}

/// Resolves every dependency of `plan` for one request.
///
/// Cacheable results are stored in `cache`, so passing the same cache to
/// several plans within one request shares their common dependencies.
/// Cleanup actions registered by dependencies land on `scope`; closing it is
/// the caller's job.
///
/// # Errors
///
/// - [`ResolveError::Invalid`] if any parameter failed validation
/// - [`ResolveError::Domain`] if a dependency raised an [`HttpError`] and no
///   parameter was invalid (the first one raised wins)
/// - [`ResolveError::Fault`] as soon as a dependency fails with any other error
///
/// # Example
///
/// ```
/// use heron_core::FieldSchema;
/// use heron_deps::{resolve, DependencyCache, DependencyRegistry, Dependency, GraphBuilder,
///     ParameterSpec, RequestScope, ResolveOptions};
/// use heron_extract::RequestContext;
///
/// # tokio_test::block_on(async {
/// let handler = Dependency::builder("list_items")
///     .param(ParameterSpec::query("limit", FieldSchema::integer()))
///     .handler(|_| async { Ok(()) });
/// let plan = GraphBuilder::new(&DependencyRegistry::new()).build(&handler).unwrap();
///
/// let ctx = RequestContext::builder().uri("/items?limit=5").build();
/// let args = resolve(&plan, &ctx, &DependencyCache::new(), &RequestScope::new(), ResolveOptions::default())
///     .await
///     .unwrap();
/// assert_eq!(args.value::<i64>("limit").unwrap(), 5);
/// # });
/// ```
pub async fn resolve(
    plan: &ResolutionPlan,
    ctx: &RequestContext,
    cache: &DependencyCache,
    scope: &RequestScope,
    options: ResolveOptions,
) -> Result<Arguments, ResolveError> {
    let mut run = Resolution {
        plan,
        ctx,
        options,
        body: BodyState::Unread,
        report: ErrorReport::new(),
        domain: Vec::new(),
        results: Vec::with_capacity(plan.nodes().len()),
    };
    let root = plan.root_index();
    let mut handler_args = None;

    for (index, node) in plan.nodes().iter().enumerate() {
        let name = node.dependency().name();

        if node.is_cacheable() {
            if let Some(hit) = cache.get(node.dependency().id()) {
                tracing::debug!(dependency = %name, node = index, hit = hit.is_value(), "Dependency cache hit");
                run.replay(hit);
                continue;
            }
        }

        let mut errors = NodeErrors::default();
        let args = run.collect_arguments(node, &mut errors);
        run.record(&errors);

        let Some(args) = args else {
            tracing::debug!(dependency = %name, node = index, "Dependency skipped after failed inputs");
            run.results.push(None);
            if node.is_cacheable() {
                cache.insert(node.dependency().id(), failure(errors));
            }
            continue;
        };

        if index == root {
            handler_args = Some(args);
            run.results.push(None);
            continue;
        }

        tracing::debug!(dependency = %name, node = index, style = ?node.dependency().style(), "Invoking dependency");
        match node.dependency().call(args, scope.clone()).await {
            Ok(value) => {
                if node.is_cacheable() {
                    cache.insert(node.dependency().id(), Cached::Value(value.clone()));
                }
                run.results.push(Some(value));
            }
            Err(error) => match classify(name, error) {
                CallError::Http(http) => {
                    tracing::warn!(
                        dependency = %name,
                        status = http.status().as_u16(),
                        detail = %http.detail(),
                        "Dependency rejected request"
                    );
                    run.domain.push(http.clone());
                    run.results.push(None);
                    if node.is_cacheable() {
                        cache.insert(
                            node.dependency().id(),
                            Cached::Failed {
                                errors: Vec::new(),
                                domain: Some(http),
                            },
                        );
                    }
                }
                CallError::Fault(fault) => {
                    tracing::error!(
                        dependency = %name,
                        error_code = fault.error_code(),
                        error = %fault,
                        "Dependency failed"
                    );
                    return Err(ResolveError::Fault(fault));
                }
            },
        }
    }

    run.finish(handler_args)
}

fn failure(errors: NodeErrors) -> Cached {
    Cached::Failed {
        errors: errors.fields,
        domain: errors.domain,
    }
}

impl Resolution<'_> {
    fn replay(&mut self, hit: Cached) {
        match hit {
            Cached::Value(value) => self.results.push(Some(value)),
            Cached::Failed { errors, domain } => {
                self.report.extend(errors);
                self.domain.extend(domain);
                self.results.push(None);
            }
        }
    }

    fn record(&mut self, errors: &NodeErrors) {
        self.report.extend(errors.fields.iter().cloned());
        if let Some(domain) = &errors.domain {
            self.domain.push(domain.clone());
        }
    }

    fn finish(self, handler_args: Option<Arguments>) -> Result<Arguments, ResolveError> {
        if !self.report.is_empty() {
            tracing::debug!(errors = self.report.len(), "Request parameters failed validation");
            return Err(ResolveError::Invalid {
                report: self.report,
                domain: self.domain,
            });
        }
        if let Some(first) = self.domain.into_iter().next() {
            return Err(ResolveError::Domain(first));
        }
        handler_args.ok_or_else(|| {
            ResolveError::Fault(Fault::unhandled(
                self.plan.root().dependency().name(),
                anyhow::anyhow!("handler inputs failed without reporting an error"),
            ))
        })
    }

    /// Reads every parameter of `node`. Returns `None` if any of them, or
    /// any input or guard, failed.
    fn collect_arguments(&mut self, node: &PlanNode, errors: &mut NodeErrors) -> Option<Arguments> {
        let mut args = Arguments::new();
        let mut complete = true;

        for (spec, input) in node.bindings() {
            let value = match input {
                Some(child) => self.results[child].clone(),
                None => self.extract(spec, errors).map(ArgValue::Json),
            };
            match value {
                Some(value) => args.insert(spec.name(), value),
                None => complete = false,
            }
        }
        complete &= node.guards.iter().all(|&guard| self.results[guard].is_some());

        complete.then_some(args)
    }

    fn extract(&mut self, spec: &ParameterSpec, errors: &mut NodeErrors) -> Option<Value> {
        let (raw, location, coercion) = if spec.source() == Source::Body {
            self.body_value(spec, errors)?
        } else {
            // An alias names the header exactly.
            let convert = !spec.has_alias()
                && spec
                    .underscore_conversion()
                    .unwrap_or(self.options.convert_underscores);
            let raw = match self.ctx.lookup(spec.source(), spec.key(), spec.schema().accepts_many(), convert) {
                Ok(raw) => raw,
                Err(error) => {
                    errors.extract_failure(error);
                    return None;
                }
            };
            let key = match spec.source() {
                Source::Header if convert => spec.key().replace('_', "-"),
                _ => spec.key().to_string(),
            };
            (raw, loc([spec.source().as_str(), key.as_str()]), Coercion::Lax)
        };

        let Some(raw) = raw else {
            if let Some(default) = spec.default() {
                return Some(default.clone());
            }
            if !spec.is_required() {
                return Some(Value::Null);
            }
            errors.fields.push(ValidationError::missing(location));
            return None;
        };

        match spec.schema().validate(&raw, coercion) {
            Ok(value) => Some(value),
            Err(found) => {
                errors
                    .fields
                    .extend(found.into_iter().map(|e| e.prefixed(&location)));
                None
            }
        }
    }

    fn body_value(
        &mut self,
        spec: &ParameterSpec,
        errors: &mut NodeErrors,
    ) -> Option<(Option<Value>, Location, Coercion)> {
        let mode = self.plan.body_mode();
        let body = self.body(errors)?;
        if mode != BodyMode::Single && matches!(body, ParsedBody::Json(value) if !value.is_object()) {
            errors.fields.push(ValidationError::type_error(loc(["body"]), "object"));
            self.body = BodyState::Unusable;
            return None;
        }
        let coercion = if body.is_form() { Coercion::Lax } else { Coercion::Strict };
        let (raw, location) = match mode {
            BodyMode::Single => (body.to_value(), loc(["body"])),
            BodyMode::Embedded | BodyMode::None => (
                body.field(spec.key(), spec.schema().accepts_many()),
                loc(["body", spec.key()]),
            ),
        };
        Some((raw, location, coercion))
    }

    /// Decodes the body on first use. A body that cannot be decoded is
    /// reported once, against the first parameter that reads it.
    fn body(&mut self, errors: &mut NodeErrors) -> Option<&ParsedBody> {
        if matches!(self.body, BodyState::Unread) {
            self.body = match self.ctx.parsed_body() {
                Ok(parsed) => BodyState::Parsed(parsed),
                Err(error) => {
                    errors.extract_failure(error);
                    BodyState::Unusable
                }
            };
        }
        match &self.body {
            BodyState::Parsed(parsed) => Some(parsed),
            BodyState::Unread | BodyState::Unusable => None,
        }
    }
}
