//! Path operation declarations.

use heron_deps::Dependency;
use heron_response::ResponsePackager;
use http::Method;
use std::sync::Arc;

/// A route handler with everything needed to serve it: the handler
/// dependency (whose parameters and sub-dependencies form the plan) and the
/// response packaging rules.
///
/// URL matching happens outside Heron; an operation is addressed by its ID.
///
/// # Example
///
/// ```
/// use heron::PathOperation;
/// use heron_deps::Dependency;
/// use heron_response::ResponsePackager;
/// use http::{Method, StatusCode};
///
/// let handler = Dependency::builder("delete_item").handler(|_| async { Ok(()) });
/// let op = PathOperation::new("delete_item", handler)
///     .method(Method::DELETE)
///     .path("/items/{item_id}")
///     .response(ResponsePackager::new().status(StatusCode::NO_CONTENT));
///
/// assert_eq!(op.id(), "delete_item");
/// assert_eq!(op.packager().status_code(), StatusCode::NO_CONTENT);
/// ```
#[derive(Debug, Clone)]
pub struct PathOperation {
    id: String,
    method: Method,
    path: String,
    handler: Arc<Dependency>,
    packager: ResponsePackager,
}

impl PathOperation {
    /// A `GET /` operation answering 200 without a response schema.
    #[must_use]
    pub fn new(id: impl Into<String>, handler: Arc<Dependency>) -> Self {
        Self {
            id: id.into(),
            method: Method::GET,
            path: "/".to_string(),
            handler,
            packager: ResponsePackager::new(),
        }
    }

    /// Sets the HTTP method. Informational; used in logs.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the path template. Informational; used in logs.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets status, response schema, and output filtering.
    #[must_use]
    pub fn response(mut self, packager: ResponsePackager) -> Self {
        self.packager = packager;
        self
    }

    /// The operation ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The declared method.
    #[must_use]
    pub fn http_method(&self) -> &Method {
        &self.method
    }

    /// The declared path template.
    #[must_use]
    pub fn path_template(&self) -> &str {
        &self.path
    }

    /// The handler dependency.
    #[must_use]
    pub fn handler(&self) -> &Arc<Dependency> {
        &self.handler
    }

    /// The response packaging rules.
    #[must_use]
    pub fn packager(&self) -> &ResponsePackager {
        &self.packager
    }
}
