//! The per-request view of raw input.
//!
//! [`RequestContext`] holds everything a resolver reads from the incoming
//! request. The query string and cookies are decoded once at construction;
//! the body is decoded on demand by [`RequestContext::parsed_body`].

use crate::{header_name, header_values, Cookies, ExtractError, ParsedBody, Params, QueryValues};
use bytes::Bytes;
use heron_core::Source;
use http::{HeaderMap, Method, Uri};
use serde_json::Value;

/// Raw request data for one request.
///
/// # Example
///
/// ```rust
/// use heron_extract::{Params, RequestContext};
/// use http::{HeaderMap, Method, Uri};
/// use bytes::Bytes;
///
/// let mut params = Params::new();
/// params.push("id", "123");
///
/// let ctx = RequestContext::new(
///     Method::GET,
///     Uri::from_static("/users/123?verbose=true"),
///     HeaderMap::new(),
///     Bytes::new(),
///     params,
/// );
///
/// assert_eq!(ctx.method(), &Method::GET);
/// assert_eq!(ctx.path_params().get("id"), Some("123"));
/// assert_eq!(ctx.query().get("verbose"), Some("true"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_params: Params,
    query: QueryValues,
    cookies: Cookies,
}

impl RequestContext {
    /// Creates a new request context.
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes, path_params: Params) -> Self {
        let query = QueryValues::parse(uri.query().unwrap_or(""));
        let cookies = Cookies::from_headers(&headers);
        Self {
            method,
            uri,
            headers,
            body,
            path_params,
            query,
            cookies,
        }
    }

    /// Creates a context from an `http::Request` and the matched path params.
    #[must_use]
    pub fn from_request(request: http::Request<Bytes>, path_params: Params) -> Self {
        let (parts, body) = request.into_parts();
        Self::new(parts.method, parts.uri, parts.headers, body, path_params)
    }

    /// Starts a builder.
    #[must_use]
    pub fn builder() -> RequestContextBuilder {
        RequestContextBuilder::default()
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the raw request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the matched path parameters.
    #[must_use]
    pub fn path_params(&self) -> &Params {
        &self.path_params
    }

    /// Returns the decoded query string.
    #[must_use]
    pub fn query(&self) -> &QueryValues {
        &self.query
    }

    /// Returns the request cookies.
    #[must_use]
    pub fn cookies(&self) -> &Cookies {
        &self.cookies
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Decodes the body according to its Content-Type.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] if the body does not decode.
    pub fn parsed_body(&self) -> Result<ParsedBody, ExtractError> {
        ParsedBody::decode(self.content_type(), &self.body)
    }

    /// Looks up the raw value of a non-body parameter.
    ///
    /// `key` is the parameter's alias or name. With `many` set, every
    /// occurrence is collected into an array; otherwise the last one wins.
    /// Returns `Ok(None)` when the value is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] if a header value is not valid UTF-8.
    pub fn lookup(
        &self,
        source: Source,
        key: &str,
        many: bool,
        convert_underscores: bool,
    ) -> Result<Option<Value>, ExtractError> {
        let values: Vec<&str> = match source {
            Source::Path => self.path_params.get(key).into_iter().collect(),
            Source::Query => self.query.get_all(key),
            Source::Header => header_values(&self.headers, &header_name(key, convert_underscores))?,
            Source::Cookie => self.cookies.get(key).into_iter().collect(),
            Source::Body | Source::Dependency => Vec::new(),
        };
        Ok(to_raw(&values, many))
    }
}

fn to_raw(values: &[&str], many: bool) -> Option<Value> {
    if many {
        if values.is_empty() {
            return None;
        }
        return Some(Value::Array(
            values.iter().map(|v| Value::String((*v).to_string())).collect(),
        ));
    }
    values.last().map(|v| Value::String((*v).to_string()))
}

/// Builder for constructing a [`RequestContext`], mostly in tests.
#[derive(Debug, Default)]
pub struct RequestContextBuilder {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_params: Params,
}

impl RequestContextBuilder {
    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the URI. Unparseable URIs are ignored.
    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        if let Ok(uri) = uri.parse() {
            self.uri = uri;
        }
        self
    }

    /// Appends a header. Invalid names or values are ignored.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::from_bytes(name.as_bytes()),
            http::HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and the matching Content-Type.
    #[must_use]
    pub fn json(self, value: &Value) -> Self {
        self.header("content-type", "application/json")
            .body(value.to_string())
    }

    /// Adds a single path parameter.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Builds the request context.
    #[must_use]
    pub fn build(self) -> RequestContext {
        RequestContext::new(self.method, self.uri, self.headers, self.body, self.path_params)
    }
}
