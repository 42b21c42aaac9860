//! Request-time error types.
//!
//! Two kinds of failure can escape user code during a request:
//!
//! | Type | Meaning | Response |
//! |---|---|---|
//! | [`HttpError`] | Client-facing failure raised on purpose | its own status, `{"detail": string}` |
//! | [`Fault`] | Anything unexpected | 500, generic body |
//!
//! User callables return [`anyhow::Result`]; [`classify`] sorts the error
//! into one of the two buckets by downcasting.

use crate::validation::ValidationError;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// A structured, client-facing error with a status code.
///
/// Return it from a dependency or handler to stop that branch and respond
/// with the given status.
///
/// # Example
///
/// ```
/// use heron_core::HttpError;
/// use http::StatusCode;
///
/// fn authenticate(token: Option<&str>) -> anyhow::Result<String> {
///     let token = token.ok_or_else(|| {
///         HttpError::unauthorized("Not authenticated").with_header("www-authenticate", "Bearer")
///     })?;
///     Ok(token.to_string())
/// }
///
/// let err = authenticate(None).unwrap_err();
/// let http = err.downcast_ref::<HttpError>().unwrap();
/// assert_eq!(http.status(), StatusCode::UNAUTHORIZED);
/// ```
#[derive(Debug, Clone, Error)]
#[error("{status}: {detail}")]
pub struct HttpError {
    status: StatusCode,
    detail: String,
    headers: HeaderMap,
}

impl HttpError {
    /// Creates an error with an explicit status.
    #[must_use]
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
            headers: HeaderMap::new(),
        }
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    /// 401 Unauthorized.
    #[must_use]
    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, detail)
    }

    /// 403 Forbidden.
    #[must_use]
    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, detail)
    }

    /// 404 Not Found.
    #[must_use]
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    /// 413 Payload Too Large.
    #[must_use]
    pub fn payload_too_large(limit: usize, actual: usize) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("request body of {actual} bytes exceeds the {limit} byte limit"),
        )
    }

    /// Adds a response header. Invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the detail message.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Returns the headers to attach to the response.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Renders the `{"detail": string}` body.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({ "detail": self.detail })
    }
}

/// An unrecoverable request-time failure.
///
/// Faults are never aggregated with validation errors. They abort the
/// pipeline and surface as a 500.
#[derive(Debug, Error)]
pub enum Fault {
    /// A dependency or handler returned an error that was not an [`HttpError`].
    #[error("unhandled error in '{origin}': {source}")]
    Unhandled {
        /// Name of the callable that failed.
        origin: String,
        /// The underlying error (never exposed to clients).
        #[source]
        source: anyhow::Error,
    },

    /// The handler's return value violated the declared response schema.
    #[error("response validation failed with {} error(s)", errors.len())]
    ResponseValidation {
        /// Field-level mismatches, rooted at `"response"`.
        errors: Vec<ValidationError>,
    },

    /// The return value could not be encoded.
    #[error("response encoding failed: {0}")]
    Encoding(String),

    /// The request did not finish within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl Fault {
    /// Wraps an opaque error raised by `origin`.
    #[must_use]
    pub fn unhandled(origin: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Unhandled {
            origin: origin.into(),
            source,
        }
    }

    /// All faults map to 500.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Returns a stable code for logs.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unhandled { .. } => "UNHANDLED_ERROR",
            Self::ResponseValidation { .. } => "RESPONSE_VALIDATION_FAILED",
            Self::Encoding(_) => "RESPONSE_ENCODING_FAILED",
            Self::Timeout(_) => "REQUEST_TIMEOUT",
        }
    }
}

/// The failure of a user callable, sorted by severity.
#[derive(Debug)]
pub enum CallError {
    /// A deliberate client-facing error.
    Http(HttpError),
    /// Anything else.
    Fault(Fault),
}

/// Sorts an error returned by the callable `origin` into [`CallError`].
///
/// An [`HttpError`] anywhere at the top of the chain is a domain error;
/// everything else becomes [`Fault::Unhandled`].
#[must_use]
pub fn classify(origin: &str, error: anyhow::Error) -> CallError {
    match error.downcast::<HttpError>() {
        Ok(http) => CallError::Http(http),
        Err(other) => CallError::Fault(Fault::unhandled(origin, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::loc;

    #[test]
    fn test_http_error_helpers() {
        assert_eq!(HttpError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(HttpError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(HttpError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            HttpError::payload_too_large(10, 20).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_http_error_headers_and_body() {
        let err = HttpError::unauthorized("Not authenticated")
            .with_header("WWW-Authenticate", "Bearer")
            .with_header("bad header", "ignored");

        assert_eq!(err.headers().len(), 1);
        assert_eq!(err.headers()["www-authenticate"], "Bearer");
        assert_eq!(err.to_json(), json!({"detail": "Not authenticated"}));
        assert_eq!(err.to_string(), "401 Unauthorized: Not authenticated");
    }

    #[test]
    fn test_classify_http_error() {
        let err: anyhow::Error = HttpError::not_found("item").into();
        match classify("get_item", err) {
            CallError::Http(http) => assert_eq!(http.detail(), "item"),
            CallError::Fault(f) => panic!("unexpected fault: {f}"),
        }
    }

    #[test]
    fn test_classify_fault() {
        let err = anyhow::anyhow!("connection refused");
        match classify("get_db", err) {
            CallError::Fault(fault) => {
                assert_eq!(fault.error_code(), "UNHANDLED_ERROR");
                assert!(fault.to_string().contains("get_db"));
                assert_eq!(fault.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            }
            CallError::Http(_) => panic!("expected fault"),
        }
    }

    #[test]
    fn test_response_validation_fault() {
        let fault = Fault::ResponseValidation {
            errors: vec![ValidationError::missing(loc(["response", "id"]))],
        };
        assert_eq!(fault.error_code(), "RESPONSE_VALIDATION_FAILED");
        assert_eq!(fault.to_string(), "response validation failed with 1 error(s)");
    }
}
