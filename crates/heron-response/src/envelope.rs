//! Error response envelopes.
//!
//! | Failure | Status | Body |
//! |---------|--------|------|
//! | [`ErrorReport`] | 422 | `{"detail": [{"loc", "msg", "type"}, ...]}` |
//! | [`HttpError`] | its own | `{"detail": "..."}` plus its headers |
//! | [`Fault`] | 500 | `{"detail": "Internal Server Error"}` |

use crate::status::body_allowed_for_status;
use bytes::Bytes;
use heron_core::{ErrorReport, Fault, HttpError};
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Response, StatusCode};
use serde_json::{json, Value};

const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// Builds a JSON response, dropping the body for bodiless statuses.
#[must_use]
pub fn json_response(status: StatusCode, body: &Value) -> Response<Bytes> {
    if !body_allowed_for_status(status) {
        return empty_response(status);
    }
    let mut response = Response::new(Bytes::from(body.to_string()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Builds a response with no body.
#[must_use]
pub fn empty_response(status: StatusCode) -> Response<Bytes> {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status;
    response
}

/// 422 with every field problem.
///
/// ```
/// use heron_core::validation::loc;
/// use heron_core::{ErrorReport, ValidationError};
/// use heron_response::validation_error_response;
///
/// let mut report = ErrorReport::new();
/// report.push(ValidationError::missing(loc(["query", "limit"])));
///
/// let response = validation_error_response(&report);
/// assert_eq!(response.status(), 422);
/// assert_eq!(
///     response.body().as_ref(),
///     br#"{"detail":[{"loc":["query","limit"],"msg":"field required","type":"missing"}]}"#
/// );
/// ```
#[must_use]
pub fn validation_error_response(report: &ErrorReport) -> Response<Bytes> {
    json_response(StatusCode::UNPROCESSABLE_ENTITY, &report.to_json())
}

/// The error's status, detail, and headers.
#[must_use]
pub fn http_error_response(error: &HttpError) -> Response<Bytes> {
    let mut response = json_response(error.status(), &error.to_json());
    for (name, value) in error.headers() {
        response.headers_mut().append(name, value.clone());
    }
    response
}

/// 500. The fault itself is only described to the client when
/// `expose_detail` is set.
#[must_use]
pub fn fault_response(fault: &Fault, expose_detail: bool) -> Response<Bytes> {
    let detail = if expose_detail {
        json!({ "detail": INTERNAL_SERVER_ERROR, "error": fault.to_string(), "code": fault.error_code() })
    } else {
        json!({ "detail": INTERNAL_SERVER_ERROR })
    };
    json_response(fault.status_code(), &detail)
}
