//! # Heron Response
//!
//! Turns handler return values and pipeline failures into HTTP responses.
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`Payload`] / [`jsonable`] | Structural encoding with canonical forms for decimals, dates, UUIDs |
//! | [`EncodeSelf`] | Custom encoders, tried before anything else |
//! | [`JsonableOptions`] | `include`, `exclude`, and `exclude_none` filtering |
//! | [`ResponsePackager`] | Encode, validate against a response schema, filter, build |
//! | [`body_allowed_for_status`] | Which statuses carry a body |
//! | [`validation_error_response`], [`http_error_response`], [`fault_response`] | Error envelopes |
//!
//! ## Example
//!
//! ```rust
//! use heron_response::{Payload, ResponsePackager};
//! use http::StatusCode;
//!
//! let response = ResponsePackager::new()
//!     .package(&Payload::map([("status", "ok")]))
//!     .unwrap();
//!
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(response.headers()["content-type"], "application/json");
//! assert_eq!(response.body().as_ref(), br#"{"status":"ok"}"#);
//! ```

#![doc(html_root_url = "https://docs.rs/heron-response/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod envelope;
mod jsonable;
mod packager;
mod status;

pub use envelope::{empty_response, fault_response, http_error_response, json_response, validation_error_response};
pub use jsonable::{jsonable, jsonable_with, Decimal, EncodeError, EncodeSelf, JsonableOptions, ParseDecimalError, Payload};
pub use packager::ResponsePackager;
pub use status::body_allowed_for_status;
