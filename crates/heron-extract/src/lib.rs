//! # Heron Extract
//!
//! Raw value extraction from HTTP request sources.
//!
//! Extraction is deliberately untyped: every lookup yields an optional
//! `serde_json::Value` (a string, or an array of strings for repeated
//! values) that the schema engine coerces afterwards.
//!
//! | Source | Type | Lookup |
//! |--------|------|--------|
//! | Path | [`Params`] | exact name |
//! | Query | [`QueryValues`] | exact name, repeated keys collected |
//! | Header | `http::HeaderMap` | case-insensitive, `_` → `-` by default |
//! | Cookie | [`Cookies`] | exact name |
//! | Body | [`ParsedBody`] | JSON or URL-encoded form, by Content-Type |
//!
//! ## Example
//!
//! ```rust
//! use heron_core::Source;
//! use heron_extract::RequestContext;
//! use serde_json::json;
//!
//! let ctx = RequestContext::builder()
//!     .uri("/items?tag=a&tag=b")
//!     .header("x-request-id", "r-1")
//!     .build();
//!
//! assert_eq!(ctx.lookup(Source::Query, "tag", true, true).unwrap(), Some(json!(["a", "b"])));
//! assert_eq!(ctx.lookup(Source::Header, "x_request_id", false, true).unwrap(), Some(json!("r-1")));
//! ```

#![doc(html_root_url = "https://docs.rs/heron-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod context;
mod cookie;
mod error;
mod header;
mod params;
mod query;

pub use body::ParsedBody;
pub use context::{RequestContext, RequestContextBuilder};
pub use cookie::Cookies;
pub use error::ExtractError;
pub use header::{header_name, header_values};
pub use params::Params;
pub use query::QueryValues;
