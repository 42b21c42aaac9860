//! # Heron Core
//!
//! Foundational types shared by every stage of the Heron request pipeline.
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Schema`] / [`FieldSchema`] | Validate and coerce raw values |
//! | [`ValidationError`] / [`ErrorReport`] | Field-level failures, aggregated per request |
//! | [`HttpError`] | Client-facing domain error with status, detail, and headers |
//! | [`Fault`] | Unrecoverable request-time failure (500) |
//! | [`Source`] | Where a parameter is read from |

#![doc(html_root_url = "https://docs.rs/heron-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod schema;
mod source;
pub mod validation;

pub use error::{classify, CallError, Fault, HttpError};
pub use schema::{Coercion, FieldSchema, Schema};
pub use source::Source;
pub use validation::{ErrorReport, LocItem, Location, ValidationError};
