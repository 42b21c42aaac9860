//! # Heron
//!
//! **Request dependency resolution and validation for HTTP services.**
//!
//! A path operation declares where each of its inputs comes from: path,
//! query, header, cookie, body, or another dependency. Heron turns that
//! declaration into a resolution plan once, at startup, then for every
//! request it either hands the handler a fully validated set of arguments
//! or answers with a complete error report. The handler's return value is
//! validated and encoded on the way out.
//!
//! ```text
//! RequestContext → resolve (plan order, cached) → handler → ResponsePackager → Response
//!                      │                             │
//!                      └── 422 / domain error / 500 ─┘
//! ```
//!
//! | Crate | Purpose |
//! |-------|---------|
//! | [`core`] | Schemas, validation errors, `HttpError`, `Fault` |
//! | [`extract`] | Raw values from request sources |
//! | [`deps`] | Dependency declarations, plans, resolution |
//! | [`response`] | Encoding and response envelopes |
//! | [`telemetry`] | Logging setup |
//! | [`config`] | Layered configuration |
//!
//! ## Quick Start
//!
//! ```rust
//! use heron::prelude::*;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let get_db = Dependency::builder("get_db").sync_fn(|_| Ok(json!("pool")));
//!
//! let read_item = Dependency::builder("read_item")
//!     .param(ParameterSpec::path("item_id", FieldSchema::integer().gt(0.0)))
//!     .param(ParameterSpec::depends("db", DependencyRef::to(&get_db)))
//!     .handler(|args| async move {
//!         let id: i64 = args.value("item_id")?;
//!         Ok(json!({"id": id}))
//!     });
//!
//! let app = App::builder()
//!     .operation(PathOperation::new("read_item", read_item).path("/items/{item_id}"))
//!     .build()
//!     .expect("plans build");
//!
//! let ctx = RequestContext::builder().path_param("item_id", "0").build();
//! let response = app.handle("read_item", ctx).await;
//! assert_eq!(response.status(), 422);
//! # });
//! ```
//!
//! ## Startup
//!
//! ```rust,no_run
//! use heron::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("heron.toml")?
//!     .with_dotenv()?
//!     .with_env()
//!     .load()?;
//! heron::telemetry::init_logging(&config.logging_config())?;
//!
//! let app = heron::App::builder().config(config).build()?;
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/heron/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod error;
mod operation;
mod reply;
mod request_id;

pub use app::{App, AppBuilder};
pub use error::AppError;
pub use operation::PathOperation;
pub use reply::reply;
pub use request_id::{RequestId, REQUEST_ID_HEADER};

pub use heron_config as config;
pub use heron_core as core;
pub use heron_deps as deps;
pub use heron_extract as extract;
pub use heron_response as response;
pub use heron_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use heron::prelude::*;
///
/// let spec = ParameterSpec::query("q", FieldSchema::string()).optional();
/// assert_eq!(spec.source(), Source::Query);
/// ```
pub mod prelude {
    pub use crate::{reply, App, AppBuilder, AppError, PathOperation};

    pub use heron_config::{ConfigLoader, HeronConfig};
    pub use heron_core::{FieldSchema, HttpError, Schema, Source};
    pub use heron_deps::{
        ArgValue, Arguments, Dependency, DependencyCache, DependencyRef, ParameterSpec, RequestScope,
        ScopeOutcome,
    };
    pub use heron_extract::{Params, RequestContext};
    pub use heron_response::{Decimal, JsonableOptions, Payload, ResponsePackager};
}
