//! Declarative parameter metadata.
//!
//! A [`ParameterSpec`] says where one input comes from, how it is validated,
//! and what happens when it is absent. Specs are built once at declaration
//! time and are immutable afterwards.
//!
//! ```
//! use heron_core::{FieldSchema, Source};
//! use heron_deps::ParameterSpec;
//! use serde_json::json;
//!
//! let limit = ParameterSpec::query("limit", FieldSchema::integer().gt(0.0));
//! assert!(limit.is_required());
//!
//! let page = ParameterSpec::query("page", FieldSchema::integer()).default_value(json!(1));
//! assert!(!page.is_required());
//!
//! let token = ParameterSpec::header("x_token", FieldSchema::string()).alias("X-Api-Token");
//! assert_eq!(token.key(), "X-Api-Token");
//! assert_eq!(token.source(), Source::Header);
//! ```

use crate::dependency::DependencyRef;
use heron_core::{FieldSchema, Schema, Source};
use serde_json::Value;
use std::sync::Arc;

/// One declared input of a dependency or handler.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    name: String,
    source: Source,
    required: bool,
    default: Option<Value>,
    schema: Arc<dyn Schema>,
    alias: Option<String>,
    embed: bool,
    convert_underscores: Option<bool>,
    dependency: Option<DependencyRef>,
}

impl ParameterSpec {
    fn with_source(name: impl Into<String>, source: Source, schema: Arc<dyn Schema>) -> Self {
        Self {
            name: name.into(),
            source,
            required: true,
            default: None,
            schema,
            alias: None,
            embed: false,
            convert_underscores: None,
            dependency: None,
        }
    }

    /// A parameter with an arbitrary [`Schema`] implementation.
    #[must_use]
    pub fn new(name: impl Into<String>, source: Source, schema: impl Schema + 'static) -> Self {
        Self::with_source(name, source, Arc::new(schema))
    }

    /// A path parameter. Path parameters are always required.
    #[must_use]
    pub fn path(name: impl Into<String>, schema: FieldSchema) -> Self {
        Self::new(name, Source::Path, schema)
    }

    /// A query string parameter.
    #[must_use]
    pub fn query(name: impl Into<String>, schema: FieldSchema) -> Self {
        Self::new(name, Source::Query, schema)
    }

    /// A header parameter.
    #[must_use]
    pub fn header(name: impl Into<String>, schema: FieldSchema) -> Self {
        Self::new(name, Source::Header, schema)
    }

    /// A cookie parameter.
    #[must_use]
    pub fn cookie(name: impl Into<String>, schema: FieldSchema) -> Self {
        Self::new(name, Source::Cookie, schema)
    }

    /// A body parameter.
    ///
    /// When it is the only body parameter of a route, the whole body is
    /// validated against `schema`. Otherwise the body must be an object and
    /// this parameter reads the field with its name.
    #[must_use]
    pub fn body(name: impl Into<String>, schema: FieldSchema) -> Self {
        Self::new(name, Source::Body, schema)
    }

    /// A parameter whose value is the result of another dependency.
    #[must_use]
    pub fn depends(name: impl Into<String>, dependency: DependencyRef) -> Self {
        let mut spec = Self::new(name, Source::Dependency, FieldSchema::any());
        spec.dependency = Some(dependency);
        spec
    }

    /// Makes the parameter optional; absent values resolve to `null`.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Makes the parameter optional with a fallback value. Defaults are
    /// used as-is and not validated.
    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.required = false;
        self.default = Some(value);
        self
    }

    /// Looks the value up under `alias` instead of the parameter name.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Forces a lone body parameter to be read from a field named after it.
    #[must_use]
    pub fn embed(mut self) -> Self {
        self.embed = true;
        self
    }

    /// Overrides the `_` to `-` conversion for header lookups.
    #[must_use]
    pub fn convert_underscores(mut self, convert: bool) -> Self {
        self.convert_underscores = Some(convert);
        self
    }

    /// The name the resolved value is bound to.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The lookup key: the alias if set, otherwise the name.
    #[must_use]
    pub fn key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Whether the lookup key was set explicitly with [`alias`](Self::alias).
    #[must_use]
    pub fn has_alias(&self) -> bool {
        self.alias.is_some()
    }

    /// Where the value comes from.
    #[must_use]
    pub fn source(&self) -> Source {
        self.source
    }

    /// Whether an absent value is an error.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The fallback value, if declared.
    #[must_use]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// The schema the raw value is validated against.
    #[must_use]
    pub fn schema(&self) -> &dyn Schema {
        self.schema.as_ref()
    }

    /// Whether this body parameter is always read from a named field.
    #[must_use]
    pub fn is_embedded(&self) -> bool {
        self.embed
    }

    /// The per-parameter underscore conversion setting, if any.
    #[must_use]
    pub fn underscore_conversion(&self) -> Option<bool> {
        self.convert_underscores
    }

    /// The referenced dependency, for [`Source::Dependency`] parameters.
    #[must_use]
    pub fn dependency(&self) -> Option<&DependencyRef> {
        self.dependency.as_ref()
    }
}
