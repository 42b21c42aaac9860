//! Field-level validation errors and the aggregated error report.
//!
//! Every problem found while extracting and validating a request is recorded
//! as a [`ValidationError`] with a location path. The location starts with
//! the request source (`"query"`, `"body"`, ...) followed by field names and
//! array indices, e.g. `["body", "items", 2, "price"]`.
//!
//! All errors of one request are collected into an [`ErrorReport`], which
//! renders as the standard `{"detail": [...]}` envelope.

use serde::ser::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::fmt;

/// Well-known error kinds reported in the `type` field.
pub mod kinds {
    /// A required value was not supplied.
    pub const MISSING: &str = "missing";
    /// The value has the wrong type.
    pub const TYPE_ERROR: &str = "type_error";
    /// The body could not be decoded as JSON.
    pub const JSON_INVALID: &str = "json_invalid";
    /// Number not greater than the exclusive minimum.
    pub const NOT_GT: &str = "value_error.number.not_gt";
    /// Number not greater than or equal to the minimum.
    pub const NOT_GE: &str = "value_error.number.not_ge";
    /// Number not less than the exclusive maximum.
    pub const NOT_LT: &str = "value_error.number.not_lt";
    /// Number not less than or equal to the maximum.
    pub const NOT_LE: &str = "value_error.number.not_le";
    /// String shorter than the minimum length.
    pub const MIN_LENGTH: &str = "value_error.any_str.min_length";
    /// String longer than the maximum length.
    pub const MAX_LENGTH: &str = "value_error.any_str.max_length";
    /// String does not match the declared pattern.
    pub const PATTERN: &str = "value_error.str.regex";
    /// Sequence has fewer items than allowed.
    pub const MIN_ITEMS: &str = "value_error.list.min_items";
    /// Sequence has more items than allowed.
    pub const MAX_ITEMS: &str = "value_error.list.max_items";
    /// Value is not one of the permitted choices.
    pub const ENUM: &str = "value_error.enum";
}

/// One segment of an error location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocItem {
    /// A source name or object key.
    Key(String),
    /// An array index.
    Index(usize),
}

impl Serialize for LocItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Key(key) => serializer.serialize_str(key),
            Self::Index(idx) => serializer.serialize_u64(*idx as u64),
        }
    }
}

impl fmt::Display for LocItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(idx) => write!(f, "{idx}"),
        }
    }
}

impl From<&str> for LocItem {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for LocItem {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for LocItem {
    fn from(idx: usize) -> Self {
        Self::Index(idx)
    }
}

/// A location path such as `["query", "limit"]`.
pub type Location = Vec<LocItem>;

/// Builds a location from anything convertible into [`LocItem`].
///
/// ```
/// use heron_core::validation::{loc, LocItem};
///
/// let path = loc(["body", "name"]);
/// assert_eq!(path, vec![LocItem::from("body"), LocItem::from("name")]);
/// ```
pub fn loc<I, T>(items: I) -> Location
where
    I: IntoIterator<Item = T>,
    T: Into<LocItem>,
{
    items.into_iter().map(Into::into).collect()
}

/// A single field-level validation failure.
///
/// # Example
///
/// ```
/// use heron_core::validation::{kinds, loc, ValidationError};
///
/// let err = ValidationError::missing(loc(["query", "limit"]));
/// assert_eq!(err.kind(), kinds::MISSING);
/// assert_eq!(err.to_string(), "query.limit: field required");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    loc: Location,
    msg: String,
    kind: String,
    ctx: Option<Map<String, Value>>,
}

impl ValidationError {
    /// Creates a validation error.
    #[must_use]
    pub fn new(loc: Location, msg: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            loc,
            msg: msg.into(),
            kind: kind.into(),
            ctx: None,
        }
    }

    /// A required value was absent.
    #[must_use]
    pub fn missing(loc: Location) -> Self {
        Self::new(loc, "field required", kinds::MISSING)
    }

    /// A value had the wrong type; `expected` names the expected type.
    #[must_use]
    pub fn type_error(loc: Location, expected: &str) -> Self {
        Self::new(loc, format!("value is not a valid {expected}"), kinds::TYPE_ERROR)
            .with_ctx("expected_type", expected)
    }

    /// The body was not decodable JSON.
    #[must_use]
    pub fn json_invalid(loc: Location, detail: impl fmt::Display) -> Self {
        Self::new(loc, format!("invalid JSON: {detail}"), kinds::JSON_INVALID)
    }

    /// Attaches a context entry, e.g. the limit that was violated.
    #[must_use]
    pub fn with_ctx(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.ctx
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }

    /// Returns a copy of this error with `prefix` prepended to its location.
    #[must_use]
    pub fn prefixed(mut self, prefix: &[LocItem]) -> Self {
        let mut loc = prefix.to_vec();
        loc.append(&mut self.loc);
        self.loc = loc;
        self
    }

    /// Returns the location path.
    #[must_use]
    pub fn loc(&self) -> &[LocItem] {
        &self.loc
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn msg(&self) -> &str {
        &self.msg
    }

    /// Returns the machine-readable error kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the context object, if any.
    #[must_use]
    pub fn ctx(&self) -> Option<&Map<String, Value>> {
        self.ctx.as_ref()
    }

    /// Renders this error as a `{"loc", "msg", "type"}` object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut obj = json!({
            "loc": self.loc,
            "msg": self.msg,
            "type": self.kind,
        });
        if let (Some(ctx), Some(map)) = (&self.ctx, obj.as_object_mut()) {
            map.insert("ctx".to_string(), Value::Object(ctx.clone()));
        }
        obj
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: Vec<String> = self.loc.iter().map(ToString::to_string).collect();
        write!(f, "{}: {}", path.join("."), self.msg)
    }
}

impl std::error::Error for ValidationError {}

/// Aggregated validation errors for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorReport {
    errors: Vec<ValidationError>,
}

impl ErrorReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one error.
    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Records several errors, keeping their order.
    pub fn extend(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        self.errors.extend(errors);
    }

    /// Returns true when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of recorded errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns the recorded errors in order.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Consumes the report, returning the errors.
    #[must_use]
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    /// Renders the `{"detail": [...]}` envelope.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "detail": self.errors.iter().map(ValidationError::to_json).collect::<Vec<_>>(),
        })
    }
}

impl From<Vec<ValidationError>> for ErrorReport {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.errors.len())?;
        for err in &self.errors {
            write!(f, "; {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorReport {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loc_serializes_keys_and_indices() {
        let path = loc::<_, LocItem>([
            LocItem::from("body"),
            LocItem::from("items"),
            LocItem::from(2),
        ]);
        assert_eq!(serde_json::to_value(&path).unwrap(), json!(["body", "items", 2]));
    }

    #[test]
    fn test_missing_error_json() {
        let err = ValidationError::missing(loc(["query", "limit"]));
        assert_eq!(
            err.to_json(),
            json!({"loc": ["query", "limit"], "msg": "field required", "type": "missing"})
        );
    }

    #[test]
    fn test_type_error_carries_ctx() {
        let err = ValidationError::type_error(loc(["body", "name"]), "string");
        assert_eq!(err.kind(), kinds::TYPE_ERROR);
        assert_eq!(err.msg(), "value is not a valid string");
        assert_eq!(err.to_json()["ctx"]["expected_type"], "string");
    }

    #[test]
    fn test_prefixed() {
        let err = ValidationError::missing(loc(["name"])).prefixed(&loc(["body"]));
        assert_eq!(err.loc(), loc(["body", "name"]).as_slice());
    }

    #[test]
    fn test_report_envelope_keeps_order() {
        let mut report = ErrorReport::new();
        report.push(ValidationError::missing(loc(["query", "limit"])));
        report.push(ValidationError::type_error(loc(["body", "name"]), "string"));

        let body = report.to_json();
        let detail = body["detail"].as_array().unwrap();
        assert_eq!(detail.len(), 2);
        assert_eq!(detail[0]["loc"], json!(["query", "limit"]));
        assert_eq!(detail[1]["type"], "type_error");
    }

    #[test]
    fn test_display() {
        let err = ValidationError::new(loc(["path", "id"]), "bad", "value_error");
        assert_eq!(err.to_string(), "path.id: bad");

        let report = ErrorReport::from(vec![err]);
        assert!(report.to_string().starts_with("1 validation error(s)"));
    }
}
