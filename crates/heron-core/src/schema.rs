//! The schema capability used to validate and coerce raw values.
//!
//! The pipeline only depends on the [`Schema`] trait. [`FieldSchema`] is the
//! built-in implementation: a small JSON-shaped type system with the usual
//! numeric, length, pattern, and item-count constraints.
//!
//! # Coercion
//!
//! Values extracted from the path, query string, headers, cookies, or a form
//! body are always strings, so they are validated in [`Coercion::Lax`] mode
//! where `"42"` is an acceptable integer. JSON bodies are validated in
//! [`Coercion::Strict`] mode where only native JSON types are accepted.
//!
//! # Example
//!
//! ```
//! use heron_core::schema::{Coercion, FieldSchema, Schema};
//! use serde_json::json;
//!
//! let schema = FieldSchema::object([
//!     ("name", FieldSchema::string().min_length(1).required()),
//!     ("age", FieldSchema::integer().ge(0.0)),
//! ]);
//!
//! assert!(schema.validate(&json!({"name": "Ada", "age": 36}), Coercion::Strict).is_ok());
//!
//! let errors = schema.validate(&json!({"age": -1}), Coercion::Strict).unwrap_err();
//! assert_eq!(errors.len(), 2);
//! ```

use crate::validation::{kinds, LocItem, Location, ValidationError};
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::fmt;

/// How strictly input types are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Only native JSON types are accepted.
    Strict,
    /// Strings may be parsed into numbers and booleans.
    Lax,
}

/// A validator that checks a raw value and returns its coerced form.
///
/// Errors carry locations relative to the validated value; callers prepend
/// the source location.
pub trait Schema: Send + Sync + fmt::Debug {
    /// Validates `value`, returning the coerced value or every failure found.
    fn validate(&self, value: &Value, coercion: Coercion) -> Result<Value, Vec<ValidationError>>;

    /// Whether this schema expects a sequence, so that repeated query keys or
    /// header values should be collected into an array.
    fn accepts_many(&self) -> bool {
        false
    }

    /// Short name of the expected type, used in messages.
    fn type_name(&self) -> &'static str {
        "value"
    }
}

#[derive(Debug, Clone, Default)]
struct Constraints {
    gt: Option<f64>,
    ge: Option<f64>,
    lt: Option<f64>,
    le: Option<f64>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<Regex>,
    min_items: Option<usize>,
    max_items: Option<usize>,
}

/// The shape of a [`FieldSchema`].
#[derive(Debug, Clone)]
pub enum SchemaKind {
    /// A string.
    String,
    /// A signed 64-bit integer.
    Integer,
    /// A finite floating point number.
    Number,
    /// A boolean.
    Boolean,
    /// A homogeneous array.
    Array(Box<FieldSchema>),
    /// An object with declared properties, in declaration order.
    Object(IndexMap<String, FieldSchema>),
    /// One of a fixed set of values.
    Enum(Vec<Value>),
    /// Anything at all.
    Any,
}

/// Built-in [`Schema`] implementation.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    kind: SchemaKind,
    required: bool,
    nullable: bool,
    default: Option<Value>,
    constraints: Constraints,
}

impl FieldSchema {
    fn of(kind: SchemaKind) -> Self {
        Self {
            kind,
            required: false,
            nullable: false,
            default: None,
            constraints: Constraints::default(),
        }
    }

    /// A string schema.
    #[must_use]
    pub fn string() -> Self {
        Self::of(SchemaKind::String)
    }

    /// An integer schema.
    #[must_use]
    pub fn integer() -> Self {
        Self::of(SchemaKind::Integer)
    }

    /// A floating point schema.
    #[must_use]
    pub fn number() -> Self {
        Self::of(SchemaKind::Number)
    }

    /// A boolean schema.
    #[must_use]
    pub fn boolean() -> Self {
        Self::of(SchemaKind::Boolean)
    }

    /// An array schema whose items match `items`.
    #[must_use]
    pub fn array(items: FieldSchema) -> Self {
        Self::of(SchemaKind::Array(Box::new(items)))
    }

    /// An object schema. Property order is preserved for error reporting.
    #[must_use]
    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, FieldSchema)>,
        K: Into<String>,
    {
        Self::of(SchemaKind::Object(
            properties
                .into_iter()
                .map(|(name, schema)| (name.into(), schema))
                .collect(),
        ))
    }

    /// A schema accepting only the given values.
    #[must_use]
    pub fn enumeration(values: impl IntoIterator<Item = Value>) -> Self {
        Self::of(SchemaKind::Enum(values.into_iter().collect()))
    }

    /// A schema accepting anything.
    #[must_use]
    pub fn any() -> Self {
        Self::of(SchemaKind::Any)
    }

    /// Marks this schema as required when used as an object property.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Value substituted when this property is absent from an object.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Accepts `null` in addition to the declared type.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Exclusive lower bound for numbers.
    #[must_use]
    pub fn gt(mut self, bound: f64) -> Self {
        self.constraints.gt = Some(bound);
        self
    }

    /// Inclusive lower bound for numbers.
    #[must_use]
    pub fn ge(mut self, bound: f64) -> Self {
        self.constraints.ge = Some(bound);
        self
    }

    /// Exclusive upper bound for numbers.
    #[must_use]
    pub fn lt(mut self, bound: f64) -> Self {
        self.constraints.lt = Some(bound);
        self
    }

    /// Inclusive upper bound for numbers.
    #[must_use]
    pub fn le(mut self, bound: f64) -> Self {
        self.constraints.le = Some(bound);
        self
    }

    /// Minimum string length, in characters.
    #[must_use]
    pub fn min_length(mut self, len: usize) -> Self {
        self.constraints.min_length = Some(len);
        self
    }

    /// Maximum string length, in characters.
    #[must_use]
    pub fn max_length(mut self, len: usize) -> Self {
        self.constraints.max_length = Some(len);
        self
    }

    /// Pattern that strings must match.
    #[must_use]
    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.constraints.pattern = Some(pattern);
        self
    }

    /// Minimum array length.
    #[must_use]
    pub fn min_items(mut self, count: usize) -> Self {
        self.constraints.min_items = Some(count);
        self
    }

    /// Maximum array length.
    #[must_use]
    pub fn max_items(mut self, count: usize) -> Self {
        self.constraints.max_items = Some(count);
        self
    }

    /// Returns whether this schema is marked as required.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the default value, if any.
    #[must_use]
    pub fn declared_default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns the schema's shape.
    #[must_use]
    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    fn check(
        &self,
        value: &Value,
        coercion: Coercion,
        path: &mut Location,
        errors: &mut Vec<ValidationError>,
    ) -> Option<Value> {
        if value.is_null() {
            if self.nullable || matches!(self.kind, SchemaKind::Any) {
                return Some(Value::Null);
            }
            errors.push(ValidationError::type_error(path.clone(), self.type_name()));
            return None;
        }

        let before = errors.len();
        let coerced = match &self.kind {
            SchemaKind::String => self.check_string(value, path, errors),
            SchemaKind::Integer => self.check_integer(value, coercion, path, errors),
            SchemaKind::Number => self.check_number(value, coercion, path, errors),
            SchemaKind::Boolean => check_boolean(value, coercion, path, errors),
            SchemaKind::Array(items) => self.check_array(items, value, coercion, path, errors),
            SchemaKind::Object(props) => check_object(props, value, coercion, path, errors),
            SchemaKind::Enum(choices) => check_enum(choices, value, coercion, path, errors),
            SchemaKind::Any => Some(value.clone()),
        };

        if errors.len() == before {
            coerced
        } else {
            None
        }
    }

    fn check_string(
        &self,
        value: &Value,
        path: &Location,
        errors: &mut Vec<ValidationError>,
    ) -> Option<Value> {
        let Some(s) = value.as_str() else {
            errors.push(ValidationError::type_error(path.clone(), "string"));
            return None;
        };

        let len = s.chars().count();
        if let Some(min) = self.constraints.min_length {
            if len < min {
                errors.push(
                    ValidationError::new(
                        path.clone(),
                        format!("ensure this value has at least {min} characters"),
                        kinds::MIN_LENGTH,
                    )
                    .with_ctx("limit_value", min),
                );
            }
        }
        if let Some(max) = self.constraints.max_length {
            if len > max {
                errors.push(
                    ValidationError::new(
                        path.clone(),
                        format!("ensure this value has at most {max} characters"),
                        kinds::MAX_LENGTH,
                    )
                    .with_ctx("limit_value", max),
                );
            }
        }
        if let Some(re) = &self.constraints.pattern {
            if !re.is_match(s) {
                errors.push(
                    ValidationError::new(
                        path.clone(),
                        format!("string does not match regex \"{}\"", re.as_str()),
                        kinds::PATTERN,
                    )
                    .with_ctx("pattern", re.as_str()),
                );
            }
        }
        Some(Value::String(s.to_string()))
    }

    fn check_integer(
        &self,
        value: &Value,
        coercion: Coercion,
        path: &Location,
        errors: &mut Vec<ValidationError>,
    ) -> Option<Value> {
        let parsed = match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                    .map(|f| f as i64)
            }),
            Value::String(s) if coercion == Coercion::Lax => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        let Some(n) = parsed else {
            errors.push(ValidationError::type_error(path.clone(), "integer"));
            return None;
        };
        self.check_bounds(n as f64, path, errors);
        Some(Value::from(n))
    }

    fn check_number(
        &self,
        value: &Value,
        coercion: Coercion,
        path: &Location,
        errors: &mut Vec<ValidationError>,
    ) -> Option<Value> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) if coercion == Coercion::Lax => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        let Some(n) = parsed.and_then(Number::from_f64) else {
            errors.push(ValidationError::type_error(path.clone(), "number"));
            return None;
        };
        self.check_bounds(n.as_f64().unwrap_or_default(), path, errors);
        Some(Value::Number(n))
    }

    fn check_bounds(&self, n: f64, path: &Location, errors: &mut Vec<ValidationError>) {
        let c = &self.constraints;
        let checks = [
            (c.gt, n > c.gt.unwrap_or_default(), kinds::NOT_GT, "greater than"),
            (c.ge, n >= c.ge.unwrap_or_default(), kinds::NOT_GE, "greater than or equal to"),
            (c.lt, n < c.lt.unwrap_or_default(), kinds::NOT_LT, "less than"),
            (c.le, n <= c.le.unwrap_or_default(), kinds::NOT_LE, "less than or equal to"),
        ];
        for (bound, ok, kind, phrase) in checks {
            if let Some(limit) = bound {
                if !ok {
                    errors.push(
                        ValidationError::new(
                            path.clone(),
                            format!("ensure this value is {phrase} {limit}"),
                            kind,
                        )
                        .with_ctx("limit_value", limit),
                    );
                }
            }
        }
    }

    fn check_array(
        &self,
        items: &FieldSchema,
        value: &Value,
        coercion: Coercion,
        path: &mut Location,
        errors: &mut Vec<ValidationError>,
    ) -> Option<Value> {
        let Some(values) = value.as_array() else {
            errors.push(ValidationError::type_error(path.clone(), "list"));
            return None;
        };

        let mut out = Vec::with_capacity(values.len());
        for (idx, item) in values.iter().enumerate() {
            path.push(LocItem::Index(idx));
            if let Some(v) = items.check(item, coercion, path, errors) {
                out.push(v);
            }
            path.pop();
        }

        if let Some(min) = self.constraints.min_items {
            if values.len() < min {
                errors.push(
                    ValidationError::new(
                        path.clone(),
                        format!("ensure this value has at least {min} items"),
                        kinds::MIN_ITEMS,
                    )
                    .with_ctx("limit_value", min),
                );
            }
        }
        if let Some(max) = self.constraints.max_items {
            if values.len() > max {
                errors.push(
                    ValidationError::new(
                        path.clone(),
                        format!("ensure this value has at most {max} items"),
                        kinds::MAX_ITEMS,
                    )
                    .with_ctx("limit_value", max),
                );
            }
        }
        Some(Value::Array(out))
    }
}

fn check_boolean(
    value: &Value,
    coercion: Coercion,
    path: &Location,
    errors: &mut Vec<ValidationError>,
) -> Option<Value> {
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if coercion == Coercion::Lax => parse_lax_bool(s),
        _ => None,
    };
    if parsed.is_none() {
        errors.push(ValidationError::type_error(path.clone(), "boolean"));
    }
    parsed.map(Value::Bool)
}

fn parse_lax_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn check_object(
    props: &IndexMap<String, FieldSchema>,
    value: &Value,
    coercion: Coercion,
    path: &mut Location,
    errors: &mut Vec<ValidationError>,
) -> Option<Value> {
    let Some(obj) = value.as_object() else {
        errors.push(ValidationError::type_error(path.clone(), "object"));
        return None;
    };

    let mut out = Map::new();
    for (name, schema) in props {
        path.push(LocItem::Key(name.clone()));
        match obj.get(name) {
            Some(raw) => {
                if let Some(v) = schema.check(raw, coercion, path, errors) {
                    out.insert(name.clone(), v);
                }
            }
            None if schema.required => errors.push(ValidationError::missing(path.clone())),
            None => {
                if let Some(default) = &schema.default {
                    out.insert(name.clone(), default.clone());
                }
            }
        }
        path.pop();
    }
    Some(Value::Object(out))
}

fn check_enum(
    choices: &[Value],
    value: &Value,
    coercion: Coercion,
    path: &Location,
    errors: &mut Vec<ValidationError>,
) -> Option<Value> {
    let found = choices.iter().find(|choice| {
        *choice == value
            || (coercion == Coercion::Lax
                && value.as_str().is_some_and(|s| match choice {
                    Value::String(c) => c == s,
                    other => other.to_string() == s,
                }))
    });
    if found.is_none() {
        let permitted: Vec<String> = choices.iter().map(ToString::to_string).collect();
        errors.push(
            ValidationError::new(
                path.clone(),
                format!("value is not a valid enumeration member; permitted: {}", permitted.join(", ")),
                kinds::ENUM,
            )
            .with_ctx("enum_values", Value::Array(choices.to_vec())),
        );
    }
    found.cloned()
}

impl Schema for FieldSchema {
    fn validate(&self, value: &Value, coercion: Coercion) -> Result<Value, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut path = Location::new();
        match self.check(value, coercion, &mut path, &mut errors) {
            Some(v) if errors.is_empty() => Ok(v),
            _ => Err(errors),
        }
    }

    fn accepts_many(&self) -> bool {
        matches!(self.kind, SchemaKind::Array(_))
    }

    fn type_name(&self) -> &'static str {
        match self.kind {
            SchemaKind::String => "string",
            SchemaKind::Integer => "integer",
            SchemaKind::Number => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Array(_) => "list",
            SchemaKind::Object(_) => "object",
            SchemaKind::Enum(_) => "enumeration member",
            SchemaKind::Any => "value",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::loc;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_string_rejects_number_in_strict_mode() {
        let errors = FieldSchema::string()
            .validate(&json!(123), Coercion::Strict)
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), kinds::TYPE_ERROR);
        assert!(errors[0].loc().is_empty());
    }

    #[test]
    fn test_lax_integer_parses_strings() {
        let schema = FieldSchema::integer();
        assert_eq!(schema.validate(&json!("42"), Coercion::Lax).unwrap(), json!(42));
        assert!(schema.validate(&json!("42"), Coercion::Strict).is_err());
        assert!(schema.validate(&json!("forty"), Coercion::Lax).is_err());
    }

    #[test]
    fn test_integer_accepts_whole_floats() {
        let schema = FieldSchema::integer();
        assert_eq!(schema.validate(&json!(3.0), Coercion::Strict).unwrap(), json!(3));
        assert!(schema.validate(&json!(3.5), Coercion::Strict).is_err());
    }

    #[test]
    fn test_lax_boolean() {
        let schema = FieldSchema::boolean();
        for truthy in ["true", "1", "YES", "on"] {
            assert_eq!(schema.validate(&json!(truthy), Coercion::Lax).unwrap(), json!(true));
        }
        assert_eq!(schema.validate(&json!("off"), Coercion::Lax).unwrap(), json!(false));
        assert!(schema.validate(&json!("maybe"), Coercion::Lax).is_err());
    }

    #[test]
    fn test_number_bounds() {
        let schema = FieldSchema::integer().gt(0.0).le(100.0);
        assert!(schema.validate(&json!(1), Coercion::Strict).is_ok());

        let errors = schema.validate(&json!(0), Coercion::Strict).unwrap_err();
        assert_eq!(errors[0].kind(), kinds::NOT_GT);
        assert_eq!(errors[0].ctx().unwrap()["limit_value"], json!(0.0));

        let errors = schema.validate(&json!(101), Coercion::Strict).unwrap_err();
        assert_eq!(errors[0].kind(), kinds::NOT_LE);
    }

    #[test]
    fn test_string_constraints_all_reported() {
        let schema = FieldSchema::string()
            .min_length(5)
            .pattern(Regex::new("^[a-z]+$").unwrap());
        let errors = schema.validate(&json!("AB"), Coercion::Strict).unwrap_err();
        let found: Vec<&str> = errors.iter().map(ValidationError::kind).collect();
        assert_eq!(found, vec![kinds::MIN_LENGTH, kinds::PATTERN]);
    }

    #[test]
    fn test_object_reports_every_field() {
        let schema = FieldSchema::object([
            ("name", FieldSchema::string().required()),
            ("tags", FieldSchema::array(FieldSchema::string())),
            ("price", FieldSchema::number().required()),
        ]);
        let errors = schema
            .validate(&json!({"name": 5, "tags": ["a", 2]}), Coercion::Strict)
            .unwrap_err();

        let locs: Vec<&[LocItem]> = errors.iter().map(ValidationError::loc).collect();
        assert_eq!(
            locs,
            vec![
                loc(["name"]).as_slice(),
                &[LocItem::from("tags"), LocItem::from(1)][..],
                loc(["price"]).as_slice(),
            ]
        );
        assert_eq!(errors[2].kind(), kinds::MISSING);
    }

    #[test]
    fn test_object_defaults_and_unknown_keys() {
        let schema = FieldSchema::object([
            ("q", FieldSchema::string()),
            ("page", FieldSchema::integer().default_value(1)),
        ]);
        let out = schema
            .validate(&json!({"extra": true}), Coercion::Strict)
            .unwrap();
        assert_eq!(out, json!({"page": 1}));
    }

    #[test]
    fn test_null_handling() {
        assert!(FieldSchema::string().validate(&Value::Null, Coercion::Strict).is_err());
        assert_eq!(
            FieldSchema::string()
                .nullable()
                .validate(&Value::Null, Coercion::Strict)
                .unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_array_item_counts() {
        let schema = FieldSchema::array(FieldSchema::integer()).min_items(1).max_items(2);
        assert_eq!(
            schema.validate(&json!([]), Coercion::Strict).unwrap_err()[0].kind(),
            kinds::MIN_ITEMS
        );
        assert_eq!(
            schema.validate(&json!([1, 2, 3]), Coercion::Strict).unwrap_err()[0].kind(),
            kinds::MAX_ITEMS
        );
        assert!(schema.accepts_many());
        assert!(!FieldSchema::integer().accepts_many());
    }

    #[test]
    fn test_enumeration() {
        let schema = FieldSchema::enumeration([json!("asc"), json!("desc"), json!(1)]);
        assert_eq!(schema.validate(&json!("desc"), Coercion::Strict).unwrap(), json!("desc"));
        assert_eq!(schema.validate(&json!("1"), Coercion::Lax).unwrap(), json!(1));

        let errors = schema.validate(&json!("up"), Coercion::Lax).unwrap_err();
        assert_eq!(errors[0].kind(), kinds::ENUM);
    }

    proptest! {
        #[test]
        fn prop_lax_integer_accepts_any_formatted_i64(n in any::<i64>()) {
            let out = FieldSchema::integer().validate(&json!(n.to_string()), Coercion::Lax).unwrap();
            prop_assert_eq!(out, json!(n));
        }
    }
}
