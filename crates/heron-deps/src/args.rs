//! Values passed between dependencies and into handlers.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// A resolved value: either validated data or an opaque shared object such
/// as a database handle.
#[derive(Clone)]
pub enum ArgValue {
    /// Validated, coerced data.
    Json(Value),
    /// Any `Send + Sync` object produced by a dependency.
    Shared(Arc<dyn Any + Send + Sync>),
}

impl ArgValue {
    /// Wraps an arbitrary object.
    pub fn shared<T: Any + Send + Sync>(value: T) -> Self {
        Self::Shared(Arc::new(value))
    }

    /// Returns the JSON value, if this is data.
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            Self::Shared(_) => None,
        }
    }

    /// Returns the shared object as `T`, if it is one.
    #[must_use]
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Self::Shared(obj) => obj.clone().downcast::<T>().ok(),
            Self::Json(_) => None,
        }
    }
}

impl fmt::Debug for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(v) => f.debug_tuple("Json").field(v).finish(),
            Self::Shared(_) => f.write_str("Shared(..)"),
        }
    }
}

impl From<Value> for ArgValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<()> for ArgValue {
    fn from((): ()) -> Self {
        Self::Json(Value::Null)
    }
}

/// Error reading a value out of [`Arguments`].
#[derive(Debug, Error)]
pub enum ArgumentError {
    /// No argument with that name was resolved.
    #[error("argument '{0}' was not resolved")]
    Missing(String),

    /// The argument holds data that does not deserialize into the requested type.
    #[error("argument '{name}' has an unexpected shape: {source}")]
    Decode {
        /// Argument name.
        name: String,
        /// Deserialization failure.
        #[source]
        source: serde_json::Error,
    },

    /// The argument holds a different kind of value than requested.
    #[error("argument '{name}' is not a {expected}")]
    WrongKind {
        /// Argument name.
        name: String,
        /// What the caller asked for.
        expected: &'static str,
    },
}

/// Named arguments for one callable, in declaration order.
///
/// # Example
///
/// ```
/// use heron_deps::{ArgValue, Arguments};
/// use serde_json::json;
///
/// let mut args = Arguments::new();
/// args.insert("limit", ArgValue::from(json!(10)));
/// args.insert("pool", ArgValue::shared(String::from("pg")));
///
/// let limit: u32 = args.value("limit").unwrap();
/// assert_eq!(limit, 10);
/// assert_eq!(args.shared::<String>("pool").unwrap().as_str(), "pg");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: IndexMap<String, ArgValue>,
}

impl Arguments {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an argument.
    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.values.insert(name.into(), value);
    }

    /// Returns the raw argument.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    /// Returns the argument's JSON data.
    #[must_use]
    pub fn json(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(ArgValue::as_json)
    }

    /// Deserializes a data argument into `T`.
    pub fn value<T: DeserializeOwned>(&self, name: &str) -> Result<T, ArgumentError> {
        match self.get(name) {
            Some(ArgValue::Json(v)) => {
                T::deserialize(v).map_err(|source| ArgumentError::Decode {
                    name: name.to_string(),
                    source,
                })
            }
            Some(ArgValue::Shared(_)) => Err(ArgumentError::WrongKind {
                name: name.to_string(),
                expected: "data value",
            }),
            None => Err(ArgumentError::Missing(name.to_string())),
        }
    }

    /// Returns a shared object argument as `T`.
    pub fn shared<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, ArgumentError> {
        let value = self
            .get(name)
            .ok_or_else(|| ArgumentError::Missing(name.to_string()))?;
        value.downcast::<T>().ok_or_else(|| ArgumentError::WrongKind {
            name: name.to_string(),
            expected: std::any::type_name::<T>(),
        })
    }

    /// Returns true if `name` was resolved.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over arguments in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns all data arguments as one JSON object; shared objects are skipped.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .filter_map(|(k, v)| v.as_json().map(|j| (k.clone(), j.clone())))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_decoding() {
        let mut args = Arguments::new();
        args.insert("tags", ArgValue::from(json!(["a", "b"])));

        let tags: Vec<String> = args.value("tags").unwrap();
        assert_eq!(tags, vec!["a", "b"]);

        let err = args.value::<u32>("tags").unwrap_err();
        assert!(matches!(err, ArgumentError::Decode { .. }));
    }

    #[test]
    fn test_missing_argument() {
        let args = Arguments::new();
        assert!(matches!(args.value::<u32>("x"), Err(ArgumentError::Missing(_))));
        assert!(args.shared::<String>("x").is_err());
    }

    #[test]
    fn test_shared_wrong_kind() {
        let mut args = Arguments::new();
        args.insert("db", ArgValue::shared(42_u8));
        args.insert("n", ArgValue::from(json!(1)));

        assert!(matches!(
            args.shared::<String>("db"),
            Err(ArgumentError::WrongKind { .. })
        ));
        assert!(matches!(
            args.value::<u8>("db"),
            Err(ArgumentError::WrongKind { .. })
        ));
        assert_eq!(*args.shared::<u8>("db").unwrap(), 42);
    }

    #[test]
    fn test_to_json_skips_shared() {
        let mut args = Arguments::new();
        args.insert("q", ArgValue::from(json!("rust")));
        args.insert("db", ArgValue::shared(()));
        assert_eq!(args.to_json(), json!({"q": "rust"}));
        assert_eq!(args.iter().count(), 2);
    }
}
