//! Structural encoding of handler return values.
//!
//! [`jsonable`] turns a [`Payload`] into plain JSON. Variants are handled in
//! a fixed priority order:
//!
//! | Priority | Variant | Encoding |
//! |----------|---------|----------|
//! | 1 | [`Payload::Custom`] | whatever [`EncodeSelf::encode`] returns, encoded again |
//! | 2 | [`Payload::Decimal`] | canonical string, e.g. `"12.50"` |
//! | 3 | date and time variants | ISO-8601 string |
//! | 4 | [`Payload::Duration`] | float seconds |
//! | 5 | [`Payload::Uuid`] | hyphenated string |
//! | 6 | [`Payload::Bytes`] | lossy UTF-8 string |
//! | 7 | scalars, [`Payload::Seq`], [`Payload::Map`], [`Payload::Json`] | as-is, recursively |
//!
//! Mapping keys come out in sorted order.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Maximum nesting of [`EncodeSelf`] results before encoding gives up.
const MAX_CUSTOM_DEPTH: usize = 32;

/// Errors produced while encoding a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// A float was NaN or infinite.
    #[error("cannot encode non-finite float {0}")]
    NonFiniteFloat(String),

    /// A custom encoder kept returning custom values.
    #[error("custom encoders nested deeper than {MAX_CUSTOM_DEPTH} levels")]
    CustomDepth,

    /// A value could not be converted through serde.
    #[error("serialization failed: {0}")]
    Serialize(String),
}

/// A value that knows how to encode itself.
///
/// Checked before any structural decomposition.
///
/// ```
/// use heron_response::{jsonable, EncodeSelf, Payload};
/// use serde_json::json;
///
/// #[derive(Debug)]
/// struct Money { cents: i64 }
///
/// impl EncodeSelf for Money {
///     fn encode(&self) -> Payload {
///         Payload::from(format!("${}.{:02}", self.cents / 100, self.cents % 100))
///     }
/// }
///
/// let value = jsonable(&Payload::custom(Money { cents: 1250 })).unwrap();
/// assert_eq!(value, json!("$12.50"));
/// ```
pub trait EncodeSelf: Send + Sync + fmt::Debug {
    /// Returns the payload to encode in place of `self`.
    fn encode(&self) -> Payload;
}

/// A fixed-point decimal kept in its canonical textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal(String);

/// A string that is not a decimal number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid decimal literal '{0}'")]
pub struct ParseDecimalError(String);

impl Decimal {
    /// Builds `mantissa * 10^-scale`, keeping trailing zeros.
    #[must_use]
    pub fn new(mantissa: i128, scale: u32) -> Self {
        let digits = mantissa.unsigned_abs().to_string();
        let sign = if mantissa < 0 { "-" } else { "" };
        let scale = scale as usize;
        if scale == 0 {
            return Self(format!("{sign}{digits}"));
        }
        let padded = format!("{digits:0>width$}", width = scale + 1);
        let (int, frac) = padded.split_at(padded.len() - scale);
        Self(format!("{sign}{int}.{frac}"))
    }

    /// The canonical string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseDecimalError(s.to_string());
        let (sign, unsigned) = match s.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", s.strip_prefix('+').unwrap_or(s)),
        };
        let (int, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if int.is_empty() || !all_digits(int) || !all_digits(frac) || (unsigned.contains('.') && frac.is_empty()) {
            return Err(invalid());
        }

        let int = int.trim_start_matches('0');
        let int = if int.is_empty() { "0" } else { int };
        let is_zero = int == "0" && frac.bytes().all(|b| b == b'0');
        let sign = if is_zero { "" } else { sign };
        Ok(if frac.is_empty() {
            Self(format!("{sign}{int}"))
        } else {
            Self(format!("{sign}{int}.{frac}"))
        })
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A handler return value, before encoding.
#[derive(Debug, Clone)]
pub enum Payload {
    /// `null`.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    UInt(u64),
    /// A float. Must be finite.
    Float(f64),
    /// A string.
    Str(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// A fixed-point decimal.
    Decimal(Decimal),
    /// A UUID.
    Uuid(Uuid),
    /// A timezone-aware timestamp.
    DateTime(DateTime<FixedOffset>),
    /// A timestamp without timezone.
    NaiveDateTime(NaiveDateTime),
    /// A calendar date.
    Date(NaiveDate),
    /// A time of day.
    Time(NaiveTime),
    /// A span of time.
    Duration(Duration),
    /// An ordered sequence.
    Seq(Vec<Payload>),
    /// A mapping with string keys.
    Map(IndexMap<String, Payload>),
    /// Already-encoded JSON.
    Json(Value),
    /// A value with its own encoder.
    Custom(Arc<dyn EncodeSelf>),
}

impl Payload {
    /// Wraps a value with its own encoder.
    pub fn custom(value: impl EncodeSelf + 'static) -> Self {
        Self::Custom(Arc::new(value))
    }

    /// Wraps raw bytes.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Builds a mapping from key/value pairs, keeping the last value for a
    /// repeated key.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Payload>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Converts any serializable value through `serde_json`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::Serialize`] if serialization fails.
    pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, EncodeError> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|e| EncodeError::Serialize(e.to_string()))
    }
}

macro_rules! payload_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Payload {
                fn from(value: $ty) -> Self {
                    Self::$variant(value.into())
                }
            }
        )*
    };
}

payload_from! {
    bool => Bool,
    i64 => Int,
    i32 => Int,
    u64 => UInt,
    u32 => UInt,
    f64 => Float,
    String => Str,
    &str => Str,
    Decimal => Decimal,
    Uuid => Uuid,
    DateTime<FixedOffset> => DateTime,
    NaiveDateTime => NaiveDateTime,
    NaiveDate => Date,
    NaiveTime => Time,
    Duration => Duration,
    Value => Json,
}

impl From<DateTime<Utc>> for Payload {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value.fixed_offset())
    }
}

impl From<()> for Payload {
    fn from((): ()) -> Self {
        Self::Null
    }
}

impl<T: Into<Payload>> From<Option<T>> for Payload {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Payload>> From<Vec<T>> for Payload {
    fn from(values: Vec<T>) -> Self {
        Self::Seq(values.into_iter().map(Into::into).collect())
    }
}

/// Output filtering applied after encoding.
///
/// `include` and `exclude` act on the keys of a top-level mapping;
/// `exclude_none` drops null-valued keys at every level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonableOptions {
    include: Option<IndexSet<String>>,
    exclude: IndexSet<String>,
    exclude_none: bool,
}

impl JsonableOptions {
    /// Creates options that change nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only these top-level keys.
    #[must_use]
    pub fn include<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Drops these top-level keys.
    #[must_use]
    pub fn exclude<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Drops keys whose value is `null`, recursively.
    #[must_use]
    pub fn exclude_none(mut self) -> Self {
        self.exclude_none = true;
        self
    }

    /// Whether applying these options is a no-op.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.include.is_none() && self.exclude.is_empty() && !self.exclude_none
    }

    /// Filters an encoded value.
    #[must_use]
    pub fn apply(&self, value: Value) -> Value {
        let Value::Object(map) = value else {
            return self.strip_none(value);
        };
        let filtered = map
            .into_iter()
            .filter(|(k, _)| self.include.as_ref().map_or(true, |keep| keep.contains(k)))
            .filter(|(k, _)| !self.exclude.contains(k))
            .collect();
        self.strip_none(Value::Object(filtered))
    }

    fn strip_none(&self, value: Value) -> Value {
        if !self.exclude_none {
            return value;
        }
        match value {
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, v)| (k, self.strip_none(v)))
                    .collect(),
            ),
            Value::Array(items) => Value::Array(items.into_iter().map(|v| self.strip_none(v)).collect()),
            other => other,
        }
    }
}

/// Encodes a payload into plain JSON.
///
/// # Errors
///
/// Returns [`EncodeError`] for non-finite floats and runaway custom encoders.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use heron_response::{jsonable, Decimal, Payload};
/// use serde_json::json;
/// use std::time::Duration;
///
/// let payload = Payload::map([
///     ("price", Payload::from(Decimal::new(1250, 2))),
///     ("released", Payload::from(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())),
///     ("ttl", Payload::from(Duration::from_millis(1500))),
/// ]);
///
/// assert_eq!(
///     jsonable(&payload).unwrap(),
///     json!({"price": "12.50", "released": "2024-03-01", "ttl": 1.5})
/// );
/// ```
pub fn jsonable(payload: &Payload) -> Result<Value, EncodeError> {
    encode(payload, 0)
}

/// Encodes a payload and filters the result.
///
/// # Errors
///
/// See [`jsonable`].
pub fn jsonable_with(payload: &Payload, options: &JsonableOptions) -> Result<Value, EncodeError> {
    let value = jsonable(payload)?;
    Ok(if options.is_identity() {
        value
    } else {
        options.apply(value)
    })
}

fn encode(payload: &Payload, depth: usize) -> Result<Value, EncodeError> {
    Ok(match payload {
        Payload::Custom(custom) => {
            if depth >= MAX_CUSTOM_DEPTH {
                return Err(EncodeError::CustomDepth);
            }
            return encode(&custom.encode(), depth + 1);
        }
        Payload::Decimal(d) => Value::String(d.as_str().to_string()),
        Payload::DateTime(dt) => Value::String(dt.to_rfc3339()),
        Payload::NaiveDateTime(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
        Payload::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
        Payload::Time(t) => Value::String(t.format("%H:%M:%S%.f").to_string()),
        Payload::Duration(d) => float(d.as_secs_f64())?,
        Payload::Uuid(id) => Value::String(id.hyphenated().to_string()),
        Payload::Bytes(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        Payload::Null => Value::Null,
        Payload::Bool(b) => Value::Bool(*b),
        Payload::Int(n) => Value::from(*n),
        Payload::UInt(n) => Value::from(*n),
        Payload::Float(f) => float(*f)?,
        Payload::Str(s) => Value::String(s.clone()),
        Payload::Seq(items) => Value::Array(
            items
                .iter()
                .map(|item| encode(item, depth))
                .collect::<Result<_, _>>()?,
        ),
        Payload::Map(entries) => {
            let mut map = Map::new();
            for (key, value) in entries {
                map.insert(key.clone(), encode(value, depth)?);
            }
            Value::Object(map)
        }
        Payload::Json(value) => value.clone(),
    })
}

fn float(f: f64) -> Result<Value, EncodeError> {
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| EncodeError::NonFiniteFloat(f.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[derive(Debug)]
    struct Point(i64, i64);

    impl EncodeSelf for Point {
        fn encode(&self) -> Payload {
            Payload::map([("x", self.0), ("y", self.1)])
        }
    }

    #[derive(Debug)]
    struct Loop;

    impl EncodeSelf for Loop {
        fn encode(&self) -> Payload {
            Payload::custom(Loop)
        }
    }

    #[test]
    fn test_decimal_canonical_forms() {
        assert_eq!(Decimal::new(1250, 2).as_str(), "12.50");
        assert_eq!(Decimal::new(-5, 3).as_str(), "-0.005");
        assert_eq!(Decimal::new(42, 0).as_str(), "42");
        assert_eq!("007.10".parse::<Decimal>().unwrap().as_str(), "7.10");
        assert_eq!("-0.0".parse::<Decimal>().unwrap().as_str(), "0.0");
        assert!("1.".parse::<Decimal>().is_err());
        assert!("abc".parse::<Decimal>().is_err());
    }

    #[test]
    fn test_time_values() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(jsonable(&dt.into()).unwrap(), json!("2024-01-02T03:04:05+00:00"));

        let naive = dt.naive_utc();
        assert_eq!(jsonable(&naive.into()).unwrap(), json!("2024-01-02T03:04:05"));

        let time = NaiveTime::from_hms_milli_opt(8, 30, 0, 250).unwrap();
        assert_eq!(jsonable(&time.into()).unwrap(), json!("08:30:00.250"));
    }

    #[test]
    fn test_custom_encoder_first() {
        let payload = Payload::from(vec![Payload::custom(Point(1, 2))]);
        assert_eq!(jsonable(&payload).unwrap(), json!([{"x": 1, "y": 2}]));
        assert_eq!(jsonable(&Payload::custom(Loop)), Err(EncodeError::CustomDepth));
    }

    #[test]
    fn test_scalars_and_misc() {
        let id = Uuid::nil();
        assert_eq!(
            jsonable(&id.into()).unwrap(),
            json!("00000000-0000-0000-0000-000000000000")
        );
        assert_eq!(jsonable(&Payload::bytes(vec![0xff_u8, b'a'])).unwrap(), json!("\u{fffd}a"));
        assert_eq!(jsonable(&Payload::from(None::<i64>)).unwrap(), Value::Null);
        assert!(matches!(
            jsonable(&Payload::Float(f64::NAN)),
            Err(EncodeError::NonFiniteFloat(_))
        ));
    }

    #[test]
    fn test_map_keys_sorted() {
        let payload = Payload::map([("b", 1), ("a", 2)]);
        let text = serde_json::to_string(&jsonable(&payload).unwrap()).unwrap();
        assert_eq!(text, r#"{"a":2,"b":1}"#);
    }

    #[test]
    fn test_options() {
        let payload = Payload::from(json!({"id": 1, "name": null, "meta": {"tag": null, "n": 2}}));

        let none = JsonableOptions::new().exclude_none();
        assert_eq!(
            jsonable_with(&payload, &none).unwrap(),
            json!({"id": 1, "meta": {"n": 2}})
        );

        let include = JsonableOptions::new().include(["id", "name"]);
        assert_eq!(jsonable_with(&payload, &include).unwrap(), json!({"id": 1, "name": null}));

        let exclude = JsonableOptions::new().exclude(["meta"]).exclude_none();
        assert_eq!(jsonable_with(&payload, &exclude).unwrap(), json!({"id": 1}));
        assert!(JsonableOptions::new().is_identity());
    }

    #[test]
    fn test_serialize_bridge() {
        #[derive(Serialize)]
        struct Item {
            id: u32,
        }
        let payload = Payload::serialize(&Item { id: 3 }).unwrap();
        assert_eq!(jsonable(&payload).unwrap(), json!({"id": 3}));
    }
}
