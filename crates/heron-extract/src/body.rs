//! Request body decoding.
//!
//! The body is decoded once per request into a [`ParsedBody`], chosen by the
//! `Content-Type` header:
//!
//! | Content-Type | Result |
//! |---|---|
//! | none, `application/json`, `*/*+json` | [`ParsedBody::Json`] |
//! | `application/x-www-form-urlencoded` | [`ParsedBody::Form`] |
//! | anything else | [`ParsedBody::Raw`] |

use crate::ExtractError;
use bytes::Bytes;
use serde_json::{Map, Value};

/// A decoded request body.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    /// No body bytes were sent.
    Empty,
    /// A JSON document.
    Json(Value),
    /// URL-encoded form fields, in order.
    Form(Vec<(String, String)>),
    /// Bytes of a content type the pipeline does not decode.
    Raw(Bytes),
}

impl ParsedBody {
    /// Decodes `body` according to `content_type`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::malformed_body`] if a JSON or form body does
    /// not decode.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bytes::Bytes;
    /// use heron_extract::ParsedBody;
    /// use serde_json::json;
    ///
    /// let body = ParsedBody::decode(Some("application/json"), &Bytes::from_static(b"{\"a\":1}")).unwrap();
    /// assert_eq!(body, ParsedBody::Json(json!({"a": 1})));
    ///
    /// assert!(ParsedBody::decode(Some("application/json"), &Bytes::from_static(b"{")).is_err());
    /// ```
    pub fn decode(content_type: Option<&str>, body: &Bytes) -> Result<Self, ExtractError> {
        if body.is_empty() {
            return Ok(Self::Empty);
        }

        match BodyKind::detect(content_type) {
            BodyKind::Json => serde_json::from_slice(body)
                .map(Self::Json)
                .map_err(|e| ExtractError::malformed_body(e.to_string())),
            BodyKind::Form => serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)
                .map(Self::Form)
                .map_err(|e| ExtractError::malformed_body(e.to_string())),
            BodyKind::Other => Ok(Self::Raw(body.clone())),
        }
    }

    /// Whether the body holds textual values that need lax coercion.
    #[must_use]
    pub fn is_form(&self) -> bool {
        matches!(self, Self::Form(_))
    }

    /// Returns the whole body as a JSON value.
    ///
    /// Form fields become an object of strings, or arrays of strings when a
    /// field repeats. Raw bytes become a lossy UTF-8 string.
    #[must_use]
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Self::Empty => None,
            Self::Json(value) => Some(value.clone()),
            Self::Form(pairs) => {
                let mut map = Map::new();
                for (key, value) in pairs {
                    let value = Value::String(value.clone());
                    match map.get_mut(key) {
                        Some(Value::Array(items)) => items.push(value),
                        Some(existing) => {
                            let first = existing.take();
                            *existing = Value::Array(vec![first, value]);
                        }
                        None => {
                            map.insert(key.clone(), value);
                        }
                    }
                }
                Some(Value::Object(map))
            }
            Self::Raw(bytes) => Some(Value::String(String::from_utf8_lossy(bytes).into_owned())),
        }
    }

    /// Returns a single top-level field of the body.
    ///
    /// With `many`, a form field sent once is returned as a one-element
    /// array, the same way repeated query keys are collected.
    #[must_use]
    pub fn field(&self, name: &str, many: bool) -> Option<Value> {
        match self {
            Self::Json(Value::Object(map)) => map.get(name).cloned(),
            Self::Form(_) => {
                let value = self.to_value()?.get(name).cloned()?;
                match value {
                    Value::Array(_) => Some(value),
                    single if many => Some(Value::Array(vec![single])),
                    single => Some(single),
                }
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
    Other,
}

impl BodyKind {
    fn detect(content_type: Option<&str>) -> Self {
        let Some(raw) = content_type else {
            return Self::Json;
        };
        let Ok(parsed) = raw.parse::<mime::Mime>() else {
            return Self::Other;
        };
        if (parsed.type_() == mime::APPLICATION && parsed.subtype() == mime::JSON)
            || parsed.suffix() == Some(mime::JSON)
        {
            Self::Json
        } else if parsed.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() {
            Self::Form
        } else {
            Self::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_content_types() {
        assert_eq!(BodyKind::detect(None), BodyKind::Json);
        assert_eq!(BodyKind::detect(Some("application/json; charset=utf-8")), BodyKind::Json);
        assert_eq!(BodyKind::detect(Some("application/problem+json")), BodyKind::Json);
        assert_eq!(
            BodyKind::detect(Some("application/x-www-form-urlencoded")),
            BodyKind::Form
        );
        assert_eq!(BodyKind::detect(Some("text/plain")), BodyKind::Other);
        assert_eq!(BodyKind::detect(Some("not a mime")), BodyKind::Other);
    }

    #[test]
    fn test_empty_body() {
        let body = ParsedBody::decode(Some("application/json"), &Bytes::new()).unwrap();
        assert_eq!(body, ParsedBody::Empty);
        assert_eq!(body.to_value(), None);
    }

    #[test]
    fn test_invalid_json() {
        let err = ParsedBody::decode(None, &Bytes::from_static(b"{\"name\":")).unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_BODY");
    }

    #[test]
    fn test_form_body_to_value() {
        let body = ParsedBody::decode(
            Some("application/x-www-form-urlencoded"),
            &Bytes::from_static(b"user=ada&role=a&role=b"),
        )
        .unwrap();

        assert!(body.is_form());
        assert_eq!(
            body.to_value(),
            Some(json!({"user": "ada", "role": ["a", "b"]}))
        );
        assert_eq!(body.field("user", false), Some(json!("ada")));
    }

    #[test]
    fn test_form_field_as_list() {
        let body = ParsedBody::decode(
            Some("application/x-www-form-urlencoded"),
            &Bytes::from_static(b"tag=a&role=x&role=y"),
        )
        .unwrap();

        assert_eq!(body.field("tag", true), Some(json!(["a"])));
        assert_eq!(body.field("tag", false), Some(json!("a")));
        assert_eq!(body.field("role", true), Some(json!(["x", "y"])));
        assert_eq!(body.field("missing", true), None);
    }

    #[test]
    fn test_json_field() {
        let body = ParsedBody::Json(json!({"item": {"id": 1}}));
        assert_eq!(body.field("item", false), Some(json!({"id": 1})));
        assert_eq!(body.field("user", false), None);
        assert_eq!(ParsedBody::Json(json!([1])).field("item", false), None);
    }

    #[test]
    fn test_raw_body() {
        let body = ParsedBody::decode(Some("text/plain"), &Bytes::from_static(b"hello")).unwrap();
        assert_eq!(body.to_value(), Some(json!("hello")));
    }
}
