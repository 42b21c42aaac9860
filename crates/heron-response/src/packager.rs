//! Handler return value to HTTP response.

use crate::envelope::{empty_response, json_response};
use crate::jsonable::{jsonable, JsonableOptions, Payload};
use crate::status::body_allowed_for_status;
use bytes::Bytes;
use heron_core::validation::loc;
use heron_core::{Coercion, Fault, Schema};
use http::{Response, StatusCode};
use serde_json::Value;
use std::sync::Arc;

/// Turns a handler's return value into a response for one path operation.
///
/// Encoding runs in three steps:
///
/// 1. [`jsonable`] encodes the payload.
/// 2. If a response schema is declared, the encoded value is validated
///    against it. A mismatch is a server fault, not a client error.
/// 3. [`JsonableOptions`] filter the validated value.
///
/// Bodiless statuses skip all three.
///
/// # Example
///
/// ```
/// use heron_core::FieldSchema;
/// use heron_response::{Payload, ResponsePackager};
/// use http::StatusCode;
/// use serde_json::json;
///
/// let packager = ResponsePackager::new()
///     .status(StatusCode::CREATED)
///     .schema(FieldSchema::object([("id", FieldSchema::integer().required())]));
///
/// let response = packager.package(&Payload::from(json!({"id": 1, "secret": "x"}))).unwrap();
/// assert_eq!(response.status(), StatusCode::CREATED);
/// assert_eq!(response.body().as_ref(), br#"{"id":1}"#);
///
/// let err = packager.package(&Payload::from(json!({"name": "x"}))).unwrap_err();
/// assert_eq!(err.error_code(), "RESPONSE_VALIDATION_FAILED");
/// ```
#[derive(Debug, Clone)]
pub struct ResponsePackager {
    status: StatusCode,
    schema: Option<Arc<dyn Schema>>,
    options: JsonableOptions,
}

impl Default for ResponsePackager {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            schema: None,
            options: JsonableOptions::default(),
        }
    }
}

impl ResponsePackager {
    /// A packager answering 200 without a response schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the success status code.
    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Declares the response schema.
    #[must_use]
    pub fn schema(mut self, schema: impl Schema + 'static) -> Self {
        self.schema = Some(Arc::new(schema));
        self
    }

    /// Sets output filtering.
    #[must_use]
    pub fn options(mut self, options: JsonableOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the success status code.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Returns true if a response schema is declared.
    #[must_use]
    pub fn has_schema(&self) -> bool {
        self.schema.is_some()
    }

    /// Encodes, validates, and filters a payload.
    ///
    /// # Errors
    ///
    /// - [`Fault::Encoding`] if the payload cannot be encoded
    /// - [`Fault::ResponseValidation`] if it does not match the schema; every
    ///   error location starts with `"response"`
    pub fn encode(&self, payload: &Payload) -> Result<Value, Fault> {
        let value = jsonable(payload).map_err(|e| Fault::Encoding(e.to_string()))?;

        let value = match &self.schema {
            Some(schema) => schema.validate(&value, Coercion::Strict).map_err(|errors| {
                let prefix = loc(["response"]);
                let errors: Vec<_> = errors.into_iter().map(|e| e.prefixed(&prefix)).collect();
                tracing::error!(
                    errors = errors.len(),
                    first = %errors.first().map(ToString::to_string).unwrap_or_default(),
                    "Response failed validation"
                );
                Fault::ResponseValidation { errors }
            })?,
            None => value,
        };

        Ok(if self.options.is_identity() {
            value
        } else {
            self.options.apply(value)
        })
    }

    /// Builds the success response.
    ///
    /// # Errors
    ///
    /// See [`ResponsePackager::encode`].
    pub fn package(&self, payload: &Payload) -> Result<Response<Bytes>, Fault> {
        if !body_allowed_for_status(self.status) {
            return Ok(empty_response(self.status));
        }
        let value = self.encode(payload)?;
        Ok(json_response(self.status, &value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::FieldSchema;
    use serde_json::json;

    #[test]
    fn test_no_content_never_has_body() {
        let packager = ResponsePackager::new().status(StatusCode::NO_CONTENT);
        let response = packager.package(&Payload::from(json!({"ignored": true}))).unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_response_errors_are_rooted_at_response() {
        let packager = ResponsePackager::new().schema(FieldSchema::object([
            ("id", FieldSchema::integer().required()),
            ("tags", FieldSchema::array(FieldSchema::string())),
        ]));

        let err = packager
            .encode(&Payload::from(json!({"id": "one", "tags": ["a", 2]})))
            .unwrap_err();
        let Fault::ResponseValidation { errors } = err else {
            panic!("expected response validation fault");
        };
        let locs: Vec<Value> = errors.iter().map(|e| json!(e.loc())).collect();
        assert_eq!(locs, vec![json!(["response", "id"]), json!(["response", "tags", 1])]);
    }

    #[test]
    fn test_response_is_strict() {
        let packager = ResponsePackager::new().schema(FieldSchema::integer());
        assert!(packager.encode(&Payload::from("5")).is_err());
        assert_eq!(packager.encode(&Payload::from(5_i64)).unwrap(), json!(5));
    }

    #[test]
    fn test_encoding_fault() {
        let err = ResponsePackager::new().encode(&Payload::Float(f64::INFINITY)).unwrap_err();
        assert!(matches!(err, Fault::Encoding(_)));
    }

    #[test]
    fn test_options_after_validation() {
        let packager = ResponsePackager::new()
            .schema(FieldSchema::object([
                ("id", FieldSchema::integer().required()),
                ("note", FieldSchema::string().nullable()),
            ]))
            .options(JsonableOptions::new().exclude_none());

        let value = packager.encode(&Payload::from(json!({"id": 1, "note": null}))).unwrap();
        assert_eq!(value, json!({"id": 1}));
        assert!(packager.has_schema());
        assert_eq!(packager.status_code(), StatusCode::OK);
    }
}
