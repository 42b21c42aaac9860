//! Extraction error types.
//!
//! Extraction of individual parameters never fails; an absent value is
//! simply `None` and becomes a `missing` validation error later. The errors
//! here cover request-wide problems with the raw input itself.

use heron_core::{validation::loc, HttpError, Source, ValidationError};
use http::StatusCode;
use std::fmt;

/// Error raised while decoding a raw request source.
///
/// # Example
///
/// ```rust
/// use heron_extract::ExtractError;
/// use http::StatusCode;
///
/// let err = ExtractError::malformed_body("expected value at line 1 column 1");
/// assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
/// assert_eq!(err.error_code(), "MALFORMED_BODY");
/// ```
#[derive(Debug, Clone)]
pub struct ExtractError {
    source: Source,
    kind: ExtractErrorKind,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractErrorKind {
    /// Body bytes could not be decoded
    MalformedBody,
    /// Header or cookie is not valid UTF-8
    InvalidEncoding,
}

impl ExtractError {
    /// The body did not decode as the declared content type.
    #[must_use]
    pub fn malformed_body(details: impl Into<String>) -> Self {
        Self {
            source: Source::Body,
            kind: ExtractErrorKind::MalformedBody,
            message: details.into(),
        }
    }

    /// A header value was not valid UTF-8.
    #[must_use]
    pub fn invalid_encoding(source: Source, name: &str) -> Self {
        Self {
            source,
            kind: ExtractErrorKind::InvalidEncoding,
            message: format!("invalid UTF-8 in {source} '{name}'"),
        }
    }

    /// Returns the source being decoded.
    #[must_use]
    pub fn extraction_source(&self) -> Source {
        self.source
    }

    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            ExtractErrorKind::MalformedBody => StatusCode::UNPROCESSABLE_ENTITY,
            ExtractErrorKind::InvalidEncoding => StatusCode::BAD_REQUEST,
        }
    }

    /// Returns the error code suitable for logs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            ExtractErrorKind::MalformedBody => "MALFORMED_BODY",
            ExtractErrorKind::InvalidEncoding => "INVALID_ENCODING",
        }
    }

    /// Converts a malformed body into the `json_invalid` field error the
    /// client sees; other kinds become an [`HttpError`].
    pub fn into_report_entry(self) -> Result<ValidationError, HttpError> {
        match self.kind {
            ExtractErrorKind::MalformedBody => Ok(ValidationError::json_invalid(
                loc([self.source.as_str()]),
                self.message,
            )),
            ExtractErrorKind::InvalidEncoding => Err(HttpError::new(self.status_code(), self.message)),
        }
    }
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExtractError {}
