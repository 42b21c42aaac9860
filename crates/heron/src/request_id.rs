//! Request IDs.
//!
//! Every request handled by an [`App`](crate::App) gets an ID that is logged
//! with each lifecycle event and echoed in the `x-request-id` response
//! header. New IDs are UUID v7, so they sort by creation time.

use http::HeaderMap;
use std::fmt;
use uuid::Uuid;

/// The header name for request ID propagation.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// A request's ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a fresh time-ordered ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Takes the ID from `x-request-id` when `trust_incoming` is set and the
    /// header holds a valid UUID; otherwise generates one.
    #[must_use]
    pub fn assign(headers: &HeaderMap, trust_incoming: bool) -> Self {
        if trust_incoming {
            let incoming = headers
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| Uuid::parse_str(v.trim()).ok());
            if let Some(id) = incoming {
                return Self(id);
            }
        }
        Self::new()
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_new_ids_are_v7_and_ordered() {
        let first = RequestId::new();
        let second = RequestId::new();
        assert_eq!(first.as_uuid().get_version_num(), 7);
        assert!(first.as_uuid() < second.as_uuid());
    }

    #[test]
    fn test_incoming_id_only_when_trusted() {
        let incoming = Uuid::now_v7();
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(&incoming.to_string()).unwrap());

        assert_eq!(RequestId::assign(&headers, true).as_uuid(), &incoming);
        assert_ne!(RequestId::assign(&headers, false).as_uuid(), &incoming);
    }

    #[test]
    fn test_invalid_incoming_id_is_replaced() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert_eq!(RequestId::assign(&headers, true).as_uuid().get_version_num(), 7);
    }
}
