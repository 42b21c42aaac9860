//! Handler return values.
//!
//! Handlers return an [`ArgValue`] like any other dependency. Plain JSON is
//! packaged as-is; anything that needs canonical encoding (decimals, dates,
//! custom encoders) is wrapped with [`reply`].

use heron_core::Fault;
use heron_deps::ArgValue;
use heron_response::Payload;
use std::sync::Arc;

/// Wraps a [`Payload`] as a handler result.
///
/// # Example
///
/// ```
/// use heron::reply;
/// use heron_response::{Decimal, Payload};
///
/// let value = reply(Payload::map([("price", Payload::from(Decimal::new(1999, 2)))]));
/// assert!(value.as_json().is_none());
/// ```
pub fn reply(payload: impl Into<Payload>) -> ArgValue {
    ArgValue::shared(payload.into())
}

/// Recovers the payload a handler returned.
pub(crate) fn into_payload(value: &ArgValue) -> Result<Arc<Payload>, Fault> {
    if let Some(json) = value.as_json() {
        return Ok(Arc::new(Payload::Json(json.clone())));
    }
    value
        .downcast::<Payload>()
        .ok_or_else(|| Fault::Encoding("handler returned a value that is neither JSON nor a Payload".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_values_pass_through() {
        let value = ArgValue::from(json!({"id": 1}));
        assert!(matches!(into_payload(&value).unwrap().as_ref(), Payload::Json(v) if v == &json!({"id": 1})));
    }

    #[test]
    fn test_reply_round_trips_payload() {
        let value = reply(Payload::from("ok"));
        assert!(matches!(into_payload(&value).unwrap().as_ref(), Payload::Str(s) if s == "ok"));
    }

    #[test]
    fn test_foreign_shared_values_are_faults() {
        let value = ArgValue::shared(42_u8);
        assert!(matches!(into_payload(&value), Err(Fault::Encoding(_))));
    }
}
