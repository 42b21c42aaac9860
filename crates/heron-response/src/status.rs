//! Status code rules.

use http::StatusCode;

/// Returns false for status codes whose responses never carry a body:
/// informational (1xx), 204 No Content, 205 Reset Content, and
/// 304 Not Modified.
///
/// ```
/// use heron_response::body_allowed_for_status;
/// use http::StatusCode;
///
/// assert!(body_allowed_for_status(StatusCode::OK));
/// assert!(!body_allowed_for_status(StatusCode::NO_CONTENT));
/// assert!(!body_allowed_for_status(StatusCode::CONTINUE));
/// ```
#[must_use]
pub fn body_allowed_for_status(status: StatusCode) -> bool {
    !(status.is_informational()
        || matches!(
            status,
            StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT | StatusCode::NOT_MODIFIED
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bodiless_statuses() {
        for code in [100, 101, 103, 204, 205, 304] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(!body_allowed_for_status(status), "{code} must not carry a body");
        }
        for code in [200, 201, 206, 301, 400, 422, 500] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(body_allowed_for_status(status), "{code} should carry a body");
        }
    }

    proptest! {
        #[test]
        fn test_classification_depends_only_on_code(code in 100u16..600) {
            let status = StatusCode::from_u16(code).unwrap();
            let expected = !((100..200).contains(&code) || code == 204 || code == 205 || code == 304);
            prop_assert_eq!(body_allowed_for_status(status), expected);
        }
    }
}
