//! Header lookup by parameter name.

use crate::ExtractError;
use heron_core::Source;
use http::HeaderMap;

/// Maps a parameter name to its header name.
///
/// Header names are case-insensitive. With `convert_underscores` set,
/// `user_agent` looks up `user-agent`.
///
/// ```rust
/// use heron_extract::header_name;
///
/// assert_eq!(header_name("User_Agent", true), "user-agent");
/// assert_eq!(header_name("x_token", false), "x_token");
/// ```
#[must_use]
pub fn header_name(param: &str, convert_underscores: bool) -> String {
    let lower = param.to_ascii_lowercase();
    if convert_underscores {
        lower.replace('_', "-")
    } else {
        lower
    }
}

/// Returns every value of the header `name`, in order.
///
/// # Errors
///
/// Returns [`ExtractError`] if a value is not valid UTF-8.
pub fn header_values<'a>(headers: &'a HeaderMap, name: &str) -> Result<Vec<&'a str>, ExtractError> {
    headers
        .get_all(name)
        .iter()
        .map(|value| {
            value
                .to_str()
                .map_err(|_| ExtractError::invalid_encoding(Source::Header, name))
        })
        .collect()
}
