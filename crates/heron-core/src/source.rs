//! Parameter sources.

use std::fmt;

/// Where a declared parameter gets its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// Path parameters (e.g., `/items/{item_id}`)
    Path,
    /// Query string parameters
    Query,
    /// HTTP headers
    Header,
    /// Cookies from the `Cookie` header
    Cookie,
    /// Request body (JSON or form)
    Body,
    /// The result of another dependency
    Dependency,
}

impl Source {
    /// Name used as the first location segment in error reports.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Body => "body",
            Self::Dependency => "dependency",
        }
    }

    /// Whether values from this source arrive as strings.
    #[must_use]
    pub const fn is_textual(&self) -> bool {
        matches!(self, Self::Path | Self::Query | Self::Header | Self::Cookie)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_display() {
        assert_eq!(Source::Path.to_string(), "path");
        assert_eq!(Source::Query.to_string(), "query");
        assert_eq!(Source::Header.to_string(), "header");
        assert_eq!(Source::Cookie.to_string(), "cookie");
        assert_eq!(Source::Body.to_string(), "body");
    }

    #[test]
    fn test_textual_sources() {
        assert!(Source::Query.is_textual());
        assert!(!Source::Body.is_textual());
        assert!(!Source::Dependency.is_textual());
    }
}
