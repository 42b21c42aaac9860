//! Build-time graph errors.

use thiserror::Error;

/// Result type alias for plan construction.
pub type GraphResult<T> = Result<T, GraphError>;

/// A dependency declaration that cannot be turned into a resolution plan.
///
/// These are reported when a route is registered and must stop the
/// application from starting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A dependency transitively requires itself.
    #[error("dependency cycle detected: {}", path.join(" -> "))]
    Cycle {
        /// Names along the cycle, starting and ending with the same dependency.
        path: Vec<String>,
    },

    /// A named reference does not match any registered dependency.
    #[error("unknown dependency '{name}' required by '{required_by}'")]
    UnknownDependency {
        /// The missing name.
        name: String,
        /// The dependency that referenced it.
        required_by: String,
    },

    /// Two parameters of one dependency share a name.
    #[error("parameter '{parameter}' is declared twice in '{dependency}'")]
    DuplicateParameter {
        /// The declaring dependency.
        dependency: String,
        /// The repeated parameter name.
        parameter: String,
    },

    /// A path parameter was declared optional.
    #[error("path parameter '{parameter}' in '{dependency}' must be required")]
    OptionalPathParameter {
        /// The declaring dependency.
        dependency: String,
        /// The parameter name.
        parameter: String,
    },

    /// A dependency-sourced parameter has no dependency reference.
    #[error("parameter '{parameter}' in '{dependency}' has no dependency to resolve from")]
    UnboundDependency {
        /// The declaring dependency.
        dependency: String,
        /// The parameter name.
        parameter: String,
    },
}

impl GraphError {
    /// Creates a cycle error from the names along the cycle.
    #[must_use]
    pub fn cycle(path: Vec<String>) -> Self {
        Self::Cycle { path }
    }

    /// Returns the cycle path, if this is a cycle error.
    #[must_use]
    pub fn cycle_path(&self) -> Option<&[String]> {
        match self {
            Self::Cycle { path } => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_display() {
        let err = GraphError::cycle(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(err.to_string(), "dependency cycle detected: a -> b -> a");
        assert_eq!(err.cycle_path().map(<[String]>::len), Some(3));
    }

    #[test]
    fn test_unknown_display() {
        let err = GraphError::UnknownDependency {
            name: "get_db".into(),
            required_by: "list_items".into(),
        };
        assert_eq!(
            err.to_string(),
            "unknown dependency 'get_db' required by 'list_items'"
        );
        assert!(err.cycle_path().is_none());
    }
}
