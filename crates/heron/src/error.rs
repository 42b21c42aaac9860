//! Application assembly errors.

use heron_deps::GraphError;
use thiserror::Error;

/// Errors raised while assembling or reconfiguring an [`App`](crate::App).
///
/// All of them are startup errors: an application that hits one must not
/// serve requests.
#[derive(Debug, Error)]
pub enum AppError {
    /// An operation's dependency graph is invalid.
    #[error("operation '{operation}' cannot be registered: {source}")]
    Graph {
        /// The operation ID.
        operation: String,
        /// Why the plan could not be built.
        #[source]
        source: GraphError,
    },

    /// Two operations share an ID.
    #[error("operation '{0}' is registered twice")]
    DuplicateOperation(String),

    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] heron_config::ConfigError),
}

impl AppError {
    /// Returns the graph error, if this is one.
    #[must_use]
    pub fn graph_error(&self) -> Option<&GraphError> {
        match self {
            Self::Graph { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_error_display() {
        let err = AppError::Graph {
            operation: "read_item".to_string(),
            source: GraphError::cycle(vec!["a".into(), "b".into(), "a".into()]),
        };
        assert_eq!(
            err.to_string(),
            "operation 'read_item' cannot be registered: dependency cycle detected: a -> b -> a"
        );
        assert!(err.graph_error().is_some());
        assert!(AppError::DuplicateOperation("x".into()).graph_error().is_none());
    }
}
