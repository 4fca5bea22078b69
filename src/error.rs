//! Unified error types for bom-tools.
//!
//! The engine is total over well-formed input and reports malformed input
//! through [`BomError::InvalidArgument`]. Failures of the graph store
//! collaborator are wrapped in [`BomError::Store`] and never retried here.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error coming from a collaborator (graph store, oracle, provider).
pub type StoreSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for bom-tools operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BomError {
    /// A root, version or referenced node does not resolve
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Malformed input (compare mode, condition expression, delimiter, filters)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A proposed edge would close a cycle
    #[error("Cycle detected: {}", path.join(" -> "))]
    CycleDetected {
        parent_id: String,
        child_id: String,
        path: Vec<String>,
    },

    /// Graph store / collaborator failure, propagated untouched
    #[error("Store operation failed: {context}")]
    Store {
        context: String,
        #[source]
        source: StoreSource,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Document (de)serialization errors
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for bom-tools operations
pub type Result<T> = std::result::Result<T, BomError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl BomError {
    /// Create a not-found error for a node of the given kind
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create an invalid-argument error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Wrap a collaborator failure
    pub fn store(
        context: impl Into<String>,
        source: impl Into<StoreSource>,
    ) -> Self {
        Self::Store {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error reports a missing entity
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this error reports malformed caller input
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for BomError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for BomError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON: {err}"))
    }
}

impl From<serde_yaml::Error> for BomError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization(format!("YAML: {err}"))
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// Context strings are chained outermost first, e.g.
/// `"building tree for A: fetching edges of B: connection reset"`.
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, only evaluated on error.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<BomError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
///
/// `NotFound`, `InvalidArgument` and `CycleDetected` are caller-facing and
/// keep their message as is.
fn add_context_to_error(err: BomError, new_ctx: &str) -> BomError {
    match err {
        BomError::Store {
            context: existing,
            source,
        } => BomError::Store {
            context: chain_context(new_ctx, &existing),
            source,
        },
        BomError::Io {
            path,
            message,
            source,
        } => BomError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        BomError::Serialization(msg) => BomError::Serialization(chain_context(new_ctx, &msg)),
        BomError::Config(msg) => BomError::Config(chain_context(new_ctx, &msg)),
        other => other,
    }
}

/// Chain two context strings together.
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

/// Extension trait for Option types to convert to errors with context.
pub trait OptionContext<T> {
    /// Convert None to a not-found error for the given kind and id.
    fn or_not_found(self, kind: &'static str, id: &str) -> Result<T>;

    /// Convert None to an invalid-argument error with context from a closure.
    fn or_invalid<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T> OptionContext<T> for Option<T> {
    fn or_not_found(self, kind: &'static str, id: &str) -> Result<T> {
        self.ok_or_else(|| BomError::not_found(kind, id))
    }

    fn or_invalid<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.ok_or_else(|| BomError::InvalidArgument(f().into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BomError::not_found("item", "A");
        assert_eq!(err.to_string(), "item not found: A");
        assert!(err.is_not_found());

        let err = BomError::CycleDetected {
            parent_id: "A".to_string(),
            child_id: "B".to_string(),
            path: vec!["A".to_string(), "B".to_string(), "A".to_string()],
        };
        assert_eq!(err.to_string(), "Cycle detected: A -> B -> A");
    }

    #[test]
    fn test_store_context_chaining() {
        fn inner() -> Result<()> {
            Err(BomError::store(
                "fetching edges",
                std::io::Error::new(std::io::ErrorKind::Other, "connection reset"),
            ))
        }

        let err = inner().context("building tree").unwrap_err();
        match err {
            BomError::Store { context, .. } => {
                assert_eq!(context, "building tree: fetching edges");
            }
            other => panic!("expected Store error, got {other:?}"),
        }
    }

    #[test]
    fn test_caller_facing_errors_keep_message() {
        let err: Result<()> = Err(BomError::invalid("bad mode"));
        let err = err.context("compare").unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument: bad mode");
    }

    #[test]
    fn test_with_context_lazy_evaluation() {
        let mut called = false;
        let ok_result: Result<i32> = Ok(42);
        let _ = ok_result.with_context(|| {
            called = true;
            "should not be called"
        });
        assert!(!called, "Closure should not be called for Ok result");
    }

    #[test]
    fn test_option_context() {
        let none_value: Option<i32> = None;
        match none_value.or_not_found("item", "X") {
            Err(BomError::NotFound { kind, id }) => {
                assert_eq!(kind, "item");
                assert_eq!(id, "X");
            }
            _ => panic!("Expected NotFound error"),
        }

        let some_value = Some(3);
        assert_eq!(some_value.or_invalid(|| "unused").unwrap(), 3);
    }

    #[test]
    fn test_chain_context_helper() {
        assert_eq!(chain_context("new", ""), "new");
        assert_eq!(chain_context("outer", "middle: inner"), "outer: middle: inner");
    }
}
