//! Error types for the sift crate.

use thiserror::Error;

use crate::key::Key;

/// Errors raised by collection operations and dynamic dispatch.
///
/// Every error is structural and fail-fast: nothing in the crate retries or
/// swallows one.
#[derive(Debug, Error)]
pub enum SiftError {
    /// A call resolved to neither a builtin nor a registered macro.
    #[error("method {type_name}::{method} does not exist")]
    UnknownOperation { type_name: String, method: String },

    /// A property-style access named an operation outside the proxy allow-list.
    #[error("property [{property}] does not exist on this collection instance")]
    UndeclaredProxyProperty { property: String },

    /// `ensure` found an item of a type outside the allowed set.
    #[error(
        "collection should only include [{types}] items, but '{found}' found at position {position}",
        types = .allowed.join(", ")
    )]
    TypeMismatch {
        allowed: Vec<String>,
        found: String,
        position: Key,
    },

    /// The `reduce_spread` reducer returned something other than an array of
    /// the accumulator arity.
    #[error("{type_name}::reduce_spread expects the reducer to return an array, got '{found}' instead")]
    ReduceShape {
        type_name: &'static str,
        found: String,
    },

    /// A grouping callback produced something other than a single key/value pair.
    #[error("grouping callback must return exactly one key/value pair, got '{found}'")]
    GroupShape { found: String },

    /// A value that cannot be used as a collection key.
    #[error("illegal offset type: {found}")]
    IllegalOffset { found: String },

    /// A dynamic call received arguments it cannot interpret.
    #[error("invalid argument for {method}: {reason}")]
    InvalidArgument { method: String, reason: String },

    /// JSON encoding or decoding failed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A NaN or infinite float cannot be written as JSON.
    #[error("{value} cannot be encoded as JSON")]
    NonFiniteNumber { value: f64 },

    /// Decoded JSON nests deeper than the requested depth.
    #[error("maximum nesting depth of {depth} exceeded")]
    DepthExceeded { depth: usize },
}

impl SiftError {
    /// Builds the typed "method not found" signal.
    pub fn unknown_operation(type_name: impl Into<String>, method: impl Into<String>) -> Self {
        SiftError::UnknownOperation {
            type_name: type_name.into(),
            method: method.into(),
        }
    }

    pub(crate) fn invalid_argument(method: &str, reason: impl Into<String>) -> Self {
        SiftError::InvalidArgument {
            method: method.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is an [`SiftError::UnknownOperation`] for the
    /// given receiver type and method.
    ///
    /// Call forwarders use this to tell "the target has no such method" apart
    /// from failures raised inside the method itself.
    pub fn is_unknown_operation(&self, type_name: &str, method: &str) -> bool {
        matches!(
            self,
            SiftError::UnknownOperation { type_name: t, method: m } if t == type_name && m == method
        )
    }
}

/// Result type for sift operations.
pub type Result<T> = std::result::Result<T, SiftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_mismatch_message_lists_allowed_types() {
        let err = SiftError::TypeMismatch {
            allowed: vec!["int".into(), "float".into()],
            found: "string".into(),
            position: Key::Int(2),
        };
        assert_eq!(
            err.to_string(),
            "collection should only include [int, float] items, but 'string' found at position 2"
        );
    }

    #[test]
    fn unknown_operation_is_matched_structurally() {
        let err = SiftError::unknown_operation("Collection", "double");
        assert!(err.is_unknown_operation("Collection", "double"));
        assert!(!err.is_unknown_operation("Collection", "triple"));
        assert_eq!(err.to_string(), "method Collection::double does not exist");
    }
}
