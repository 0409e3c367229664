//! Error types for store operations.

use crate::{Path, Seg};
use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by accessors, mutators and the lifecycle handlers.
///
/// Every error leaves the store exactly as it was before the call.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Traversal reached a scalar where a map or list was required.
    #[error("invalid path {path}: cannot step into {segment} of a scalar")]
    InvalidPath {
        /// The full path being traversed.
        path: Path,
        /// The segment that could not be followed.
        segment: Seg,
    },

    /// The node at the path has the wrong kind for the operation.
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        /// The path of the offending node.
        path: Path,
        /// The kind the operation needs.
        expected: &'static str,
        /// The kind actually found (`"missing"` for an absent node).
        found: &'static str,
    },

    /// A list index past the end of the list.
    #[error("index {index} out of bounds (len: {len}) at path {path}")]
    IndexOutOfBounds {
        /// The path being written.
        path: Path,
        /// The index that was requested.
        index: usize,
        /// The length of the list.
        len: usize,
    },

    /// A seek recording is missing a field or has it in the wrong shape.
    #[error("malformed recording: missing or invalid `{field}`")]
    MalformedRecording {
        /// Dotted location of the field, e.g. `initialState[2].path`.
        field: String,
    },
}

impl StoreError {
    #[inline]
    pub fn invalid_path(path: Path, segment: Seg) -> Self {
        StoreError::InvalidPath { path, segment }
    }

    #[inline]
    pub fn type_mismatch(path: Path, expected: &'static str, found: &'static str) -> Self {
        StoreError::TypeMismatch {
            path,
            expected,
            found,
        }
    }

    #[inline]
    pub fn index_out_of_bounds(path: Path, index: usize, len: usize) -> Self {
        StoreError::IndexOutOfBounds { path, index, len }
    }

    #[inline]
    pub fn malformed_recording(field: impl Into<String>) -> Self {
        StoreError::MalformedRecording {
            field: field.into(),
        }
    }
}

/// Kind name of a plain JSON value, matching [`StateTree::kind_name`](crate::StateTree::kind_name).
#[inline]
pub fn value_kind_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "list",
        serde_json::Value::Object(_) => "map",
    }
}
