//! The shared error taxonomy.

use thiserror::Error;

/// Errors surfaced by the query layer.
///
/// Compiler-level errors (`UnsupportedType`, `UnsupportedOperation`,
/// `InvalidObjectId`) are always detected before any backend I/O is
/// issued. `Backend` wraps an execution error from a live connection
/// unchanged; nothing in this crate retries or swallows it.
#[derive(Debug, Error)]
pub enum Error {
    /// A value cannot be represented in the value model or mapped to a
    /// backend's native type.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// The requested operation has no valid lowering for the target
    /// dialect, column type, or connection kind.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A primary-key projection is incomplete or a document id failed to
    /// parse, so no single row/document can be addressed.
    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    /// A point lookup by primary key matched nothing.
    #[error("object not found")]
    ObjectNotFound,

    /// A backend call failed; the underlying error is passed through.
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Create an `UnsupportedType` error.
    pub fn unsupported_type(message: impl Into<String>) -> Self {
        Error::UnsupportedType(message.into())
    }

    /// Create an `UnsupportedOperation` error.
    pub fn unsupported_operation(message: impl Into<String>) -> Self {
        Error::UnsupportedOperation(message.into())
    }

    /// Create an `InvalidObjectId` error.
    pub fn invalid_object_id(message: impl Into<String>) -> Self {
        Error::InvalidObjectId(message.into())
    }

    /// Wrap a backend execution error.
    pub fn backend(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Backend(source.into())
    }
}
