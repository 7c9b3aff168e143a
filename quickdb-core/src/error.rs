//! Error types for QuickDB operations.
//!
//! The value model (conversion, codec, builders) never fails: type mismatches
//! degrade to default values and unknown wire types decode to `Null`. Every
//! error in this module originates in the persistence layer.

use thiserror::Error;

/// Result type for QuickDB operations.
pub type QuickResult<T> = Result<T, QuickError>;

/// Errors that can occur while talking to the database.
#[derive(Error, Debug)]
pub enum QuickError {
    /// MongoDB driver error not attached to a specific operation.
    #[error("mongodb error: {0}")]
    Driver(#[from] mongodb::error::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// A collection operation failed inside the driver.
    #[error("failed to {operation}: {source}")]
    Operation {
        /// Human-readable name of the operation, e.g. "create document".
        operation: &'static str,
        /// The underlying driver error.
        #[source]
        source: mongodb::error::Error,
    },

    /// Invalid ObjectId.
    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    /// An argument was rejected before any I/O took place.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A transaction callback or commit failed; the transaction was aborted.
    #[error("transaction failed: {0}")]
    Transaction(String),

    /// GridFS error.
    #[error("gridfs error: {0}")]
    GridFs(String),

    /// Local I/O error (GridFS file transfer).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl QuickError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Wrap a driver error with the name of the failed operation.
    pub fn operation(operation: &'static str, source: mongodb::error::Error) -> Self {
        Self::Operation { operation, source }
    }

    /// Create an invalid object id error.
    pub fn invalid_object_id(message: impl Into<String>) -> Self {
        Self::InvalidObjectId(message.into())
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a transaction error.
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction(message.into())
    }

    /// Create a GridFS error.
    pub fn gridfs(message: impl Into<String>) -> Self {
        Self::GridFs(message.into())
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Check if this is a configuration error.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this error was produced by a failed transaction.
    pub fn is_transaction_error(&self) -> bool {
        matches!(self, Self::Transaction(_))
    }

    /// Check if the driver reported a duplicate key violation.
    pub fn is_duplicate_key(&self) -> bool {
        let source = match self {
            Self::Driver(e) | Self::Operation { source: e, .. } => e,
            _ => return false,
        };
        source.to_string().contains("duplicate key")
    }
}

impl From<bson::oid::Error> for QuickError {
    fn from(err: bson::oid::Error) -> Self {
        QuickError::InvalidObjectId(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = QuickError::config("invalid URI");
        assert!(err.is_config_error());

        let err = QuickError::connection("connection refused");
        assert!(err.is_connection_error());

        let err = QuickError::transaction("aborted");
        assert!(err.is_transaction_error());
        assert!(!err.is_duplicate_key());
    }

    #[test]
    fn test_error_display() {
        let err = QuickError::config("test error");
        assert_eq!(err.to_string(), "configuration error: test error");

        let err = QuickError::invalid_argument("no fields");
        assert_eq!(err.to_string(), "invalid argument: no fields");
    }

    #[test]
    fn test_from_oid_error() {
        let oid_err = bson::oid::ObjectId::parse_str("not-hex").unwrap_err();
        let err: QuickError = oid_err.into();
        assert!(matches!(err, QuickError::InvalidObjectId(_)));
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.bin");
        let err: QuickError = io.into();
        assert!(err.to_string().contains("missing.bin"));
    }
}
