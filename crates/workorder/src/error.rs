//! Error types for workorder.
//!
//! This module defines all error types used throughout the workorder crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// Marker the language-model API uses when the transcript no longer fits.
const CONTEXT_LENGTH_EXCEEDED: &str = "context_length_exceeded";

/// The main error type for workorder operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Model API Errors ===
    /// The HTTP request to the model API failed.
    #[error("model API request failed: {0}")]
    ModelTransport(#[from] reqwest::Error),

    /// The model API answered with a non-success status.
    #[error("model API returned HTTP {status}: {body}")]
    ModelApi {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the API.
        body: String,
    },

    /// The model API answered without any message content.
    #[error("model API returned an empty reply")]
    EmptyReply,

    // === Order Errors ===
    /// The generation marker was present but no payload followed it.
    #[error("generation marker found without a JSON payload")]
    MissingPayload,

    /// The payload after the generation marker is not a valid order.
    #[error("invalid work order payload: {0}")]
    InvalidOrder(String),

    /// A logo data URI could not be decoded.
    #[error("invalid logo data: {0}")]
    InvalidLogo(String),

    // === Document Errors ===
    /// The PDF could not be produced.
    #[error("document rendering failed: {0}")]
    Document(String),

    /// A download was requested for a name that is not a plain file name.
    #[error("invalid file name: {0}")]
    InvalidFileName(String),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for workorder operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a new document rendering error.
    #[must_use]
    pub fn document(message: impl Into<String>) -> Self {
        Self::Document(message.into())
    }

    /// Create a new invalid order error.
    #[must_use]
    pub fn invalid_order(message: impl Into<String>) -> Self {
        Self::InvalidOrder(message.into())
    }

    /// Create a new invalid logo error.
    #[must_use]
    pub fn invalid_logo(message: impl Into<String>) -> Self {
        Self::InvalidLogo(message.into())
    }

    /// Check if this error means the conversation outgrew the model's context window.
    #[must_use]
    pub fn is_context_length_exceeded(&self) -> bool {
        match self {
            Self::ModelApi { body, .. } => body.contains(CONTEXT_LENGTH_EXCEEDED),
            other => other.to_string().contains(CONTEXT_LENGTH_EXCEEDED),
        }
    }

    /// Check if this error is a missing file.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::EmptyReply;
        assert_eq!(err.to_string(), "model API returned an empty reply");

        let err = Error::document("bad font");
        assert_eq!(err.to_string(), "document rendering failed: bad font");
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
    }

    #[test]
    fn test_model_api_error_display() {
        let err = Error::ModelApi {
            status: 429,
            body: "rate limited".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("429"));
        assert!(msg.contains("rate limited"));
    }

    #[test]
    fn test_context_length_exceeded_detection() {
        let err = Error::ModelApi {
            status: 400,
            body: r#"{"error":{"code":"context_length_exceeded"}}"#.to_string(),
        };
        assert!(err.is_context_length_exceeded());

        let err = Error::ModelApi {
            status: 500,
            body: "upstream failure".to_string(),
        };
        assert!(!err.is_context_length_exceeded());
        assert!(!Error::EmptyReply.is_context_length_exceeded());
    }

    #[test]
    fn test_is_not_found() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(err.is_not_found());

        let err: Error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no").into();
        assert!(!err.is_not_found());

        assert!(!Error::InvalidFileName("../x".to_string()).is_not_found());
    }

    #[test]
    fn test_invalid_order_display() {
        let err = Error::invalid_order("expected object");
        assert!(err.to_string().contains("expected object"));
    }

    #[test]
    fn test_invalid_logo_display() {
        let err = Error::invalid_logo("not a data URI");
        assert!(err.to_string().contains("not a data URI"));
    }

    #[test]
    fn test_missing_payload_display() {
        assert!(Error::MissingPayload.to_string().contains("marker"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "invalid interval".to_string(),
        };
        assert!(err.to_string().contains("invalid interval"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
