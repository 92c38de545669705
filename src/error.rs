//! Error types for docdb-eval
//!
//! This module provides error handling for the library, including:
//! - Request validation errors (caught before any network call)
//! - Network and HTTP status failures from the evaluation endpoint
//! - Resource-limit errors for the buffered result path
//! - Stream-index errors for the paged result path

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for docdb-eval operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for docdb-eval
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Request rejected before a network call was issued
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Network error (connection failure, timeout); surfaced verbatim, not retried
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server issued an authentication challenge this client cannot answer
    #[error("unsupported authentication scheme: {scheme}")]
    AuthUnsupported {
        /// The scheme token from the WWW-Authenticate header (e.g., "Basic")
        scheme: String,
    },

    /// Final HTTP status was not 2xx
    #[error("request failed with status {status}: {message}")]
    HttpStatus {
        /// The HTTP status code of the final response
        status: u16,
        /// The response body, or the status line when the body is empty
        message: String,
    },

    /// Buffered concatenation exceeded the safe in-memory threshold
    ///
    /// Recoverable: re-run the query with streaming enabled.
    #[error("joined result exceeds {limit} characters; switch to streaming")]
    ResultTooLarge {
        /// The character limit that was exceeded
        limit: usize,
    },

    /// Pagination requested against a missing or incomplete stream directory
    #[error("stream index not found in {dir}")]
    IndexNotFound {
        /// The directory that was expected to contain index.json
        dir: PathBuf,
    },

    /// The caller cancelled the query before its result was processed
    #[error("query cancelled")]
    Cancelled,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Request validation errors
///
/// All of these are detected before any network call is issued.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Query text is empty or whitespace-only
    #[error("query text is empty")]
    EmptyQuery,

    /// No content database was selected
    #[error("no database selected")]
    NoDatabase,

    /// Query type is not one of the supported languages
    #[error("unsupported query type: {value}")]
    UnsupportedQueryType {
        /// The unrecognized query type string supplied by the caller
        value: String,
    },
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_converts_to_error() {
        let err: Error = ValidationError::EmptyQuery.into();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::EmptyQuery)
        ));
    }

    #[test]
    fn display_messages_carry_context() {
        let err = Error::HttpStatus {
            status: 500,
            message: "XDMP-UNDFUN: Undefined function".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("XDMP-UNDFUN"));

        let err = Error::AuthUnsupported {
            scheme: "Basic".to_string(),
        };
        assert!(err.to_string().contains("Basic"));

        let err = Error::IndexNotFound {
            dir: PathBuf::from("/tmp/result-17"),
        };
        assert!(err.to_string().contains("/tmp/result-17"));
    }

    #[test]
    fn result_too_large_names_the_limit() {
        let err = Error::ResultTooLarge { limit: 5_000_000 };
        assert!(err.to_string().contains("5000000"));
    }

    #[test]
    fn unsupported_query_type_names_the_value() {
        let err: Error = ValidationError::UnsupportedQueryType {
            value: "sparql".to_string(),
        }
        .into();
        assert!(err.to_string().contains("sparql"));
    }

    #[test]
    fn io_error_converts_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
