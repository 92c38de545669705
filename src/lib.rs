//! # docdb-eval
//!
//! Backend library for desktop clients of a document-database
//! query-evaluation endpoint.
//!
//! ## Design Philosophy
//!
//! docdb-eval is designed to be:
//! - **Memory-bounded** - Responses from a few bytes to hundreds of
//!   megabytes are handled without unbounded buffering
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Self-contained auth** - The Digest challenge/response handshake is
//!   handled internally; credentials never appear in logs
//!
//! ## Quick Start
//!
//! ```no_run
//! use docdb_eval::{ClientConfig, Credentials, QueryExecutor, QueryRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig {
//!         server_url: "http://localhost:8000".to_string(),
//!         credentials: Some(Credentials::new("admin", "admin")),
//!         ..Default::default()
//!     };
//!
//!     let executor = QueryExecutor::new(config)?;
//!     let request = QueryRequest::new("collection()", "xquery", "Documents");
//!     let envelope = executor.execute(&request).await?;
//!
//!     println!("{} records", envelope.total_records);
//!     Ok(())
//! }
//! ```
//!
//! ## Buffered vs. streamed results
//!
//! Small results are buffered in memory and returned as decoded rows. For
//! large results, set `prefer_stream` on the request: each multipart part is
//! written to its own file on disk and the envelope carries a
//! [`StreamIndex`] instead of rows. Pages are then loaded on demand with
//! [`pagination::read_slice`], bounding memory to the page size.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Digest-authenticated request issuance
pub mod auth;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Query execution orchestration
pub mod executor;
/// Case-insensitive response headers
pub mod headers;
/// Multipart/mixed response parsing
pub mod multipart;
/// Paged reads from persisted stream directories
pub mod pagination;
/// Disk-backed response streaming
pub mod stream;
/// Core types
pub mod types;

// Re-export commonly used types
pub use auth::{DigestClient, HttpResponse, RequestSpec};
pub use config::{ClientConfig, Credentials};
pub use error::{Error, Result, ValidationError};
pub use executor::{QueryExecutor, QueryRequest};
pub use headers::ResponseHeaders;
pub use pagination::read_slice;
pub use stream::StreamWriter;
pub use types::{
    PageSlice, PagedRecord, PartDescriptor, QueryType, ResultEnvelope, ResultMode, ResultRecord,
    StreamIndex,
};
