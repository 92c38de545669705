//! Query execution orchestration
//!
//! Ties the pipeline together: validate the request, build the form body,
//! send it through the digest-authenticated client, then route the response
//! through the buffered parser or the disk-backed stream writer and
//! normalize both into one [`ResultEnvelope`].

use crate::auth::{DigestClient, RequestSpec};
use crate::config::ClientConfig;
use crate::error::{Error, Result, ValidationError};
use crate::multipart;
use crate::stream::StreamWriter;
use crate::types::{QueryType, ResultEnvelope};
use std::str::FromStr;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Evaluation endpoint path, relative to the configured server URL
const EVAL_PATH: &str = "/v1/eval";

/// One query to execute
#[derive(Clone, Debug)]
pub struct QueryRequest {
    /// Query text, submitted verbatim as a form value
    pub query: String,

    /// Query language name; validated against [`QueryType`]
    pub query_type: String,

    /// Content database identifier
    pub database: String,

    /// Modules database identifier, if the query imports library modules
    pub modules: Option<String>,

    /// Route the response through the disk-backed streaming path
    pub prefer_stream: bool,
}

impl QueryRequest {
    /// Create a buffered-mode request with no modules database
    pub fn new(
        query: impl Into<String>,
        query_type: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            query_type: query_type.into(),
            database: database.into(),
            modules: None,
            prefer_stream: false,
        }
    }
}

/// Executes queries against one configured evaluation endpoint
///
/// Holds the HTTP client, the stream writer, and a cancellation token.
/// Cancellation is cooperative: it is observed before a request is issued
/// and again when the response completes, never mid-read.
#[derive(Clone, Debug)]
pub struct QueryExecutor {
    config: ClientConfig,
    client: DigestClient,
    writer: StreamWriter,
    cancel: CancellationToken,
}

impl QueryExecutor {
    /// Create an executor from a configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the HTTP client cannot be constructed.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let writer = StreamWriter::new(config.stream_dir.clone());
        Ok(Self {
            config,
            client: DigestClient::new()?,
            writer,
            cancel: CancellationToken::new(),
        })
    }

    /// Token callers can use to cancel in-flight executions cooperatively
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Execute one query and normalize the response into an envelope
    ///
    /// Validation happens first and issues no network call on failure. The
    /// form body carries the query text under the key selected by its
    /// language, the database id, and optionally the modules id; the query
    /// text is never interpolated into a larger expression string.
    ///
    /// `prefer_stream` selects the handling mode: the streaming path
    /// demultiplexes the body to disk and returns a populated
    /// `stream_index` with empty `rows`; the buffered path parses records
    /// in memory and joins them for display.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] before any network call;
    /// [`Error::Network`] / [`Error::AuthUnsupported`] from the handshake;
    /// [`Error::HttpStatus`] on a non-2xx final status, carrying the
    /// response body as the message;
    /// [`Error::ResultTooLarge`] when the buffered join exceeds its budget
    /// (recoverable by re-running with `prefer_stream`);
    /// [`Error::Cancelled`] when the caller cancelled this execution.
    pub async fn execute(&self, request: &QueryRequest) -> Result<ResultEnvelope> {
        let query_type = validate(request)?;

        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let url = format!(
            "{}{}",
            self.config.server_url.trim_end_matches('/'),
            EVAL_PATH
        );
        let mut spec = RequestSpec::new(reqwest::Method::POST, url);
        spec.headers.push((
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        ));
        spec.body = Some(build_form_body(query_type, request));
        spec.credentials = self.config.credentials.clone();
        spec.timeout = if request.prefer_stream {
            self.config.stream_timeout
        } else {
            self.config.request_timeout
        };

        debug!(
            query_type = %query_type,
            database = %request.database,
            prefer_stream = request.prefer_stream,
            "executing query"
        );

        let response = self.client.send(&spec).await?;

        // In-flight cancellation is observed here, once the response has
        // completed, before any result processing touches disk.
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        if !response.is_success() {
            let message = if response.body.trim().is_empty() {
                format!("HTTP {}", response.status)
            } else {
                response.body.clone()
            };
            return Err(Error::HttpStatus {
                status: response.status,
                message,
            });
        }

        if request.prefer_stream {
            let index = self
                .writer
                .write_to_disk(&response.body, response.headers.content_type())
                .await?;
            info!(parts = index.parts.len(), "query streamed to disk");
            Ok(ResultEnvelope::streamed(index))
        } else {
            let rows = multipart::parse(&response.body);
            let formatted_text = multipart::safe_join(&rows)?;
            info!(records = rows.len(), "query buffered in memory");
            Ok(ResultEnvelope::buffered(rows, response.body, formatted_text))
        }
    }
}

/// Reject unusable requests before any network call
fn validate(request: &QueryRequest) -> Result<QueryType> {
    if request.query.trim().is_empty() {
        return Err(ValidationError::EmptyQuery.into());
    }
    if request.database.trim().is_empty() {
        return Err(ValidationError::NoDatabase.into());
    }
    Ok(QueryType::from_str(&request.query_type)?)
}

/// Build the URL-encoded form body for the evaluation endpoint
fn build_form_body(query_type: QueryType, request: &QueryRequest) -> String {
    let mut form = url::form_urlencoded::Serializer::new(String::new());
    form.append_pair(query_type.form_key(), &request.query);
    form.append_pair("database", request.database.trim());
    if let Some(modules) = &request.modules
        && !modules.trim().is_empty()
    {
        form.append_pair("modules", modules.trim());
    }
    form.finish()
}
