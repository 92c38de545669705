//! Core types for docdb-eval

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Query language accepted by the evaluation endpoint
///
/// The variant selects the form key under which the query text is submitted
/// (`xquery=...` or `javascript=...`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    /// Server-side XQuery evaluation
    Xquery,
    /// Server-side JavaScript evaluation
    Javascript,
}

impl QueryType {
    /// The form-body key carrying the query text for this language
    #[must_use]
    pub fn form_key(&self) -> &'static str {
        match self {
            QueryType::Xquery => "xquery",
            QueryType::Javascript => "javascript",
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.form_key())
    }
}

impl std::str::FromStr for QueryType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xquery" => Ok(QueryType::Xquery),
            "javascript" => Ok(QueryType::Javascript),
            _ => Err(ValidationError::UnsupportedQueryType {
                value: s.to_string(),
            }),
        }
    }
}

/// A single decoded part of a multipart response
///
/// When the response carries no multipart framing, the entire body becomes one
/// record with empty metadata fields. `content` is the raw textual payload;
/// all other fields default to the empty string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    /// MIME type of this part (per-part Content-Type header)
    #[serde(default)]
    pub content_type: String,

    /// Server-side primitive type of the value (X-Primitive header)
    #[serde(default)]
    pub primitive: String,

    /// Document URI the value originated from, if any (X-URI header)
    #[serde(default)]
    pub uri: String,

    /// Node path within the document, if any (X-Path header)
    #[serde(default)]
    pub path: String,

    /// Raw textual payload, byte-for-byte as received
    #[serde(default)]
    pub content: String,
}

/// Persisted metadata for one streamed part
///
/// Written once by [`StreamWriter`](crate::stream::StreamWriter), read many
/// times by the pagination reader.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartDescriptor {
    /// MIME type of this part
    #[serde(default)]
    pub content_type: String,

    /// Server-side primitive type of the value
    #[serde(default)]
    pub primitive: String,

    /// Document URI the value originated from, if any
    #[serde(default)]
    pub uri: String,

    /// Node path within the document, if any
    #[serde(default)]
    pub path: String,

    /// Content length in bytes
    pub bytes: u64,

    /// Filename holding the content, relative to the stream directory
    pub file: String,
}

/// Root manifest for a streamed response
///
/// Serialized as `index.json` inside its own directory after all parts are
/// materialized. The directory is unique per request, so concurrent queries
/// never share an index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamIndex {
    /// Absolute path of the directory holding the part files and this index
    pub dir: PathBuf,

    /// Descriptors for each part, in response order
    pub parts: Vec<PartDescriptor>,
}

/// A result record tagged with its absolute index in the full result set
///
/// The index is needed for UI navigation: a page starting at 50 still knows
/// each record's position within the whole streamed result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedRecord {
    /// Absolute position of this record within the full result set
    pub index: usize,

    /// The decoded record
    #[serde(flatten)]
    pub record: ResultRecord,
}

/// One page of records loaded from a stream directory
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSlice {
    /// The records in the requested slice, in result order
    pub records: Vec<PagedRecord>,

    /// Total number of records in the full result set
    pub total: usize,
}

/// Response-handling strategy chosen for a query execution
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultMode {
    /// Fully materialized in memory
    Buffer,
    /// Demultiplexed to disk, paged through a stream index
    Stream,
}

/// Uniform output of a query execution
///
/// Invariant: when `mode` is [`ResultMode::Stream`], `rows` is empty and
/// `stream_index` is populated; when `mode` is [`ResultMode::Buffer`],
/// `stream_index` is `None` and `rows`/`raw_text` are populated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope {
    /// How the response body was handled
    pub mode: ResultMode,

    /// Decoded records (buffer mode only)
    pub rows: Vec<ResultRecord>,

    /// The raw response body (buffer mode only)
    pub raw_text: String,

    /// Newline-joined record contents for plain-text display (buffer mode only)
    pub formatted_text: String,

    /// Number of records in the result set
    pub total_records: usize,

    /// Manifest for the on-disk result (stream mode only)
    pub stream_index: Option<StreamIndex>,
}

impl ResultEnvelope {
    /// Build a buffer-mode envelope from decoded records
    #[must_use]
    pub fn buffered(rows: Vec<ResultRecord>, raw_text: String, formatted_text: String) -> Self {
        let total_records = rows.len();
        Self {
            mode: ResultMode::Buffer,
            rows,
            raw_text,
            formatted_text,
            total_records,
            stream_index: None,
        }
    }

    /// Build a stream-mode envelope from a persisted index
    #[must_use]
    pub fn streamed(index: StreamIndex) -> Self {
        let total_records = index.parts.len();
        Self {
            mode: ResultMode::Stream,
            rows: Vec::new(),
            raw_text: String::new(),
            formatted_text: String::new(),
            total_records,
            stream_index: Some(index),
        }
    }
}
