//! Disk-backed streaming of multipart responses
//!
//! The streaming path trades one-time disk I/O for bounded memory: each
//! multipart segment is demultiplexed straight from the body to its own
//! `part-<n>.txt` file, and a `StreamIndex` manifest is persisted as
//! `index.json` once every part is on disk. At no point is the full response
//! materialized as a list of in-memory records.

use crate::error::{Error, Result};
use crate::multipart;
use crate::types::{PartDescriptor, StreamIndex};
use chrono::Utc;
use std::path::PathBuf;
use tracing::{debug, info};

/// Manifest filename inside a stream directory
pub(crate) const INDEX_FILE: &str = "index.json";

/// Maximum collision bumps when allocating a result directory
const MAX_DIR_ATTEMPTS: u32 = 9999;

/// Writes one response body to a uniquely named directory of part files
#[derive(Clone, Debug)]
pub struct StreamWriter {
    root: PathBuf,
}

impl StreamWriter {
    /// Create a writer rooted at the given directory
    ///
    /// The root is created on first use; each response gets its own
    /// timestamp-keyed subdirectory beneath it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Demultiplex a response body to disk and persist its index
    ///
    /// The boundary is taken from the response's Content-Type header when it
    /// declares one, otherwise discovered in the body. Each surviving
    /// segment (empty and outer-wrapper segments are skipped, as in the
    /// buffered parser) is written sequentially to `part-<n>.txt`,
    /// preserving record order. `index.json` is written atomically last, so
    /// a directory containing an index under that name is always complete.
    /// A body with no discoverable boundary becomes a single `part-0.txt`
    /// with empty metadata.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] on directory or file write failure;
    /// [`Error::Serialization`] if the index cannot be encoded.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use docdb_eval::StreamWriter;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let writer = StreamWriter::new("./stream-results");
    /// let body = "--sep\r\nContent-Type: text/plain\r\n\r\nvalue\r\n--sep--";
    /// let index = writer
    ///     .write_to_disk(body, "multipart/mixed; boundary=sep")
    ///     .await?;
    /// println!("{} parts in {}", index.parts.len(), index.dir.display());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn write_to_disk(&self, body: &str, content_type: &str) -> Result<StreamIndex> {
        let dir = self.create_result_dir().await?;

        let boundary = multipart::boundary_from_content_type(content_type)
            .or_else(|| multipart::find_boundary(body));
        let splitter = boundary
            .as_deref()
            .and_then(multipart::boundary_splitter);

        let mut parts: Vec<PartDescriptor> = Vec::new();
        match splitter {
            Some(re) => {
                for segment in re.split(body) {
                    if segment.trim().is_empty() || multipart::is_wrapper_segment(segment) {
                        continue;
                    }
                    let record = multipart::parse_segment(segment);
                    let file = format!("part-{}.txt", parts.len());
                    tokio::fs::write(dir.join(&file), record.content.as_bytes()).await?;
                    debug!(file = %file, bytes = record.content.len(), "wrote stream part");
                    parts.push(PartDescriptor {
                        content_type: record.content_type,
                        primitive: record.primitive,
                        uri: record.uri,
                        path: record.path,
                        bytes: record.content.len() as u64,
                        file,
                    });
                }
            }
            None => {
                let file = "part-0.txt".to_string();
                tokio::fs::write(dir.join(&file), body.as_bytes()).await?;
                parts.push(PartDescriptor {
                    content_type: String::new(),
                    primitive: String::new(),
                    uri: String::new(),
                    path: String::new(),
                    bytes: body.len() as u64,
                    file,
                });
            }
        }

        let index = StreamIndex {
            dir: dir.clone(),
            parts,
        };
        self.write_index(&index).await?;
        info!(dir = %dir.display(), parts = index.parts.len(), "streamed response to disk");

        Ok(index)
    }

    /// Allocate a fresh, uniquely named directory for one response
    ///
    /// Keyed by the current timestamp; two executions within the same
    /// millisecond get distinct directories via a bump suffix.
    async fn create_result_dir(&self) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.root).await?;
        let stamp = Utc::now().timestamp_millis();

        for attempt in 0..MAX_DIR_ATTEMPTS {
            let name = if attempt == 0 {
                format!("result-{stamp}")
            } else {
                format!("result-{stamp}-{attempt}")
            };
            let candidate = self.root.join(name);
            match tokio::fs::create_dir(&candidate).await {
                // Canonicalize so the persisted index carries an absolute path
                Ok(()) => return Ok(tokio::fs::canonicalize(&candidate).await?),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::Io(std::io::Error::other(format!(
            "could not allocate a unique stream directory under {}",
            self.root.display()
        ))))
    }

    /// Write `index.json` atomically: temp file first, then rename
    async fn write_index(&self, index: &StreamIndex) -> Result<()> {
        let json = serde_json::to_vec_pretty(index)?;
        let tmp = index.dir.join("index.json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, index.dir.join(INDEX_FILE)).await?;
        Ok(())
    }
}
