//! Paged reads from a persisted stream directory
//!
//! Given a directory produced by [`StreamWriter`](crate::stream::StreamWriter),
//! loads a requested slice of records from disk. Only the part files in the
//! slice are read, so per-call memory is bounded by the page size no matter
//! how large the full result set is.

use crate::error::{Error, Result};
use crate::stream::INDEX_FILE;
use crate::types::{PageSlice, PagedRecord, ResultRecord, StreamIndex};
use std::path::Path;
use tracing::debug;

/// Load a slice of records from a stream directory
///
/// `start` and `count` are clamped to the result set: a `start` past the end
/// yields an empty page, and `count` is truncated at the last record. Each
/// returned record carries its absolute index within the full result set for
/// UI navigation.
///
/// # Errors
///
/// [`Error::IndexNotFound`] when `index.json` is absent (missing directory,
/// or a crash left the stream incomplete); [`Error::Io`] when a part file
/// listed in the index cannot be read.
pub async fn read_slice(dir: &Path, start: usize, count: usize) -> Result<PageSlice> {
    let index_path = dir.join(INDEX_FILE);
    let raw = match tokio::fs::read_to_string(&index_path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::IndexNotFound {
                dir: dir.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };
    let index: StreamIndex = serde_json::from_str(&raw)?;

    let total = index.parts.len();
    let first = start.min(total);
    let last = first.saturating_add(count).min(total);

    let mut records = Vec::with_capacity(last - first);
    for (offset, part) in index.parts[first..last].iter().enumerate() {
        // Resolve against the directory the caller handed us, not the
        // recorded absolute path, so a relocated stream tree stays readable.
        let content = tokio::fs::read_to_string(dir.join(&part.file)).await?;
        records.push(PagedRecord {
            index: first + offset,
            record: ResultRecord {
                content_type: part.content_type.clone(),
                primitive: part.primitive.clone(),
                uri: part.uri.clone(),
                path: part.path.clone(),
                content,
            },
        });
    }

    debug!(
        dir = %dir.display(),
        start = first,
        returned = records.len(),
        total,
        "read stream slice"
    );

    Ok(PageSlice { records, total })
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PartDescriptor;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Materialize a three-part stream directory by hand
    fn write_fixture(dir: &Path) {
        let contents = ["<a>one</a>", "{\"b\": 2}", "three"];
        let mut parts = Vec::new();
        for (i, content) in contents.iter().enumerate() {
            let file = format!("part-{i}.txt");
            std::fs::write(dir.join(&file), content).unwrap();
            parts.push(PartDescriptor {
                content_type: "text/plain".to_string(),
                primitive: String::new(),
                uri: format!("/docs/{i}"),
                path: String::new(),
                bytes: content.len() as u64,
                file,
            });
        }
        let index = StreamIndex {
            dir: dir.to_path_buf(),
            parts,
        };
        std::fs::write(
            dir.join(INDEX_FILE),
            serde_json::to_vec_pretty(&index).unwrap(),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn first_page_of_three() {
        let temp = TempDir::new().unwrap();
        write_fixture(temp.path());

        let page = read_slice(temp.path(), 0, 2).await.unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].index, 0);
        assert_eq!(page.records[0].record.content, "<a>one</a>");
        assert_eq!(page.records[1].index, 1);
        assert_eq!(page.records[1].record.content, "{\"b\": 2}");
    }

    #[tokio::test]
    async fn oversized_count_is_clamped() {
        let temp = TempDir::new().unwrap();
        write_fixture(temp.path());

        let page = read_slice(temp.path(), 2, 50).await.unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].index, 2);
        assert_eq!(page.records[0].record.content, "three");
        assert_eq!(page.records[0].record.uri, "/docs/2");
    }

    #[tokio::test]
    async fn start_past_end_yields_empty_page() {
        let temp = TempDir::new().unwrap();
        write_fixture(temp.path());

        let page = read_slice(temp.path(), 10, 5).await.unwrap();

        assert_eq!(page.total, 3);
        assert!(page.records.is_empty());
    }

    #[tokio::test]
    async fn missing_index_reports_index_not_found() {
        let temp = TempDir::new().unwrap();

        let err = read_slice(temp.path(), 0, 10).await.unwrap_err();
        match err {
            Error::IndexNotFound { dir } => assert_eq!(dir, temp.path()),
            other => panic!("expected IndexNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_directory_reports_index_not_found() {
        let missing = PathBuf::from("/nonexistent/stream/result-0");
        let err = read_slice(&missing, 0, 1).await.unwrap_err();
        assert!(matches!(err, Error::IndexNotFound { .. }));
    }
}
