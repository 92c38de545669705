//! Multipart/mixed response parsing
//!
//! The evaluation endpoint frames mixed-type results as `multipart/mixed`
//! with per-part `Content-Type`, `X-Primitive`, `X-URI`, and `X-Path`
//! headers. This module covers exactly that subset: boundary discovery,
//! segment splitting, per-segment header parsing, and a bounded join helper
//! for plain-text display.
//!
//! Parsing never fails. Malformed framing degrades to a single whole-body
//! record rather than raising an error.

use crate::error::{Error, Result};
use crate::types::ResultRecord;
use regex::Regex;
use tracing::debug;

/// Character budget for [`safe_join`]; exceeding it raises
/// [`Error::ResultTooLarge`] instead of growing an unbounded in-memory string.
pub const MAX_JOINED_LEN: usize = 5_000_000;

/// Extract a multipart boundary token from a Content-Type header value
///
/// Accepts both quoted (`boundary="abc-123"`) and unquoted
/// (`boundary=abc-123`) declarations, case-insensitively. Returns `None`
/// unless the value declares a `multipart/*` type with a boundary parameter.
#[must_use]
pub fn boundary_from_content_type(value: &str) -> Option<String> {
    if !value.to_ascii_lowercase().contains("multipart/") {
        return None;
    }
    let re = Regex::new(r#"(?i)boundary\s*=\s*"?([^";\s]+)"?"#).ok()?;
    re.captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Discover the boundary token for a response body
///
/// First scans the leading header block (text before the first blank line)
/// for a `Content-Type: multipart/...; boundary=...` declaration; if absent,
/// falls back to scanning for a `--<token>` line (possibly the closing
/// `--<token>--` form). Returns `None` when the body carries no recognizable
/// multipart framing.
#[must_use]
pub fn find_boundary(body: &str) -> Option<String> {
    // Header-block declaration takes precedence
    let head = split_at_blank_line(body)
        .map(|(head, _)| head)
        .unwrap_or(body);
    for line in head.lines() {
        if let Some((name, value)) = line.split_once(':')
            && name.trim().eq_ignore_ascii_case("content-type")
            && let Some(boundary) = boundary_from_content_type(value)
        {
            return Some(boundary);
        }
    }

    // Fall back to the first dash-dash delimiter line in the body
    let re = Regex::new(r"(?m)^--(\S+?)(?:--)?\s*$").ok()?;
    re.captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parse a complete response body into an ordered sequence of records
///
/// Never fails: a body with no discoverable boundary becomes a single record
/// whose `content` equals the input byte-for-byte, with empty metadata.
/// Empty or whitespace-only segments are discarded, as are outer-wrapper
/// segments whose own header block declares a `multipart/*` type.
///
/// # Examples
///
/// ```
/// use docdb_eval::multipart::parse;
///
/// let records = parse("--b\r\nContent-Type: text/plain\r\n\r\nhello\r\n--b--");
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].content, "hello");
/// assert_eq!(records[0].content_type, "text/plain");
/// ```
#[must_use]
pub fn parse(body: &str) -> Vec<ResultRecord> {
    let Some(boundary) = find_boundary(body) else {
        return vec![whole_body_record(body)];
    };

    let Some(re) = boundary_splitter(&boundary) else {
        return vec![whole_body_record(body)];
    };

    let records: Vec<ResultRecord> = re
        .split(body)
        .filter(|segment| !segment.trim().is_empty())
        .filter(|segment| !is_wrapper_segment(segment))
        .map(parse_segment)
        .collect();

    debug!(boundary = %boundary, records = records.len(), "parsed multipart body");
    records
}

/// Concatenate record contents with newline separators for plain-text display
///
/// Aborts with [`Error::ResultTooLarge`] once the running total would exceed
/// [`MAX_JOINED_LEN`]; a total of exactly the limit succeeds. The limit caps
/// the memory a buffered join can consume regardless of result size.
pub fn safe_join(records: &[ResultRecord]) -> Result<String> {
    let mut total = 0usize;
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            total += 1;
        }
        total += record.content.len();
        if total > MAX_JOINED_LEN {
            return Err(Error::ResultTooLarge {
                limit: MAX_JOINED_LEN,
            });
        }
    }

    let mut joined = String::with_capacity(total);
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            joined.push('\n');
        }
        joined.push_str(&record.content);
    }
    Ok(joined)
}

/// Compile the segment splitter for a boundary token
///
/// The pattern consumes the line terminator preceding each delimiter, so a
/// segment's content round-trips byte-for-byte without a trailing newline
/// from the framing.
pub(crate) fn boundary_splitter(boundary: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?:\r?\n)?--{}(?:--)?", regex::escape(boundary))).ok()
}

/// True when a segment's own header block declares a `multipart/*` type
///
/// Such segments are outer wrappers around nested parts, not leaf records.
/// A segment with no blank line is scanned whole: the preamble before the
/// first delimiter loses its trailing blank line to the splitter but must
/// still be recognized as the outer wrapper.
pub(crate) fn is_wrapper_segment(segment: &str) -> bool {
    let head = split_at_blank_line(segment)
        .map(|(head, _)| head)
        .unwrap_or(segment);
    let (content_type, ..) = parse_header_block(head);
    content_type
        .trim()
        .to_ascii_lowercase()
        .starts_with("multipart/")
}

/// Parse one boundary-delimited segment into a record
///
/// The first blank-line-delimited block is the header block; everything
/// after the blank line is `content`, verbatim. A segment with no blank line
/// is treated as all content with empty metadata.
pub(crate) fn parse_segment(segment: &str) -> ResultRecord {
    match split_at_blank_line(segment) {
        Some((head, content)) => {
            let (content_type, primitive, uri, path) = parse_header_block(head);
            ResultRecord {
                content_type,
                primitive,
                uri,
                path,
                content: content.to_string(),
            }
        }
        None => ResultRecord {
            content: strip_leading_newline(segment).to_string(),
            ..Default::default()
        },
    }
}

fn whole_body_record(body: &str) -> ResultRecord {
    ResultRecord {
        content: body.to_string(),
        ..Default::default()
    }
}

/// Split at the first blank line (CRLF-CRLF or LF-LF), whichever comes first
///
/// Returns the text before the blank line and the text after it, with the
/// blank line itself consumed. `None` when no blank line exists.
pub(crate) fn split_at_blank_line(text: &str) -> Option<(&str, &str)> {
    let crlf = text.find("\r\n\r\n").map(|i| (i, i + 4));
    let lf = text.find("\n\n").map(|i| (i, i + 2));
    let (start, end) = match (crlf, lf) {
        (Some(a), Some(b)) => {
            if a.0 <= b.0 {
                a
            } else {
                b
            }
        }
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };
    Some((&text[..start], &text[end..]))
}

/// Parse the recognized headers out of a header block, case-insensitively
///
/// Returns `(content_type, primitive, uri, path)`; unrecognized lines are
/// ignored, missing headers default to empty.
fn parse_header_block(head: &str) -> (String, String, String, String) {
    let mut content_type = String::new();
    let mut primitive = String::new();
    let mut uri = String::new();
    let mut path = String::new();

    for line in head.lines() {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "content-type" => content_type = value.to_string(),
            "x-primitive" => primitive = value.to_string(),
            "x-uri" => uri = value.to_string(),
            "x-path" => path = value.to_string(),
            _ => {}
        }
    }

    (content_type, primitive, uri, path)
}

fn strip_leading_newline(s: &str) -> &str {
    s.strip_prefix("\r\n")
        .or_else(|| s.strip_prefix('\n'))
        .unwrap_or(s)
}
