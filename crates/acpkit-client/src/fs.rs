//! Text-file operations with line slicing.
//!
//! The slicing policy is pure ([`slice_lines`]) so it can be tested without
//! a disk; [`LocalFileSystem`] wires it to `tokio::fs` for clients that
//! host a real workspace.

use tokio::io::ErrorKind;

use acpkit_protocol::{
    AcpError, DEFAULT_ENCODING, ReadTextFileRequest, ReadTextFileResponse, Result,
    WriteTextFileRequest, WriteTextFileResponse,
};

/// Outcome of slicing a file's content by line range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceResult {
    /// Selected lines joined by `\n` (the full text when no range given)
    pub content: String,
    /// Total number of lines in the file
    pub total_lines: u32,
    /// True when a strict subset of the file was returned
    pub truncated: bool,
}

/// Slice text by a 1-indexed, inclusive line range.
///
/// Bounds truncate to the file length: a file of N lines answers
/// `(s, e)` with lines `s..=min(e, N)` joined by `\n`, and `truncated`
/// is true exactly when that is a strict subset of the file. Without a
/// range the text passes through unchanged.
#[must_use]
pub fn slice_lines(content: &str, start_line: Option<u32>, end_line: Option<u32>) -> SliceResult {
    let lines: Vec<&str> = content.lines().collect();
    let total_lines = lines.len() as u32;

    if start_line.is_none() && end_line.is_none() {
        return SliceResult {
            content: content.to_string(),
            total_lines,
            truncated: false,
        };
    }

    let start = start_line.unwrap_or(1).max(1);
    let end = end_line.unwrap_or(total_lines).min(total_lines);

    let selected = if start > end {
        String::new()
    } else {
        lines[(start - 1) as usize..end as usize].join("\n")
    };
    let truncated = !(start <= 1 && end >= total_lines);

    SliceResult {
        content: selected,
        total_lines,
        truncated,
    }
}

/// File operations backed by the local disk
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    /// Create a local file-system adapter
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Serve `fs/read_text_file`: read, decode as UTF-8, slice by line
    pub async fn read(&self, request: &ReadTextFileRequest) -> Result<ReadTextFileResponse> {
        let path = &request.path;
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => AcpError::resource_not_found(path.display()),
            ErrorKind::PermissionDenied => AcpError::resource_access_denied(format!(
                "cannot read {}: {e}",
                path.display()
            )),
            _ => AcpError::internal(format!("failed to read {}: {e}", path.display())),
        })?;
        let text = String::from_utf8(bytes).map_err(|_| {
            AcpError::internal(format!("{} is not valid UTF-8", path.display()))
        })?;

        let sliced = slice_lines(&text, request.start_line, request.end_line);
        Ok(ReadTextFileResponse {
            content: sliced.content,
            encoding: DEFAULT_ENCODING.to_string(),
            total_lines: Some(sliced.total_lines),
            truncated: Some(sliced.truncated),
            meta: None,
        })
    }

    /// Serve `fs/write_text_file`; `created` reports whether the file was
    /// absent immediately prior
    pub async fn write(&self, request: &WriteTextFileRequest) -> Result<WriteTextFileResponse> {
        let path = &request.path;
        let created = !tokio::fs::try_exists(path).await.unwrap_or(false);
        tokio::fs::write(path, request.content.as_bytes())
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => AcpError::resource_not_found(path.display()),
                ErrorKind::PermissionDenied => AcpError::resource_access_denied(format!(
                    "cannot write {}: {e}",
                    path.display()
                )),
                _ => AcpError::internal(format!("failed to write {}: {e}", path.display())),
            })?;
        Ok(WriteTextFileResponse {
            bytes_written: request.content.len() as u64,
            created,
            meta: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acpkit_protocol::{AcpErrorKind, SessionId};
    use pretty_assertions::assert_eq;

    const FIVE_LINES: &str = "one\ntwo\nthree\nfour\nfive\n";

    #[test]
    fn no_range_passes_through() {
        let result = slice_lines(FIVE_LINES, None, None);
        assert_eq!(result.content, FIVE_LINES);
        assert_eq!(result.total_lines, 5);
        assert!(!result.truncated);
    }

    #[test]
    fn inner_range_is_truncated() {
        let result = slice_lines(FIVE_LINES, Some(2), Some(4));
        assert_eq!(result.content, "two\nthree\nfour");
        assert!(result.truncated);
    }

    #[test]
    fn full_range_is_not_truncated() {
        let result = slice_lines(FIVE_LINES, Some(1), Some(5));
        assert_eq!(result.content, "one\ntwo\nthree\nfour\nfive");
        assert!(!result.truncated);
    }

    #[test]
    fn end_truncates_to_file_length() {
        let result = slice_lines(FIVE_LINES, Some(4), Some(50));
        assert_eq!(result.content, "four\nfive");
        assert!(result.truncated);
    }

    #[test]
    fn start_past_eof_yields_empty() {
        let result = slice_lines(FIVE_LINES, Some(9), Some(12));
        assert_eq!(result.content, "");
        assert!(result.truncated);
    }

    #[test]
    fn start_only_slices_to_end() {
        let result = slice_lines(FIVE_LINES, Some(3), None);
        assert_eq!(result.content, "three\nfour\nfive");
        assert!(result.truncated);
    }

    fn read_request(path: &std::path::Path, range: (Option<u32>, Option<u32>)) -> ReadTextFileRequest {
        ReadTextFileRequest {
            session_id: SessionId::from("S"),
            path: path.to_path_buf(),
            start_line: range.0,
            end_line: range.1,
            meta: None,
        }
    }

    #[tokio::test]
    async fn read_slices_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poem.txt");
        tokio::fs::write(&path, FIVE_LINES).await.unwrap();

        let fs = LocalFileSystem::new();
        let response = fs.read(&read_request(&path, (Some(2), Some(3)))).await.unwrap();
        assert_eq!(response.content, "two\nthree");
        assert_eq!(response.encoding, "utf-8");
        assert_eq!(response.total_lines, Some(5));
        assert_eq!(response.truncated, Some(true));
    }

    #[tokio::test]
    async fn read_missing_file_is_resource_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFileSystem::new();
        let error = fs
            .read(&read_request(&dir.path().join("absent.txt"), (None, None)))
            .await
            .unwrap_err();
        assert_eq!(error.kind, AcpErrorKind::ResourceNotFound);
    }

    #[tokio::test]
    async fn write_reports_created_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let fs = LocalFileSystem::new();

        let request = WriteTextFileRequest {
            session_id: SessionId::from("S"),
            path: path.clone(),
            content: "hello".to_string(),
            meta: None,
        };
        let response = fs.write(&request).await.unwrap();
        assert!(response.created);
        assert_eq!(response.bytes_written, 5);

        let response = fs.write(&request).await.unwrap();
        assert!(!response.created);
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "hello");
    }
}
