//! File-operation reverse RPCs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::session::SessionId;

/// The encoding reported when none is specified
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Parameters of `fs/read_text_file`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadTextFileRequest {
    /// The session requesting the read
    pub session_id: SessionId,
    /// File to read
    pub path: PathBuf,
    /// 1-indexed first line to include
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u32>,
    /// 1-indexed last line to include (inclusive, truncating to file length)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Result of `fs/read_text_file`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadTextFileResponse {
    /// Selected content, lines joined by `\n`
    pub content: String,
    /// Text encoding of the file
    pub encoding: String,
    /// Total line count of the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_lines: Option<u32>,
    /// True when a strict subset of the file was returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated: Option<bool>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Parameters of `fs/write_text_file`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteTextFileRequest {
    /// The session requesting the write
    pub session_id: SessionId,
    /// File to write
    pub path: PathBuf,
    /// Full new content
    pub content: String,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Result of `fs/write_text_file`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteTextFileResponse {
    /// Bytes written to disk
    pub bytes_written: u64,
    /// True iff the file did not exist immediately prior
    pub created: bool,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn read_request_wire_shape() {
        let request = ReadTextFileRequest {
            session_id: SessionId::from("S"),
            path: PathBuf::from("/w/src/lib.rs"),
            start_line: Some(10),
            end_line: Some(20),
            meta: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "sessionId": "S",
                "path": "/w/src/lib.rs",
                "startLine": 10,
                "endLine": 20
            })
        );
    }

    #[test]
    fn write_response_round_trip() {
        let wire = json!({"bytesWritten": 42, "created": true});
        let response: WriteTextFileResponse = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(serde_json::to_value(&response).unwrap(), wire);
    }
}
