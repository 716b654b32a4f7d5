//! Terminal protocol types.
//!
//! Terminals are long-running, client-hosted resources the agent drives
//! over reverse RPCs: create, query output, wait for exit, kill, release.
//! A released terminal rejects every other operation.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::session::SessionId;

/// Opaque terminal identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerminalId(pub String);

impl TerminalId {
    /// View the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TerminalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TerminalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Parameters of `terminal/create`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTerminalRequest {
    /// The session the terminal belongs to
    pub session_id: SessionId,
    /// Program to run
    pub command: String,
    /// Program arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Working directory; defaults to the session's
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    /// Extra environment variables
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
    /// Cap on retained output; older output is dropped and marked truncated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_byte_limit: Option<u64>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Result of `terminal/create`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTerminalResponse {
    /// The created terminal's id
    pub terminal_id: TerminalId,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// How a terminal's process finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalExitStatus {
    /// Exit code; null when the process was terminated by signal or timed out
    pub exit_code: Option<i32>,
    /// Terminating signal name, when there was one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
}

/// Parameters of `terminal/output`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalOutputRequest {
    /// The session the terminal belongs to
    pub session_id: SessionId,
    /// Which terminal to query
    pub terminal_id: TerminalId,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Result of `terminal/output`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalOutputResponse {
    /// Accumulated output
    pub output: String,
    /// Whether older output was dropped to honor the byte limit
    pub truncated: bool,
    /// Exit status, once the process has finished
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_status: Option<TerminalExitStatus>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Parameters of `terminal/wait_for_exit`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitForExitRequest {
    /// The session the terminal belongs to
    pub session_id: SessionId,
    /// Which terminal to wait on
    pub terminal_id: TerminalId,
    /// Give up after this many milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Result of `terminal/wait_for_exit`.
///
/// `exit_code` is null exactly when the process was terminated by signal or
/// the wait timed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitForExitResponse {
    /// Exit code, always present on the wire (possibly null)
    pub exit_code: Option<i32>,
    /// Terminating signal name, when there was one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
    /// Whether the wait gave up before the process exited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timed_out: Option<bool>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// The default signal sent by `terminal/kill`
pub const DEFAULT_KILL_SIGNAL: &str = "SIGTERM";

/// Parameters of `terminal/kill`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KillTerminalRequest {
    /// The session the terminal belongs to
    pub session_id: SessionId,
    /// Which terminal to signal
    pub terminal_id: TerminalId,
    /// Signal name; defaults to [`DEFAULT_KILL_SIGNAL`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Result of `terminal/kill`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KillTerminalResponse {
    /// Whether the signal was delivered
    pub killed: bool,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Parameters of `terminal/release`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseTerminalRequest {
    /// The session the terminal belongs to
    pub session_id: SessionId,
    /// Which terminal to release
    pub terminal_id: TerminalId,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Result of `terminal/release`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseTerminalResponse {
    /// Always true; release is idempotent
    pub released: bool,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}
