//! Tool-call wire objects and the status state machine.
//!
//! A tool call is transmitted twice or more: the first send carries the
//! full object, every later send carries only the id, the new status, and
//! whatever output/error/duration accompanies it. The allowed status
//! transitions are:
//!
//! ```text
//! pending             -> awaiting_permission | in_progress | cancelled
//! awaiting_permission -> in_progress | denied | cancelled
//! in_progress         -> completed | failed | cancelled
//! ```
//!
//! Terminal states (`completed`, `failed`, `denied`, `cancelled`) are
//! absorbing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tool-call identifier, unique within a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolCallId(pub String);

impl ToolCallId {
    /// View the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ToolCallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ToolCallId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Broad classification of what a tool does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Reads workspace content
    Read,
    /// Edits workspace content
    Edit,
    /// Deletes workspace content
    Delete,
    /// Runs a command
    Execute,
    /// Fetches from the network
    Fetch,
    /// Anything else
    Other,
}

/// Tool-call lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    /// Created, not yet started
    Pending,
    /// Blocked on a permission decision
    AwaitingPermission,
    /// Running
    InProgress,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
    /// The user refused permission
    Denied,
    /// The session was cancelled first
    Cancelled,
}

impl ToolCallStatus {
    /// Whether this status is absorbing
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Denied | Self::Cancelled
        )
    }

    /// Whether the state machine permits moving from `self` to `next`
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Pending => matches!(
                next,
                Self::AwaitingPermission | Self::InProgress | Self::Cancelled
            ),
            Self::AwaitingPermission => {
                matches!(next, Self::InProgress | Self::Denied | Self::Cancelled)
            }
            Self::InProgress => matches!(next, Self::Completed | Self::Failed | Self::Cancelled),
            Self::Completed | Self::Failed | Self::Denied | Self::Cancelled => false,
        }
    }
}

impl std::fmt::Display for ToolCallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::AwaitingPermission => "awaiting_permission",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Denied => "denied",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{name}")
    }
}

/// Where in the workspace a tool call operates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallLocation {
    /// File path
    pub path: String,
    /// 1-indexed start line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// 1-indexed start column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    /// 1-indexed end line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
    /// 1-indexed end column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_column: Option<u32>,
}

impl ToolCallLocation {
    /// A location naming only a path
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line: None,
            column: None,
            end_line: None,
            end_column: None,
        }
    }
}

/// One hunk of a unified diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffHunk {
    /// 1-indexed first line of the old range
    pub old_start: u32,
    /// Number of old lines covered
    pub old_lines: u32,
    /// 1-indexed first line of the new range
    pub new_start: u32,
    /// Number of new lines covered
    pub new_lines: u32,
    /// Hunk body
    pub content: String,
}

/// Content attached to a tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolCallContent {
    /// Plain text output
    Text {
        /// The text
        text: String,
    },
    /// A file diff
    Diff {
        /// File the diff applies to
        path: String,
        /// Diff hunks
        hunks: Vec<DiffHunk>,
    },
    /// Output of an embedded terminal
    #[serde(rename_all = "camelCase")]
    Terminal {
        /// Terminal the command ran in
        terminal_id: String,
        /// Command line
        command: String,
        /// Exit code, when the process has exited
        #[serde(skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
        /// Captured stdout
        #[serde(skip_serializing_if = "Option::is_none")]
        stdout: Option<String>,
        /// Captured stderr
        #[serde(skip_serializing_if = "Option::is_none")]
        stderr: Option<String>,
    },
}

/// Full tool-call object, sent exactly once per tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    /// Identifier, unique within the session
    pub id: ToolCallId,
    /// Tool name
    pub name: String,
    /// Tool input
    #[serde(default)]
    pub input: Map<String, Value>,
    /// Current status
    pub status: ToolCallStatus,
    /// What kind of tool this is
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ToolKind>,
    /// Where it operates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<ToolCallLocation>,
    /// Why the agent is calling it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Output content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<ToolCallContent>,
    /// Error text when the call failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock duration in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Whether a permission decision gates execution
    pub requires_permission: bool,
}

/// Incremental tool-call update; tool name and input are not re-sent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallUpdate {
    /// Which tool call this updates
    pub id: ToolCallId,
    /// New status
    pub status: ToolCallStatus,
    /// Output content, at most once per terminal send
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<ToolCallContent>,
    /// Error text when the call failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock duration in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}
