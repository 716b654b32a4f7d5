//! Permission inference.
//!
//! Before sending `session/request_permission` the agent derives the
//! operation class and the target resource from the tool call itself. The
//! heuristic is deterministic and intentionally approximate; the client
//! remains the authority on the actual policy. It is exposed as pure
//! functions so policy tests need no connection.

use serde_json::{Map, Value};

use acpkit_protocol::{PermissionOperation, ToolCallLocation, ToolKind};

/// Derive the operation class from a tool's kind and name.
///
/// An explicit kind wins. Otherwise the tool name is scanned for
/// case-insensitive substrings, most specific first: `mcp`, `delete`,
/// `write`/`edit`, `read`/`list`/`cat`, `run`/`exec`/`shell`.
#[must_use]
pub fn infer_operation(kind: Option<ToolKind>, tool_name: &str) -> PermissionOperation {
    match kind {
        Some(ToolKind::Edit) => return PermissionOperation::FileWrite,
        Some(ToolKind::Read) => return PermissionOperation::FileRead,
        Some(ToolKind::Delete) => return PermissionOperation::FileDelete,
        Some(ToolKind::Execute) => return PermissionOperation::TerminalExecute,
        Some(ToolKind::Fetch) => return PermissionOperation::NetworkAccess,
        Some(ToolKind::Other) | None => {}
    }

    let name = tool_name.to_ascii_lowercase();
    if name.contains("mcp") {
        PermissionOperation::McpTool
    } else if name.contains("delete") {
        PermissionOperation::FileDelete
    } else if name.contains("write") || name.contains("edit") {
        PermissionOperation::FileWrite
    } else if name.contains("read") || name.contains("list") || name.contains("cat") {
        PermissionOperation::FileRead
    } else if name.contains("run") || name.contains("exec") || name.contains("shell") {
        PermissionOperation::TerminalExecute
    } else {
        PermissionOperation::Other
    }
}

/// Derive the resource string from a tool call's input and location.
///
/// The input's `path` field wins, then the location's path; with neither,
/// the resource is empty.
#[must_use]
pub fn infer_resource(input: &Map<String, Value>, location: Option<&ToolCallLocation>) -> String {
    if let Some(path) = input.get("path").and_then(Value::as_str) {
        return path.to_string();
    }
    location.map(|l| l.path.clone()).unwrap_or_default()
}
