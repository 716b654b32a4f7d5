//! The permission protocol.
//!
//! Before executing a gated tool call, the agent asks the client to
//! authorize an operation on a resource. The client mediates the user's
//! decision and answers with whether it was granted, whether to remember
//! it, and at what scope. The `_custom` field on either side is preserved
//! by pass-throughs and ignored by recipients that do not understand it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::session::SessionId;
use crate::types::tool_call::ToolCallId;

/// The operation class a permission request covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionOperation {
    /// Reading a file
    FileRead,
    /// Writing or editing a file
    FileWrite,
    /// Deleting a file
    FileDelete,
    /// Running a command in a terminal
    TerminalExecute,
    /// Reaching out to the network
    NetworkAccess,
    /// Invoking an MCP tool
    McpTool,
    /// Anything else
    Other,
}

/// How a presented permission option resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionOptionKind {
    /// Allow this once
    AllowOnce,
    /// Allow and remember
    AllowAlways,
    /// Reject this once
    RejectOnce,
    /// Reject and remember
    RejectAlways,
}

/// A choice the client may present to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionOption {
    /// Identifier echoed back in `selectedOptionId`
    pub id: String,
    /// How selecting this option resolves
    pub kind: PermissionOptionKind,
    /// Button label
    pub label: String,
    /// Longer explanation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether this is the pre-selected option
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

/// How long a remembered decision applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionScope {
    /// This request only
    Once,
    /// The rest of the session
    Session,
    /// The whole workspace
    Workspace,
    /// Everywhere, indefinitely
    Always,
}

/// The resolved outcome of a permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionOutcome {
    /// Granted for this request
    Granted,
    /// Granted and remembered
    GrantedAlways,
    /// Denied for this request
    Denied,
    /// Denied and remembered
    DeniedAlways,
    /// The client never answered; treated as denied, never remembered
    Timeout,
}

/// Parameters of `session/request_permission` (agent -> client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPermissionRequest {
    /// The session asking
    pub session_id: SessionId,
    /// What class of operation is requested
    pub operation: PermissionOperation,
    /// The resource it targets (path, command, URL); may be empty
    #[serde(default)]
    pub resource: String,
    /// Why the agent wants to do this
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// The tool call being gated, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<ToolCallId>,
    /// Choices to present; the client may substitute its own
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<PermissionOption>>,
    /// Opaque vendor payload, preserved by pass-throughs
    #[serde(rename = "_custom", skip_serializing_if = "Option::is_none")]
    pub custom: Option<Value>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Result of `session/request_permission`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPermissionResponse {
    /// Whether the user granted the operation
    pub granted: bool,
    /// Whether to remember the decision
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remember: Option<bool>,
    /// Scope of a remembered decision
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<PermissionScope>,
    /// Which presented option was chosen
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_option_id: Option<String>,
    /// Free-form explanation from the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Opaque vendor payload, preserved by pass-throughs
    #[serde(rename = "_custom", skip_serializing_if = "Option::is_none")]
    pub custom: Option<Value>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl RequestPermissionResponse {
    /// A plain grant or denial with nothing remembered
    #[must_use]
    pub fn decided(granted: bool) -> Self {
        Self {
            granted,
            remember: None,
            scope: None,
            selected_option_id: None,
            reason: None,
            custom: None,
            meta: None,
        }
    }
}

/// The agent-side view of a resolved permission request
#[derive(Debug, Clone, PartialEq)]
pub struct PermissionDecision {
    /// The resolved outcome
    pub outcome: PermissionOutcome,
    /// Whether the operation may proceed
    pub granted: bool,
    /// Whether the decision was remembered
    pub remember: bool,
    /// Scope of a remembered decision
    pub scope: Option<PermissionScope>,
    /// Which presented option was chosen
    pub selected_option_id: Option<String>,
    /// Free-form explanation from the user
    pub reason: Option<String>,
}

impl PermissionDecision {
    /// Map a wire response into the agent-side decision.
    ///
    /// `granted` with `remember=true` becomes `granted_always`; likewise for
    /// denials. Absent `remember` means the decision is not remembered.
    #[must_use]
    pub fn from_response(response: RequestPermissionResponse) -> Self {
        let remember = response.remember.unwrap_or(false);
        let outcome = match (response.granted, remember) {
            (true, true) => PermissionOutcome::GrantedAlways,
            (true, false) => PermissionOutcome::Granted,
            (false, true) => PermissionOutcome::DeniedAlways,
            (false, false) => PermissionOutcome::Denied,
        };
        Self {
            outcome,
            granted: response.granted,
            remember,
            scope: response.scope,
            selected_option_id: response.selected_option_id,
            reason: response.reason,
        }
    }

    /// The decision produced when the client never answers in time
    #[must_use]
    pub fn timed_out() -> Self {
        Self {
            outcome: PermissionOutcome::Timeout,
            granted: false,
            remember: false,
            scope: None,
            selected_option_id: None,
            reason: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn request_wire_shape() {
        let request = RequestPermissionRequest {
            session_id: SessionId::from("S"),
            operation: PermissionOperation::FileWrite,
            resource: "/w/out.txt".to_string(),
            reason: None,
            tool_call_id: Some(ToolCallId::from("tc_1")),
            options: None,
            custom: None,
            meta: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "sessionId": "S",
                "operation": "file_write",
                "resource": "/w/out.txt",
                "toolCallId": "tc_1"
            })
        );
    }

    #[test]
    fn outcome_mapping() {
        let decision =
            PermissionDecision::from_response(RequestPermissionResponse::decided(true));
        assert_eq!(decision.outcome, PermissionOutcome::Granted);
        assert!(decision.granted);
        assert!(!decision.remember);

        let decision = PermissionDecision::from_response(RequestPermissionResponse {
            remember: Some(true),
            ..RequestPermissionResponse::decided(true)
        });
        assert_eq!(decision.outcome, PermissionOutcome::GrantedAlways);

        let decision = PermissionDecision::from_response(RequestPermissionResponse {
            remember: Some(true),
            ..RequestPermissionResponse::decided(false)
        });
        assert_eq!(decision.outcome, PermissionOutcome::DeniedAlways);
        assert!(!decision.granted);
    }

    #[test]
    fn timeout_is_denied_and_not_remembered() {
        let decision = PermissionDecision::timed_out();
        assert_eq!(decision.outcome, PermissionOutcome::Timeout);
        assert!(!decision.granted);
        assert!(!decision.remember);
    }

    #[test]
    fn custom_payload_round_trips() {
        let wire = json!({
            "granted": true,
            "scope": "session",
            "_custom": {"vendor": {"ticket": 99}}
        });
        let response: RequestPermissionResponse = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(serde_json::to_value(&response).unwrap(), wire);
    }
}
