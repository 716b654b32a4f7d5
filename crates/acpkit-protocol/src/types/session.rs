//! Session methods: creation, loading, prompting, modes, configuration,
//! and cancellation.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::content::ContentBlock;

/// Opaque session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// View the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The session mode every new session starts in
pub const DEFAULT_SESSION_MODE: &str = "default";

/// MCP server configuration, opaque to the protocol core.
///
/// The agent passes these through to whatever MCP plumbing it embeds; the
/// core neither validates nor interprets them.
pub type McpServerConfig = Value;

/// Parameters of `session/new`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionRequest {
    /// Absolute path the session operates in; immutable post-creation
    pub working_directory: PathBuf,
    /// MCP servers to attach, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mcp_servers: Vec<McpServerConfig>,
    /// Optional system prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Initial mode; defaults to [`DEFAULT_SESSION_MODE`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Initial configuration options
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub config_options: HashMap<String, Value>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Result of `session/new`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionResponse {
    /// The created session's id
    pub session_id: SessionId,
    /// Creation timestamp (ISO-8601)
    pub created_at: DateTime<Utc>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Parameters of `session/load`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSessionRequest {
    /// Which session to load
    pub session_id: SessionId,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Result of `session/load`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSessionResponse {
    /// The loaded session's id
    pub session_id: SessionId,
    /// Its working directory
    pub working_directory: PathBuf,
    /// Its current mode
    pub mode: String,
    /// Its creation timestamp
    pub created_at: DateTime<Utc>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Parameters of `session/prompt`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRequest {
    /// The session this turn belongs to
    pub session_id: SessionId,
    /// Prompt content blocks
    pub content: Vec<ContentBlock>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Why a prompt turn stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The turn completed normally
    EndTurn,
    /// The session was cancelled mid-turn
    Cancelled,
    /// The model hit its output limit
    MaxTokens,
    /// The prompt handler failed
    Error,
}

/// Token accounting for one prompt turn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    /// Tokens consumed from the prompt
    pub input_tokens: u64,
    /// Tokens produced
    pub output_tokens: u64,
    /// Input tokens served from cache
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_input_tokens: Option<u64>,
}

/// Result of `session/prompt`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResponse {
    /// Why the turn stopped
    pub stop_reason: StopReason,
    /// Token usage, when tracked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl PromptResponse {
    /// A response with the given stop reason and no usage data
    #[must_use]
    pub fn stopped(stop_reason: StopReason) -> Self {
        Self {
            stop_reason,
            usage: None,
            meta: None,
        }
    }
}

/// Parameters of `session/set_mode` (either direction)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetModeRequest {
    /// The session to switch
    pub session_id: SessionId,
    /// The mode to switch to
    pub mode: String,
    /// Why the switch is happening
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Who changed a configuration option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// The human user
    User,
    /// The agent
    Agent,
    /// The system (defaults, policy)
    System,
}

/// Parameters of `session/set_config_option`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetConfigOptionRequest {
    /// The session to configure
    pub session_id: SessionId,
    /// Option key
    pub key: String,
    /// New value
    pub value: Value,
    /// Who is making the change
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ConfigSource>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Parameters of the `session/cancel` notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelNotification {
    /// The session to cancel
    pub session_id: SessionId,
    /// Why the user cancelled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Empty result for methods that acknowledge without data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyResult {
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
    fn new_session_minimal_wire_shape() {
        let request = NewSessionRequest {
            working_directory: PathBuf::from("/w"),
            mcp_servers: Vec::new(),
            system_prompt: None,
            mode: None,
            config_options: HashMap::new(),
            meta: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"workingDirectory": "/w"})
        );
    }

    #[test]
    fn prompt_request_carries_content_blocks() {
        let wire = json!({
            "sessionId": "S",
            "content": [{"type": "text", "text": "hi"}]
        });
        let request: PromptRequest = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(request.session_id, SessionId::from("S"));
        assert_eq!(serde_json::to_value(&request).unwrap(), wire);
    }

    #[test]
    fn stop_reason_wire_names() {
        assert_eq!(
            serde_json::to_value(StopReason::EndTurn).unwrap(),
            json!("end_turn")
        );
        assert_eq!(
            serde_json::to_value(StopReason::Cancelled).unwrap(),
            json!("cancelled")
        );
        assert_eq!(
            serde_json::to_value(StopReason::MaxTokens).unwrap(),
            json!("max_tokens")
        );
    }

    #[test]
    fn created_at_is_iso8601() {
        let response = NewSessionResponse {
            session_id: SessionId::from("S"),
            created_at: "2026-08-01T12:00:00Z".parse().unwrap(),
            meta: None,
        };
        let wire = serde_json::to_value(&response).unwrap();
        assert_eq!(wire["createdAt"], json!("2026-08-01T12:00:00Z"));
    }

    #[test]
    fn cancel_notification_round_trip() {
        let wire = json!({"sessionId": "S", "reason": "user closed panel"});
        let notification: CancelNotification = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(serde_json::to_value(&notification).unwrap(), wire);
    }
}
