//! Session updates streamed from agent to client.
//!
//! Every `session/update` notification carries the session id, a `type`
//! discriminator, and a type-specific `data` payload. Within one session
//! updates are delivered in emission order; chunk indices are monotone per
//! stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::session::{ConfigSource, SessionId};
use crate::types::tool_call::{ToolCall, ToolCallUpdate};

/// A streamed chunk of an agent or user message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageChunk {
    /// Chunk text
    pub content: String,
    /// 0-based monotone index within the session's message stream
    pub index: u64,
    /// Marks the last chunk of a message
    #[serde(rename = "final", skip_serializing_if = "Option::is_none")]
    pub is_final: Option<bool>,
}

/// A streamed chunk of the agent's reasoning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThoughtChunk {
    /// Chunk text
    pub content: String,
    /// 0-based monotone index within the session's thought stream
    pub index: u64,
    /// Whether the client should surface this to the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    /// Marks the last chunk of a thought
    #[serde(rename = "final", skip_serializing_if = "Option::is_none")]
    pub is_final: Option<bool>,
}

/// Status of one plan step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStepStatus {
    /// Not started
    Pending,
    /// Being worked on
    InProgress,
    /// Done
    Completed,
    /// Attempted and failed
    Failed,
    /// Deliberately not done
    Skipped,
}

/// One step of a plan, possibly with nested children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    /// Step identifier
    pub id: String,
    /// What the step does
    pub description: String,
    /// Current status
    pub status: PlanStepStatus,
    /// Longer explanation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Sub-steps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<PlanStep>>,
}

/// A plan the agent intends to follow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Plan identifier
    pub plan_id: String,
    /// Display title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Ordered steps
    pub steps: Vec<PlanStep>,
}

/// Argument of a slash command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandArg {
    /// Argument name
    pub name: String,
    /// What the argument is for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the argument must be supplied
    #[serde(default)]
    pub required: bool,
}

/// A command the agent currently accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandInfo {
    /// Command name
    pub name: String,
    /// What the command does
    pub description: String,
    /// Arguments the command takes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<CommandArg>>,
}

/// Payload of an `available_commands` update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableCommands {
    /// The full current command list
    pub commands: Vec<CommandInfo>,
}

/// Payload of a `current_mode_update`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeUpdate {
    /// The mode being left
    pub previous_mode: String,
    /// The mode now in effect
    pub current_mode: String,
    /// Why the mode changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Payload of a `config_option_update`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOptionUpdate {
    /// Option key
    pub key: String,
    /// Value before the change, when there was one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_value: Option<Value>,
    /// Value now in effect
    pub current_value: Value,
    /// Who made the change
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ConfigSource>,
}

/// Type-discriminated session update payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionUpdate {
    /// A plan the agent intends to follow
    Plan(Plan),
    /// A chunk of agent output
    AgentMessageChunk(MessageChunk),
    /// A chunk of echoed or synthesized user input
    UserMessageChunk(MessageChunk),
    /// A chunk of agent reasoning
    ThoughtMessageChunk(ThoughtChunk),
    /// The initial, full tool-call object
    ToolCall(ToolCall),
    /// An incremental tool-call update
    ToolCallUpdate(ToolCallUpdate),
    /// The current command list
    AvailableCommands(AvailableCommands),
    /// A mode transition
    CurrentModeUpdate(ModeUpdate),
    /// A configuration change
    ConfigOptionUpdate(ConfigOptionUpdate),
}

/// Parameters of the `session/update` notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionNotification {
    /// The session this update belongs to
    pub session_id: SessionId,
    /// The update itself (`type` + `data` on the wire)
    #[serde(flatten)]
    pub update: SessionUpdate,
    /// When the update was emitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl SessionNotification {
    /// Wrap an update for the given session, without a timestamp
    pub fn new(session_id: SessionId, update: SessionUpdate) -> Self {
        Self {
            session_id,
            update,
            timestamp: None,
            meta: None,
        }
    }
}
