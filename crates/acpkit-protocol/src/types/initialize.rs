//! Initialization and capability negotiation.
//!
//! The first exchange on any connection is `initialize`: the client
//! announces its identity and what it can host (file system, terminals, UI
//! affordances); the agent answers with its identity, its capabilities, and
//! any authentication methods it requires. Afterwards each side gates
//! operations on what the other negotiated; attempting an unsupported
//! operation fails with `capability_not_supported` (-32007).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version carried by `initialize`
pub type ProtocolVersion = u32;

/// The protocol version this crate implements
pub const PROTOCOL_VERSION: ProtocolVersion = 1;

/// Name and version of one endpoint implementation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Implementation {
    /// Programmatic name
    pub name: String,
    /// Implementation version
    pub version: String,
    /// Human-readable title, when it differs from `name`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Implementation {
    /// Create an implementation descriptor
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            title: None,
        }
    }
}

/// File-system access the client can host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FsCapabilities {
    /// `fs/read_text_file` is available
    #[serde(default)]
    pub read: bool,
    /// `fs/write_text_file` is available
    #[serde(default)]
    pub write: bool,
}

/// Terminal hosting the client offers.
///
/// Presence of the object signals support; the fields refine it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalCapabilities {}

/// UI affordances the client offers (mode switching, command palettes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiCapabilities {}

/// Capability set announced by the client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCapabilities {
    /// File-system access; absent means no fs reverse RPCs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fs: Option<FsCapabilities>,
    /// Terminal hosting; absent means no terminal reverse RPCs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal: Option<TerminalCapabilities>,
    /// UI affordances; absent means no agent-driven mode switching
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui: Option<UiCapabilities>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl ClientCapabilities {
    /// Whether the client hosts `fs/read_text_file`
    #[must_use]
    pub fn can_read_files(&self) -> bool {
        self.fs.is_some_and(|fs| fs.read)
    }

    /// Whether the client hosts `fs/write_text_file`
    #[must_use]
    pub fn can_write_files(&self) -> bool {
        self.fs.is_some_and(|fs| fs.write)
    }

    /// Whether the client hosts terminals
    #[must_use]
    pub fn has_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    /// Whether the client accepts agent-driven UI operations
    #[must_use]
    pub fn has_ui(&self) -> bool {
        self.ui.is_some()
    }
}

/// MCP server transports the agent can attach
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpCapabilities {
    /// HTTP-transported MCP servers
    #[serde(default)]
    pub http: bool,
    /// SSE-transported MCP servers
    #[serde(default)]
    pub sse: bool,
}

/// Prompt content kinds the agent accepts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptCapabilities {
    /// Image content blocks in prompts
    #[serde(default)]
    pub image: bool,
    /// Audio content blocks in prompts
    #[serde(default)]
    pub audio: bool,
    /// Embedded `resource` blocks in prompts
    #[serde(default)]
    pub embedded_context: bool,
}

/// Session features the agent supports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCapabilities {
    /// `session/set_mode` switching
    #[serde(default)]
    pub modes: bool,
    /// `session/set_config_option` updates
    #[serde(default)]
    pub config_options: bool,
}

/// Capability set announced by the agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    /// `session/load` is available
    #[serde(default)]
    pub load_session: bool,
    /// MCP server attachment support
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcp_capabilities: Option<McpCapabilities>,
    /// Prompt content support
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_capabilities: Option<PromptCapabilities>,
    /// Session feature support
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_capabilities: Option<SessionCapabilities>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// An authentication method advertised by the agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthMethod {
    /// Identifier passed back in `authenticate`
    pub id: String,
    /// Display name
    pub name: String,
    /// Explanation shown to the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Parameters of the `initialize` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRequest {
    /// Latest protocol version the client supports
    pub protocol_version: ProtocolVersion,
    /// Client identity
    pub client_info: Implementation,
    /// What the client can host
    #[serde(default)]
    pub capabilities: ClientCapabilities,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Result of the `initialize` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResponse {
    /// Negotiated protocol version
    pub protocol_version: ProtocolVersion,
    /// Agent identity
    pub agent_info: Implementation,
    /// What the agent supports
    #[serde(default)]
    pub capabilities: AgentCapabilities,
    /// Authentication methods the agent accepts; empty means none required
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auth_methods: Vec<AuthMethod>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Parameters of the `authenticate` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateRequest {
    /// Which advertised method to authenticate with
    pub method_id: String,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Result of the `authenticate` request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateResponse {
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}
