//! The per-session runtime handed to prompt handlers.
//!
//! A [`SessionContext`] is what a prompt handler works through: streaming
//! chunks, plans, tool calls, permission requests, file and terminal
//! reverse RPCs, and cooperative cancellation checks. Every emission goes
//! out as a `session/update` notification in emission order; reverse RPCs
//! are gated on the capabilities the client negotiated at initialize.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use acpkit_protocol::{
    AcpError, AcpErrorKind, AvailableCommands, ClientCapabilities, CommandInfo,
    ConfigOptionUpdate, ConfigSource, CreateTerminalRequest, CreateTerminalResponse, EmptyResult,
    MessageChunk, ModeUpdate, PermissionDecision, PermissionOption, Plan, ReadTextFileRequest,
    ReadTextFileResponse, RequestPermissionRequest, RequestPermissionResponse, Result, SessionId,
    SessionNotification, SessionUpdate, SetModeRequest, ThoughtChunk, WriteTextFileRequest,
    WriteTextFileResponse, methods,
};
use acpkit_rpc::RpcEndpoint;

use crate::permission::{infer_operation, infer_resource};
use crate::session::SessionData;
use crate::terminal::TerminalHandle;
use crate::tool_call::{ToolCallHandle, ToolCallOptions};

/// Emit one `session/update` notification.
pub(crate) async fn emit_update(
    endpoint: &RpcEndpoint,
    session_id: SessionId,
    update: SessionUpdate,
) -> Result<()> {
    endpoint
        .notify_typed(
            methods::SESSION_UPDATE,
            &SessionNotification::new(session_id, update),
        )
        .await
}

/// Extra settings for [`SessionContext::create_terminal`]
#[derive(Debug, Clone, Default)]
pub struct TerminalOptions {
    /// Working directory; defaults to the session's
    pub cwd: Option<PathBuf>,
    /// Extra environment variables
    pub env: HashMap<String, String>,
    /// Cap on retained output
    pub output_byte_limit: Option<u64>,
}

/// The session runtime exposed to prompt handlers
#[derive(Clone)]
pub struct SessionContext {
    session: Arc<SessionData>,
    endpoint: Arc<RpcEndpoint>,
    client_capabilities: ClientCapabilities,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    pub(crate) fn new(
        session: Arc<SessionData>,
        endpoint: Arc<RpcEndpoint>,
        client_capabilities: ClientCapabilities,
    ) -> Self {
        Self {
            session,
            endpoint,
            client_capabilities,
        }
    }

    /// The session's id
    pub fn id(&self) -> &SessionId {
        self.session.id()
    }

    /// The session's working directory
    pub fn working_directory(&self) -> &Path {
        self.session.working_directory()
    }

    /// The session's system prompt, when one was supplied
    pub fn system_prompt(&self) -> Option<&str> {
        self.session.system_prompt()
    }

    /// The session's current mode
    pub fn mode(&self) -> String {
        self.session.mode()
    }

    /// Read one configuration option
    pub fn config_option(&self, key: &str) -> Option<Value> {
        self.session.config_option(key)
    }

    /// The capabilities the client negotiated
    pub fn client_capabilities(&self) -> &ClientCapabilities {
        &self.client_capabilities
    }

    /// Whether the session has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.session.is_cancelled()
    }

    /// Fail with `cancelled` when the session's flag is set.
    ///
    /// Cooperative handlers call this at suspension points; reverse RPCs
    /// and sends perform the same check internally.
    pub fn check_cancelled(&self) -> Result<()> {
        self.session.check_cancelled()
    }

    // ------------------------------------------------------------------
    // Streaming updates
    // ------------------------------------------------------------------

    /// Emit an `agent_message_chunk` with the next auto-assigned index
    pub async fn send_agent_message(&self, text: impl Into<String>) -> Result<u64> {
        self.send_agent_message_chunk(text, None, None).await
    }

    /// Emit an `agent_message_chunk`, allocating the index when omitted
    pub async fn send_agent_message_chunk(
        &self,
        text: impl Into<String>,
        index: Option<u64>,
        is_final: Option<bool>,
    ) -> Result<u64> {
        self.check_cancelled()?;
        let index = index.unwrap_or_else(|| self.session.next_agent_chunk_index());
        self.emit(SessionUpdate::AgentMessageChunk(MessageChunk {
            content: text.into(),
            index,
            is_final,
        }))
        .await?;
        Ok(index)
    }

    /// Emit a `user_message_chunk`, allocating the index when omitted
    pub async fn send_user_message_chunk(
        &self,
        text: impl Into<String>,
        index: Option<u64>,
        is_final: Option<bool>,
    ) -> Result<u64> {
        self.check_cancelled()?;
        let index = index.unwrap_or_else(|| self.session.next_user_chunk_index());
        self.emit(SessionUpdate::UserMessageChunk(MessageChunk {
            content: text.into(),
            index,
            is_final,
        }))
        .await?;
        Ok(index)
    }

    /// Emit a `thought_message_chunk` with the next auto-assigned index
    pub async fn send_thought(&self, text: impl Into<String>) -> Result<u64> {
        self.send_thought_chunk(text, None, None, None).await
    }

    /// Emit a `thought_message_chunk`, allocating the index when omitted.
    ///
    /// Thought indices are monotone per session, independent of message
    /// indices.
    pub async fn send_thought_chunk(
        &self,
        text: impl Into<String>,
        index: Option<u64>,
        visible: Option<bool>,
        is_final: Option<bool>,
    ) -> Result<u64> {
        self.check_cancelled()?;
        let index = index.unwrap_or_else(|| self.session.next_thought_chunk_index());
        self.emit(SessionUpdate::ThoughtMessageChunk(ThoughtChunk {
            content: text.into(),
            index,
            visible,
            is_final,
        }))
        .await?;
        Ok(index)
    }

    /// Emit a `plan` update
    pub async fn send_plan(&self, plan: Plan) -> Result<()> {
        self.check_cancelled()?;
        self.emit(SessionUpdate::Plan(plan)).await
    }

    /// Emit an `available_commands` update with the full current list
    pub async fn send_available_commands(&self, commands: Vec<CommandInfo>) -> Result<()> {
        self.check_cancelled()?;
        self.emit(SessionUpdate::AvailableCommands(AvailableCommands { commands }))
            .await
    }

    /// Emit a `config_option_update`
    pub async fn send_config_option_update(
        &self,
        key: impl Into<String>,
        previous_value: Option<Value>,
        current_value: Value,
        source: Option<ConfigSource>,
    ) -> Result<()> {
        self.check_cancelled()?;
        self.emit(SessionUpdate::ConfigOptionUpdate(ConfigOptionUpdate {
            key: key.into(),
            previous_value,
            current_value,
            source,
        }))
        .await
    }

    async fn emit(&self, update: SessionUpdate) -> Result<()> {
        emit_update(&self.endpoint, self.id().clone(), update).await
    }

    // ------------------------------------------------------------------
    // Tool calls and permissions
    // ------------------------------------------------------------------

    /// Allocate a tool-call id and return its builder.
    ///
    /// A cancelled session accepts no new tool calls.
    pub fn start_tool_call(&self, options: ToolCallOptions) -> Result<ToolCallHandle> {
        self.check_cancelled()?;
        let id = self.session.next_tool_call_id();
        Ok(ToolCallHandle::new(
            Arc::clone(&self.endpoint),
            Arc::clone(&self.session),
            id,
            options,
        ))
    }

    /// Ask the client to authorize a tool call.
    ///
    /// The operation class and resource are inferred from the call's kind,
    /// name, input, and location. A timed-out request resolves to the
    /// `timeout` outcome: denied, never remembered.
    pub async fn request_permission(
        &self,
        tool_call: &ToolCallHandle,
        options: Option<Vec<PermissionOption>>,
        reason: Option<String>,
    ) -> Result<PermissionDecision> {
        self.check_cancelled()?;
        let request = RequestPermissionRequest {
            session_id: self.id().clone(),
            operation: infer_operation(tool_call.kind(), tool_call.name()),
            resource: infer_resource(tool_call.input(), tool_call.location()),
            reason,
            tool_call_id: Some(tool_call.id().clone()),
            options,
            custom: None,
            meta: None,
        };
        debug!(
            session = %self.id(),
            operation = ?request.operation,
            resource = %request.resource,
            "requesting permission"
        );
        match self
            .endpoint
            .request_typed::<_, RequestPermissionResponse>(
                methods::SESSION_REQUEST_PERMISSION,
                &request,
            )
            .await
        {
            Ok(response) => Ok(PermissionDecision::from_response(response)),
            Err(error) if error.kind == AcpErrorKind::Timeout => {
                Ok(PermissionDecision::timed_out())
            }
            Err(error) => Err(error),
        }
    }

    // ------------------------------------------------------------------
    // Reverse RPCs
    // ------------------------------------------------------------------

    /// Read a text file through the client, optionally slicing by line.
    ///
    /// Returns the response's content in full.
    pub async fn read_file(
        &self,
        path: impl Into<PathBuf>,
        start_line: Option<u32>,
        end_line: Option<u32>,
    ) -> Result<String> {
        self.check_cancelled()?;
        if !self.client_capabilities.can_read_files() {
            return Err(AcpError::capability_not_supported("fs.read"));
        }
        let response: ReadTextFileResponse = self
            .endpoint
            .request_typed(
                methods::FS_READ_TEXT_FILE,
                &ReadTextFileRequest {
                    session_id: self.id().clone(),
                    path: path.into(),
                    start_line,
                    end_line,
                    meta: None,
                },
            )
            .await?;
        Ok(response.content)
    }

    /// Write a text file through the client
    pub async fn write_file(
        &self,
        path: impl Into<PathBuf>,
        content: impl Into<String>,
    ) -> Result<WriteTextFileResponse> {
        self.check_cancelled()?;
        if !self.client_capabilities.can_write_files() {
            return Err(AcpError::capability_not_supported("fs.write"));
        }
        self.endpoint
            .request_typed(
                methods::FS_WRITE_TEXT_FILE,
                &WriteTextFileRequest {
                    session_id: self.id().clone(),
                    path: path.into(),
                    content: content.into(),
                    meta: None,
                },
            )
            .await
    }

    /// Create a client-hosted terminal and return its handle
    pub async fn create_terminal(
        &self,
        command: impl Into<String>,
        args: Vec<String>,
        options: TerminalOptions,
    ) -> Result<TerminalHandle> {
        self.check_cancelled()?;
        if !self.client_capabilities.has_terminal() {
            return Err(AcpError::capability_not_supported("terminal"));
        }
        let command = command.into();
        let response: CreateTerminalResponse = self
            .endpoint
            .request_typed(
                methods::TERMINAL_CREATE,
                &CreateTerminalRequest {
                    session_id: self.id().clone(),
                    command: command.clone(),
                    args,
                    cwd: options.cwd,
                    env: options.env,
                    output_byte_limit: options.output_byte_limit,
                    meta: None,
                },
            )
            .await?;
        Ok(TerminalHandle::new(
            Arc::clone(&self.endpoint),
            self.id().clone(),
            response.terminal_id,
            command,
        ))
    }

    /// Switch the session mode through the client and announce the change.
    ///
    /// Sends `session/set_mode` to the client (which must have negotiated
    /// the `ui` capability), updates the cached mode, then emits a
    /// `current_mode_update`.
    pub async fn set_mode(&self, mode: impl Into<String>) -> Result<()> {
        self.check_cancelled()?;
        if !self.client_capabilities.has_ui() {
            return Err(AcpError::capability_not_supported("ui"));
        }
        let mode = mode.into();
        let _: EmptyResult = self
            .endpoint
            .request_typed(
                methods::SESSION_SET_MODE,
                &SetModeRequest {
                    session_id: self.id().clone(),
                    mode: mode.clone(),
                    reason: None,
                    meta: None,
                },
            )
            .await?;
        let previous = self.session.replace_mode(mode.clone());
        self.emit(SessionUpdate::CurrentModeUpdate(ModeUpdate {
            previous_mode: previous,
            current_mode: mode,
            reason: None,
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionRegistry;
    use acpkit_protocol::NewSessionRequest;
    use acpkit_rpc::RpcEndpointConfig;
    use acpkit_transport::StdioTransport;
    use pretty_assertions::assert_eq;

    fn context_with(capabilities: ClientCapabilities) -> SessionContext {
        // Never started: every test here fails before reaching the wire.
        let (rx, tx) = tokio::io::duplex(64);
        let endpoint = acpkit_rpc::RpcEndpoint::new(
            std::sync::Arc::new(StdioTransport::from_raw(rx, tx)),
            RpcEndpointConfig::default(),
        );
        let registry = SessionRegistry::new();
        let session = registry.create(NewSessionRequest {
            working_directory: "/w".into(),
            mcp_servers: Vec::new(),
            system_prompt: None,
            mode: None,
            config_options: Default::default(),
            meta: None,
        });
        SessionContext::new(session, endpoint, capabilities)
    }

    #[tokio::test]
    async fn reverse_rpcs_are_gated_on_client_capabilities() {
        let context = context_with(ClientCapabilities::default());

        let error = context.read_file("/w/a.txt", None, None).await.unwrap_err();
        assert_eq!(error.kind, AcpErrorKind::CapabilityNotSupported);
        assert!(error.message.contains("fs.read"));

        let error = context.write_file("/w/a.txt", "x").await.unwrap_err();
        assert!(error.message.contains("fs.write"));

        let error = context
            .create_terminal("echo", Vec::new(), TerminalOptions::default())
            .await
            .unwrap_err();
        assert!(error.message.contains("terminal"));

        let error = context.set_mode("plan").await.unwrap_err();
        assert!(error.message.contains("ui"));
    }

    #[tokio::test]
    async fn cancelled_session_blocks_sends_and_new_tool_calls() {
        let context = context_with(ClientCapabilities::default());
        context.session.cancel();

        let error = context.send_agent_message("late").await.unwrap_err();
        assert_eq!(error.kind, AcpErrorKind::Cancelled);

        let error = context
            .start_tool_call(crate::tool_call::ToolCallOptions::new("read_file"))
            .unwrap_err();
        assert_eq!(error.kind, AcpErrorKind::Cancelled);

        assert!(context.is_cancelled());
        assert!(context.check_cancelled().is_err());
    }
}
