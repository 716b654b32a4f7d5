//! ACP wire types.
//!
//! Everything that crosses the wire is defined here, grouped by concern.
//! All structs serialize with camelCase field names, omit absent optionals,
//! and carry `_meta` extension slots where the protocol allows them.

pub mod content;
pub mod fs;
pub mod initialize;
pub mod permission;
pub mod session;
pub mod terminal;
pub mod tool_call;
pub mod update;

pub use content::{Annotations, Audience, ContentBlock, MediaSource, collect_text};
pub use fs::{
    DEFAULT_ENCODING, ReadTextFileRequest, ReadTextFileResponse, WriteTextFileRequest,
    WriteTextFileResponse,
};
pub use initialize::{
    AgentCapabilities, AuthMethod, AuthenticateRequest, AuthenticateResponse, ClientCapabilities,
    FsCapabilities, Implementation, InitializeRequest, InitializeResponse, McpCapabilities,
    PROTOCOL_VERSION, PromptCapabilities, ProtocolVersion, SessionCapabilities,
    TerminalCapabilities, UiCapabilities,
};
pub use permission::{
    PermissionDecision, PermissionOperation, PermissionOption, PermissionOptionKind,
    PermissionOutcome, PermissionScope, RequestPermissionRequest, RequestPermissionResponse,
};
pub use session::{
    CancelNotification, ConfigSource, DEFAULT_SESSION_MODE, EmptyResult, LoadSessionRequest,
    LoadSessionResponse, McpServerConfig, NewSessionRequest, NewSessionResponse, PromptRequest,
    PromptResponse, SessionId, SetConfigOptionRequest, SetModeRequest, StopReason, Usage,
};
pub use terminal::{
    CreateTerminalRequest, CreateTerminalResponse, DEFAULT_KILL_SIGNAL, KillTerminalRequest,
    KillTerminalResponse, ReleaseTerminalRequest, ReleaseTerminalResponse, TerminalExitStatus,
    TerminalId, TerminalOutputRequest, TerminalOutputResponse, WaitForExitRequest,
    WaitForExitResponse,
};
pub use tool_call::{
    DiffHunk, ToolCall, ToolCallContent, ToolCallId, ToolCallLocation, ToolCallStatus,
    ToolCallUpdate, ToolKind,
};
pub use update::{
    AvailableCommands, CommandArg, CommandInfo, ConfigOptionUpdate, MessageChunk, ModeUpdate,
    Plan, PlanStep, PlanStepStatus, SessionNotification, SessionUpdate, ThoughtChunk,
};
