//! # acpkit
//!
//! An SDK for the Agent Client Protocol (ACP): a bidirectional JSON-RPC
//! 2.0 channel connecting a trusted editor-style **client** to an AI
//! **agent**. The client mediates workspace access (files, terminals) and
//! permission decisions; the agent handles prompts, streams updates, and
//! reaches back through reverse RPCs.
//!
//! This crate re-exports the workspace layers:
//!
//! - [`protocol`] — wire types, JSON-RPC envelope, codec, error taxonomy
//! - [`transport`] — the transport contract, stdio and HTTP carriers
//! - [`rpc`] — the protocol engine (dispatch, correlation, timeouts)
//! - [`agent`] — the agent side: sessions, tool calls, permissions,
//!   terminals
//! - [`client`] — the client side: session methods and the reverse-RPC
//!   surface
//!
//! Most applications only need the [`prelude`].

#![warn(missing_docs, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use acpkit_agent as agent;
pub use acpkit_client as client;
pub use acpkit_protocol as protocol;
pub use acpkit_rpc as rpc;
pub use acpkit_transport as transport;

/// The commonly needed surface in one import
pub mod prelude {
    pub use acpkit_agent::{
        AgentConfig, AgentConnection, PromptHandler, SessionContext, TerminalOptions,
        ToolCallHandle, ToolCallOptions,
    };
    pub use acpkit_client::{Client, ClientConfig, ClientConnection, LocalFileSystem};
    pub use acpkit_protocol::{
        AcpError, AcpErrorKind, ClientCapabilities, ContentBlock, FsCapabilities, Implementation,
        PermissionDecision, PermissionOutcome, Plan, PlanStep, PlanStepStatus, PromptRequest,
        PromptResponse, Result, SessionId, SessionNotification, SessionUpdate, StopReason,
        ToolCallContent, ToolCallStatus, ToolKind, collect_text,
    };
    pub use acpkit_rpc::{RpcEndpoint, RpcEndpointConfig};
    pub use acpkit_transport::{
        HttpClientTransport, HttpServerConfig, HttpServerTransport, StdioTransport, Transport,
    };
    pub use async_trait::async_trait;
}
