//! # acpkit-agent
//!
//! The agent side of the Agent Client Protocol. An [`AgentConnection`]
//! binds a transport, negotiates capabilities, and routes `session/*`
//! traffic into a user-supplied [`PromptHandler`]. The handler works
//! through a [`SessionContext`]: streaming message and thought chunks,
//! plans, permission-gated tool calls, and file/terminal reverse RPCs,
//! with cooperative cancellation throughout.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use acpkit_agent::{AgentConfig, AgentConnection, PromptHandler, SessionContext};
//! use acpkit_protocol::{PromptRequest, PromptResponse, Result, StopReason, collect_text};
//! use acpkit_transport::StdioTransport;
//!
//! struct Echo;
//!
//! #[async_trait::async_trait]
//! impl PromptHandler for Echo {
//!     async fn handle_prompt(
//!         &self,
//!         session: SessionContext,
//!         request: PromptRequest,
//!     ) -> Result<PromptResponse> {
//!         let text = collect_text(&request.content);
//!         session.send_agent_message(format!("Echo: {text}")).await?;
//!         Ok(PromptResponse::stopped(StopReason::EndTurn))
//!     }
//! }
//!
//! # async fn run() -> Result<()> {
//! let connection = AgentConnection::connect(
//!     Arc::new(StdioTransport::new()),
//!     Arc::new(Echo),
//!     AgentConfig::new("echo-agent", "1.0.0"),
//! )
//! .await?;
//! connection.serve().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod agent;
mod context;
pub mod permission;
mod session;
mod terminal;
mod tool_call;

pub use agent::{AgentConfig, AgentConnection, PromptHandler};
pub use context::{SessionContext, TerminalOptions};
pub use session::{SessionData, SessionRegistry};
pub use terminal::TerminalHandle;
pub use tool_call::{ToolCallHandle, ToolCallOptions};
