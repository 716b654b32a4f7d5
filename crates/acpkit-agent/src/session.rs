//! Session state and the session registry.
//!
//! A session is an independent conversation scope: working directory, mode,
//! configuration options, a cancellation flag, and the per-session counters
//! behind chunk indices and tool-call ids. The registry owns the live set
//! and is the single writer of each session's cancellation flag.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use acpkit_protocol::{
    AcpError, DEFAULT_SESSION_MODE, McpServerConfig, NewSessionRequest, Result, SessionId,
    ToolCallId,
};

/// State of one live session
pub struct SessionData {
    id: SessionId,
    working_directory: PathBuf,
    mcp_servers: Vec<McpServerConfig>,
    system_prompt: Option<String>,
    created_at: DateTime<Utc>,
    mode: StdMutex<String>,
    config_options: StdMutex<HashMap<String, Value>>,
    cancelled: AtomicBool,
    user_chunk_counter: AtomicU64,
    agent_chunk_counter: AtomicU64,
    thought_chunk_counter: AtomicU64,
    tool_call_counter: AtomicU64,
}

impl std::fmt::Debug for SessionData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionData")
            .field("id", &self.id)
            .field("working_directory", &self.working_directory)
            .field("mode", &self.mode)
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl SessionData {
    fn new(id: SessionId, options: NewSessionRequest) -> Self {
        let mode = options
            .mode
            .unwrap_or_else(|| DEFAULT_SESSION_MODE.to_string());
        Self {
            id,
            working_directory: options.working_directory,
            mcp_servers: options.mcp_servers,
            system_prompt: options.system_prompt,
            created_at: Utc::now(),
            mode: StdMutex::new(mode),
            config_options: StdMutex::new(options.config_options),
            cancelled: AtomicBool::new(false),
            user_chunk_counter: AtomicU64::new(0),
            agent_chunk_counter: AtomicU64::new(0),
            thought_chunk_counter: AtomicU64::new(0),
            tool_call_counter: AtomicU64::new(0),
        }
    }

    /// The session's id
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// The working directory, immutable post-creation
    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// The MCP servers attached at creation, opaque to the core
    pub fn mcp_servers(&self) -> &[McpServerConfig] {
        &self.mcp_servers
    }

    /// The system prompt, when one was supplied
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    /// When the session was created
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The current mode
    pub fn mode(&self) -> String {
        self.mode.lock().expect("mode mutex poisoned").clone()
    }

    /// Switch the mode, returning the previous one
    pub fn replace_mode(&self, mode: impl Into<String>) -> String {
        let mut current = self.mode.lock().expect("mode mutex poisoned");
        std::mem::replace(&mut current, mode.into())
    }

    /// Read one configuration option
    pub fn config_option(&self, key: &str) -> Option<Value> {
        self.config_options
            .lock()
            .expect("config mutex poisoned")
            .get(key)
            .cloned()
    }

    /// Set one configuration option, returning the previous value
    pub fn replace_config_option(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.config_options
            .lock()
            .expect("config mutex poisoned")
            .insert(key.into(), value)
    }

    /// Whether the session has been cancelled; the flag is never cleared
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with a cancelled error when the flag is set.
    ///
    /// Cooperative handlers call this at suspension points.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(AcpError::cancelled(format!(
                "session {} has been cancelled",
                self.id
            )))
        } else {
            Ok(())
        }
    }

    /// Set the cancellation flag; idempotent
    pub(crate) fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            debug!(session = %self.id, "session cancelled");
        }
    }

    /// Next auto-assigned agent-message chunk index (0-based, monotone)
    pub(crate) fn next_agent_chunk_index(&self) -> u64 {
        self.agent_chunk_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Next auto-assigned thought chunk index (0-based, monotone)
    pub(crate) fn next_thought_chunk_index(&self) -> u64 {
        self.thought_chunk_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Next auto-assigned user-message chunk index (0-based, monotone)
    pub(crate) fn next_user_chunk_index(&self) -> u64 {
        self.user_chunk_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Allocate the next tool-call id within this session
    pub(crate) fn next_tool_call_id(&self) -> ToolCallId {
        let n = self.tool_call_counter.fetch_add(1, Ordering::SeqCst) + 1;
        ToolCallId(format!("tc_{n}"))
    }
}

/// The set of live sessions
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Arc<SessionData>>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("len", &self.sessions.len())
            .finish()
    }
}

impl SessionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session from `session/new` options and register it.
    ///
    /// Ids are opaque and unpredictable. No updates are emitted.
    pub fn create(&self, options: NewSessionRequest) -> Arc<SessionData> {
        let id = SessionId(format!("sess_{}", Uuid::new_v4().simple()));
        let session = Arc::new(SessionData::new(id.clone(), options));
        debug!(session = %id, "session created");
        self.sessions.insert(id, Arc::clone(&session));
        session
    }

    /// Look up a session; absent ids fail with `session_not_found`
    pub fn get(&self, id: &SessionId) -> Result<Arc<SessionData>> {
        self.sessions
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| AcpError::session_not_found(id))
    }

    /// Cancel a session: set its flag.
    ///
    /// Subsequent operations in the session fail with `cancelled`; pending
    /// tool calls transition to `cancelled` on their next send.
    pub fn cancel(&self, id: &SessionId) -> Result<()> {
        let session = self.get(id)?;
        session.cancel();
        Ok(())
    }

    /// Cancel every session and drop all references
    pub fn teardown_all(&self) {
        for entry in self.sessions.iter() {
            entry.value().cancel();
        }
        self.sessions.clear();
        debug!("all sessions torn down");
    }

    /// Number of live sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
