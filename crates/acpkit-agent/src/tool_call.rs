//! The tool-call builder.
//!
//! A [`ToolCallHandle`] is an owned, mutable record of one tool call,
//! distinct from the immutable wire objects it emits. The first `send`
//! emits the full `tool_call` session update; every later `send` emits a
//! `tool_call_update` carrying only the id, the new status, and whatever
//! output, error, or duration accompanies it. Transitions not on the state
//! diagram are refused rather than emitted, and a handle in a cancelled
//! session emits `cancelled` on its next send and then goes quiet.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{Map, Value};
use tracing::trace;

use acpkit_protocol::{
    AcpError, Result, SessionUpdate, ToolCall, ToolCallContent, ToolCallId, ToolCallLocation,
    ToolCallStatus, ToolCallUpdate, ToolKind,
};
use acpkit_rpc::RpcEndpoint;

use crate::context::emit_update;
use crate::session::SessionData;

/// What to start a tool call with
#[derive(Debug, Clone)]
pub struct ToolCallOptions {
    /// Tool name
    pub name: String,
    /// Tool input
    pub input: Map<String, Value>,
    /// Broad classification
    pub kind: Option<ToolKind>,
    /// Where the tool operates
    pub location: Option<ToolCallLocation>,
    /// Why the agent is calling it
    pub reason: Option<String>,
    /// Whether a permission decision gates execution
    pub requires_permission: bool,
}

impl ToolCallOptions {
    /// Options for a tool with the given name and no input
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: Map::new(),
            kind: None,
            location: None,
            reason: None,
            requires_permission: false,
        }
    }

    /// Set the input map from any JSON object value
    #[must_use]
    pub fn input(mut self, input: Value) -> Self {
        if let Value::Object(map) = input {
            self.input = map;
        }
        self
    }

    /// Set the tool kind
    #[must_use]
    pub fn kind(mut self, kind: ToolKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set the location
    #[must_use]
    pub fn location(mut self, location: ToolCallLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Set the reason
    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Mark the call as permission-gated
    #[must_use]
    pub fn requires_permission(mut self, requires: bool) -> Self {
        self.requires_permission = requires;
        self
    }
}

/// An in-flight tool call, owned by the prompt handler until terminalized
pub struct ToolCallHandle {
    endpoint: Arc<RpcEndpoint>,
    session: Arc<SessionData>,
    id: ToolCallId,
    name: String,
    input: Map<String, Value>,
    kind: Option<ToolKind>,
    location: Option<ToolCallLocation>,
    reason: Option<String>,
    requires_permission: bool,
    status: ToolCallStatus,
    sent_initial: bool,
    output: Option<ToolCallContent>,
    output_dirty: bool,
    error: Option<String>,
    error_dirty: bool,
    started: Instant,
}

impl std::fmt::Debug for ToolCallHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolCallHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("status", &self.status)
            .field("sent_initial", &self.sent_initial)
            .finish_non_exhaustive()
    }
}

impl ToolCallHandle {
    pub(crate) fn new(
        endpoint: Arc<RpcEndpoint>,
        session: Arc<SessionData>,
        id: ToolCallId,
        options: ToolCallOptions,
    ) -> Self {
        Self {
            endpoint,
            session,
            id,
            name: options.name,
            input: options.input,
            kind: options.kind,
            location: options.location,
            reason: options.reason,
            requires_permission: options.requires_permission,
            status: ToolCallStatus::Pending,
            sent_initial: false,
            output: None,
            output_dirty: false,
            error: None,
            error_dirty: false,
            started: Instant::now(),
        }
    }

    /// The call's id
    pub fn id(&self) -> &ToolCallId {
        &self.id
    }

    /// The tool name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tool input
    pub fn input(&self) -> &Map<String, Value> {
        &self.input
    }

    /// The tool kind, when classified
    pub fn kind(&self) -> Option<ToolKind> {
        self.kind
    }

    /// The location, when known
    pub fn location(&self) -> Option<&ToolCallLocation> {
        self.location.as_ref()
    }

    /// The current status
    pub fn status(&self) -> ToolCallStatus {
        self.status
    }

    /// Whether the call has reached a terminal status
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Set (or replace) the output content.
    ///
    /// Permitted while the call is non-terminal; the content rides along on
    /// the next send.
    pub fn set_output(&mut self, output: ToolCallContent) -> Result<()> {
        if self.is_terminal() {
            return Err(AcpError::invalid_session_state(format!(
                "tool call {} is already {}",
                self.id, self.status
            )));
        }
        self.output = Some(output);
        self.output_dirty = true;
        Ok(())
    }

    /// Set the error text, carried on the next send
    pub fn set_error(&mut self, error: impl Into<String>) -> Result<()> {
        if self.is_terminal() {
            return Err(AcpError::invalid_session_state(format!(
                "tool call {} is already {}",
                self.id, self.status
            )));
        }
        self.error = Some(error.into());
        self.error_dirty = true;
        Ok(())
    }

    /// Emit the next status.
    ///
    /// Returns the status actually emitted: in a cancelled session that is
    /// `cancelled` regardless of the argument. Invalid transitions and
    /// sends after a terminal status fail without emitting anything.
    pub async fn send(&mut self, status: ToolCallStatus) -> Result<ToolCallStatus> {
        if self.is_terminal() {
            return Err(AcpError::invalid_session_state(format!(
                "tool call {} is already {}; terminal states are absorbing",
                self.id, self.status
            )));
        }

        let status = if self.session.is_cancelled() {
            ToolCallStatus::Cancelled
        } else {
            status
        };

        let valid = status == self.status || self.status.can_transition_to(status);
        if !valid {
            return Err(AcpError::invalid_session_state(format!(
                "invalid tool-call transition {} -> {} for {}",
                self.status, status, self.id
            )));
        }

        self.status = status;
        let update = if self.sent_initial {
            SessionUpdate::ToolCallUpdate(self.to_update())
        } else {
            SessionUpdate::ToolCall(self.to_full())
        };

        emit_update(&self.endpoint, self.session.id().clone(), update).await?;
        trace!(id = %self.id, %status, initial = !self.sent_initial, "tool-call send");
        self.sent_initial = true;
        self.output_dirty = false;
        self.error_dirty = false;
        Ok(status)
    }

    /// Set output (when given) and emit `completed`
    pub async fn complete(&mut self, output: Option<ToolCallContent>) -> Result<ToolCallStatus> {
        if let Some(output) = output {
            self.set_output(output)?;
        }
        self.send(ToolCallStatus::Completed).await
    }

    /// Set the error text and emit `failed`
    pub async fn fail(&mut self, error: impl Into<String>) -> Result<ToolCallStatus> {
        self.set_error(error)?;
        self.send(ToolCallStatus::Failed).await
    }

    fn duration_for(&self, status: ToolCallStatus) -> Option<u64> {
        status
            .is_terminal()
            .then(|| self.started.elapsed().as_millis() as u64)
    }

    fn to_full(&self) -> ToolCall {
        ToolCall {
            id: self.id.clone(),
            name: self.name.clone(),
            input: self.input.clone(),
            status: self.status,
            kind: self.kind,
            location: self.location.clone(),
            reason: self.reason.clone(),
            output: self.output.clone(),
            error: self.error.clone(),
            duration: self.duration_for(self.status),
            requires_permission: self.requires_permission,
        }
    }

    fn to_update(&self) -> ToolCallUpdate {
        ToolCallUpdate {
            id: self.id.clone(),
            status: self.status,
            output: self.output_dirty.then(|| self.output.clone()).flatten(),
            error: self.error_dirty.then(|| self.error.clone()).flatten(),
            duration: self.duration_for(self.status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionRegistry;
    use acpkit_protocol::{
        AcpErrorKind, NewSessionRequest, SessionNotification, methods,
    };
    use acpkit_rpc::{RpcEndpointConfig, notification_handler, parse_params};
    use acpkit_transport::StdioTransport;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    type Updates = Arc<StdMutex<Vec<SessionNotification>>>;

    /// An endpoint whose peer records every session/update it receives.
    async fn harness() -> (Arc<RpcEndpoint>, Arc<RpcEndpoint>, Arc<SessionData>, Updates) {
        let (agent_rx, peer_tx) = tokio::io::duplex(64 * 1024);
        let (peer_rx, agent_tx) = tokio::io::duplex(64 * 1024);
        let endpoint = RpcEndpoint::new(
            Arc::new(StdioTransport::from_raw(agent_rx, agent_tx)),
            RpcEndpointConfig::default(),
        );
        let peer = RpcEndpoint::new(
            Arc::new(StdioTransport::from_raw(peer_rx, peer_tx)),
            RpcEndpointConfig::default(),
        );

        let updates: Updates = Arc::new(StdMutex::new(Vec::new()));
        {
            let updates = Arc::clone(&updates);
            peer.on_notification(
                methods::SESSION_UPDATE,
                notification_handler(move |params| {
                    let updates = Arc::clone(&updates);
                    async move {
                        let notification = parse_params(params)?;
                        updates.lock().unwrap().push(notification);
                        Ok(())
                    }
                }),
            );
        }
        endpoint.start().await.unwrap();
        peer.start().await.unwrap();

        let registry = SessionRegistry::new();
        let session = registry.create(NewSessionRequest {
            working_directory: "/w".into(),
            mcp_servers: Vec::new(),
            system_prompt: None,
            mode: None,
            config_options: Default::default(),
            meta: None,
        });
        (endpoint, peer, session, updates)
    }

    async fn wait_updates(updates: &Updates, count: usize) -> Vec<SessionNotification> {
        for _ in 0..200 {
            if updates.lock().unwrap().len() >= count {
                return updates.lock().unwrap().clone();
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {count} updates, saw {:?}", updates.lock().unwrap());
    }

    fn handle(endpoint: &Arc<RpcEndpoint>, session: &Arc<SessionData>) -> ToolCallHandle {
        ToolCallHandle::new(
            Arc::clone(endpoint),
            Arc::clone(session),
            session.next_tool_call_id(),
            ToolCallOptions::new("read_file").kind(ToolKind::Read),
        )
    }

    #[tokio::test]
    async fn first_send_is_full_object_then_updates_only() {
        let (endpoint, _peer, session, updates) = harness().await;
        let mut call = handle(&endpoint, &session);

        call.send(ToolCallStatus::InProgress).await.unwrap();
        call.set_output(ToolCallContent::Text {
            text: "contents".to_string(),
        })
        .unwrap();
        call.send(ToolCallStatus::Completed).await.unwrap();

        let seen = wait_updates(&updates, 2).await;
        match &seen[0].update {
            SessionUpdate::ToolCall(full) => {
                assert_eq!(full.id, *call.id());
                assert_eq!(full.name, "read_file");
                assert_eq!(full.status, ToolCallStatus::InProgress);
            }
            other => panic!("expected full tool_call, got {other:?}"),
        }
        match &seen[1].update {
            SessionUpdate::ToolCallUpdate(update) => {
                assert_eq!(update.status, ToolCallStatus::Completed);
                assert!(update.output.is_some());
                assert!(update.duration.is_some());
            }
            other => panic!("expected tool_call_update, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_transition_is_refused_without_emitting() {
        let (endpoint, _peer, session, updates) = harness().await;
        let mut call = handle(&endpoint, &session);

        call.send(ToolCallStatus::InProgress).await.unwrap();
        let error = call
            .send(ToolCallStatus::AwaitingPermission)
            .await
            .unwrap_err();
        assert_eq!(error.kind, AcpErrorKind::InvalidSessionState);

        call.send(ToolCallStatus::Completed).await.unwrap();
        let seen = wait_updates(&updates, 2).await;
        assert_eq!(seen.len(), 2, "the refused transition emitted nothing");
    }

    #[tokio::test]
    async fn terminal_states_absorb_sends_and_mutation() {
        let (endpoint, _peer, session, _updates) = harness().await;
        let mut call = handle(&endpoint, &session);

        call.send(ToolCallStatus::InProgress).await.unwrap();
        call.fail("tool exploded").await.unwrap();
        assert!(call.is_terminal());

        let error = call.send(ToolCallStatus::Completed).await.unwrap_err();
        assert_eq!(error.kind, AcpErrorKind::InvalidSessionState);
        assert!(error.message.contains("absorbing"));

        let error = call
            .set_output(ToolCallContent::Text {
                text: "late".to_string(),
            })
            .unwrap_err();
        assert_eq!(error.kind, AcpErrorKind::InvalidSessionState);
    }

    #[tokio::test]
    async fn cancelled_session_forces_cancelled_on_next_send() {
        let (endpoint, _peer, session, updates) = harness().await;
        let mut call = handle(&endpoint, &session);
        call.send(ToolCallStatus::InProgress).await.unwrap();

        session.cancel();
        let emitted = call.send(ToolCallStatus::Completed).await.unwrap();
        assert_eq!(emitted, ToolCallStatus::Cancelled);

        // No further updates follow.
        let error = call.send(ToolCallStatus::Completed).await.unwrap_err();
        assert_eq!(error.kind, AcpErrorKind::InvalidSessionState);

        let seen = wait_updates(&updates, 2).await;
        match &seen[1].update {
            SessionUpdate::ToolCallUpdate(update) => {
                assert_eq!(update.status, ToolCallStatus::Cancelled);
            }
            other => panic!("expected cancelled update, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn output_rides_only_the_send_that_set_it() {
        let (endpoint, _peer, session, updates) = harness().await;
        let mut call = handle(&endpoint, &session);

        call.set_output(ToolCallContent::Text {
            text: "early".to_string(),
        })
        .unwrap();
        call.send(ToolCallStatus::InProgress).await.unwrap();
        // Same status again, no new output set: the update carries none.
        call.send(ToolCallStatus::InProgress).await.unwrap();

        let seen = wait_updates(&updates, 2).await;
        match &seen[0].update {
            SessionUpdate::ToolCall(full) => assert!(full.output.is_some()),
            other => panic!("expected full tool_call, got {other:?}"),
        }
        match &seen[1].update {
            SessionUpdate::ToolCallUpdate(update) => assert!(update.output.is_none()),
            other => panic!("expected tool_call_update, got {other:?}"),
        }
    }
}
