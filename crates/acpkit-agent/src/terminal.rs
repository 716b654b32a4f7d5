//! Agent-side terminal handles.
//!
//! A [`TerminalHandle`] is the agent's scoped view of a client-hosted
//! terminal. Every operation is a reverse RPC; the handle additionally
//! enforces the released-state invariant locally so a released terminal
//! fails fast without a round trip.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::debug;

use acpkit_protocol::{
    AcpError, KillTerminalRequest, KillTerminalResponse, ReleaseTerminalRequest,
    ReleaseTerminalResponse, Result, SessionId, TerminalId, TerminalOutputRequest,
    TerminalOutputResponse, WaitForExitRequest, WaitForExitResponse, methods,
};
use acpkit_rpc::RpcEndpoint;

/// A handle to one client-hosted terminal.
///
/// Release is mandatory and idempotent; dropping the handle without
/// releasing leaks the remote terminal but corrupts nothing locally.
pub struct TerminalHandle {
    endpoint: Arc<RpcEndpoint>,
    session_id: SessionId,
    terminal_id: TerminalId,
    command: String,
    released: AtomicBool,
}

impl std::fmt::Debug for TerminalHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalHandle")
            .field("session_id", &self.session_id)
            .field("terminal_id", &self.terminal_id)
            .field("command", &self.command)
            .field("released", &self.is_released())
            .finish()
    }
}

impl TerminalHandle {
    pub(crate) fn new(
        endpoint: Arc<RpcEndpoint>,
        session_id: SessionId,
        terminal_id: TerminalId,
        command: String,
    ) -> Self {
        Self {
            endpoint,
            session_id,
            terminal_id,
            command,
            released: AtomicBool::new(false),
        }
    }

    /// The terminal's id
    pub fn id(&self) -> &TerminalId {
        &self.terminal_id
    }

    /// The command the terminal was created with
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Whether this handle has been released
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_released() {
            Err(AcpError::invalid_session_state(format!(
                "terminal {} has been released",
                self.terminal_id
            )))
        } else {
            Ok(())
        }
    }

    /// Fetch the accumulated output and, once exited, the exit status
    pub async fn output(&self) -> Result<TerminalOutputResponse> {
        self.ensure_active()?;
        self.endpoint
            .request_typed(
                methods::TERMINAL_OUTPUT,
                &TerminalOutputRequest {
                    session_id: self.session_id.clone(),
                    terminal_id: self.terminal_id.clone(),
                    meta: None,
                },
            )
            .await
    }

    /// Wait for the process to exit, optionally bounded by a timeout.
    ///
    /// The response's `exit_code` is null exactly when the process was
    /// terminated by signal or the wait timed out.
    pub async fn wait_for_exit(&self, timeout: Option<Duration>) -> Result<WaitForExitResponse> {
        self.ensure_active()?;
        self.endpoint
            .request_typed(
                methods::TERMINAL_WAIT_FOR_EXIT,
                &WaitForExitRequest {
                    session_id: self.session_id.clone(),
                    terminal_id: self.terminal_id.clone(),
                    timeout_ms: timeout.map(|t| t.as_millis() as u64),
                    meta: None,
                },
            )
            .await
    }

    /// Send a signal to the process; defaults to SIGTERM
    pub async fn kill(&self, signal: Option<&str>) -> Result<KillTerminalResponse> {
        self.ensure_active()?;
        self.endpoint
            .request_typed(
                methods::TERMINAL_KILL,
                &KillTerminalRequest {
                    session_id: self.session_id.clone(),
                    terminal_id: self.terminal_id.clone(),
                    signal: signal.map(str::to_string),
                    meta: None,
                },
            )
            .await
    }

    /// Release the terminal. Idempotent: the second call is a no-op.
    ///
    /// The released flag is set before the RPC so concurrent operations on
    /// this handle start failing immediately; a lost release leaks the
    /// remote resource but leaves local state consistent.
    pub async fn release(&self) -> Result<()> {
        if self.released.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        debug!(terminal = %self.terminal_id, "releasing terminal");
        let _: ReleaseTerminalResponse = self
            .endpoint
            .request_typed(
                methods::TERMINAL_RELEASE,
                &ReleaseTerminalRequest {
                    session_id: self.session_id.clone(),
                    terminal_id: self.terminal_id.clone(),
                    meta: None,
                },
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acpkit_protocol::AcpErrorKind;
    use acpkit_rpc::RpcEndpointConfig;
    use acpkit_transport::StdioTransport;
    use pretty_assertions::assert_eq;

    fn dangling_endpoint() -> Arc<RpcEndpoint> {
        // Never started: released-state enforcement fails before any RPC.
        let (rx, tx) = tokio::io::duplex(64);
        RpcEndpoint::new(
            Arc::new(StdioTransport::from_raw(rx, tx)),
            RpcEndpointConfig::default(),
        )
    }

    fn handle(endpoint: Arc<RpcEndpoint>) -> TerminalHandle {
        TerminalHandle::new(
            endpoint,
            SessionId::from("S"),
            TerminalId::from("t1"),
            "echo x".to_string(),
        )
    }

    #[tokio::test]
    async fn released_terminal_rejects_operations_by_name() {
        let terminal = handle(dangling_endpoint());
        terminal.released.store(true, Ordering::SeqCst);

        for error in [
            terminal.output().await.unwrap_err(),
            terminal.wait_for_exit(None).await.unwrap_err(),
            terminal.kill(None).await.unwrap_err(),
        ] {
            assert_eq!(error.kind, AcpErrorKind::InvalidSessionState);
            assert!(error.message.contains("t1"), "message names the terminal");
            assert!(error.message.contains("released"), "message says released");
        }
    }

    #[tokio::test]
    async fn second_release_is_a_no_op() {
        let terminal = handle(dangling_endpoint());
        terminal.released.store(true, Ordering::SeqCst);
        // Already released: returns Ok without any RPC.
        terminal.release().await.unwrap();
        terminal.release().await.unwrap();
        assert!(terminal.is_released());
    }
}
