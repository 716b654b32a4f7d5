//! The agent-side connection.
//!
//! [`AgentConnection`] wires an [`RpcEndpoint`] up as the agent end of an
//! ACP connection: it answers `initialize` and `authenticate`, owns the
//! session registry, and routes `session/*` requests into the
//! user-supplied [`PromptHandler`]. Capability gating and the
//! pre-initialization precondition live here.

use std::sync::Mutex as StdMutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use acpkit_protocol::{
    AcpError, AuthenticateRequest, AuthenticateResponse, CancelNotification, ClientCapabilities,
    ConfigOptionUpdate, EmptyResult, InitializeRequest, InitializeResponse, LoadSessionRequest,
    LoadSessionResponse, ModeUpdate, NewSessionRequest, NewSessionResponse, PROTOCOL_VERSION,
    PromptRequest, PromptResponse, Result, SessionUpdate, SetConfigOptionRequest, SetModeRequest,
    StopReason, methods,
};
use acpkit_rpc::{
    RpcEndpoint, RpcEndpointConfig, notification_handler, parse_params, request_handler,
    to_result_value,
};
use acpkit_transport::Transport;

use crate::context::{SessionContext, emit_update};
use crate::session::SessionRegistry;

/// The user-supplied prompt handler.
///
/// One call per `session/prompt` turn. The handler streams output and runs
/// tool calls through the [`SessionContext`]; returning a `cancelled` error
/// (or observing the flag and returning normally) resolves the turn with
/// `stopReason = cancelled`, any other error resolves it with
/// `stopReason = error`.
#[async_trait]
pub trait PromptHandler: Send + Sync + 'static {
    /// Run one prompt turn to completion
    async fn handle_prompt(
        &self,
        session: SessionContext,
        request: PromptRequest,
    ) -> Result<PromptResponse>;
}

/// Agent identity and behavior configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Identity reported in `initialize`
    pub agent_info: acpkit_protocol::Implementation,
    /// Capabilities advertised in `initialize`
    pub capabilities: acpkit_protocol::AgentCapabilities,
    /// Authentication methods; empty means none required
    pub auth_methods: Vec<acpkit_protocol::AuthMethod>,
    /// Engine configuration (timeouts, queue sizes)
    pub endpoint: RpcEndpointConfig,
}

impl AgentConfig {
    /// Configuration with the given identity and all defaults
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            agent_info: acpkit_protocol::Implementation::new(name, version),
            capabilities: acpkit_protocol::AgentCapabilities::default(),
            auth_methods: Vec::new(),
            endpoint: RpcEndpointConfig::default(),
        }
    }
}

struct AgentShared {
    config: AgentConfig,
    handler: Arc<dyn PromptHandler>,
    endpoint: Arc<RpcEndpoint>,
    sessions: SessionRegistry,
    /// `Some` once initialize succeeded; holds the client's capabilities
    negotiated: StdMutex<Option<ClientCapabilities>>,
    authenticated: AtomicBool,
}

impl AgentShared {
    fn client_capabilities(&self) -> Option<ClientCapabilities> {
        self.negotiated
            .lock()
            .expect("negotiated mutex poisoned")
            .clone()
    }

    /// Session methods require a completed handshake and, when the agent
    /// advertises auth methods, a successful authenticate.
    fn require_ready(&self) -> Result<ClientCapabilities> {
        let capabilities = self.client_capabilities().ok_or_else(|| {
            AcpError::invalid_session_state("initialize must complete before session methods")
        })?;
        if !self.config.auth_methods.is_empty() && !self.authenticated.load(Ordering::SeqCst) {
            return Err(AcpError::auth_required(
                "authenticate before using session methods",
            ));
        }
        Ok(capabilities)
    }

    async fn handle_initialize(&self, request: InitializeRequest) -> Result<InitializeResponse> {
        let version = request.protocol_version.min(PROTOCOL_VERSION);
        info!(
            client = %request.client_info.name,
            client_version = %request.client_info.version,
            protocol = version,
            "initialize"
        );
        *self.negotiated.lock().expect("negotiated mutex poisoned") =
            Some(request.capabilities);
        Ok(InitializeResponse {
            protocol_version: version,
            agent_info: self.config.agent_info.clone(),
            capabilities: self.config.capabilities.clone(),
            auth_methods: self.config.auth_methods.clone(),
            meta: None,
        })
    }

    async fn handle_authenticate(
        &self,
        request: AuthenticateRequest,
    ) -> Result<AuthenticateResponse> {
        if self.client_capabilities().is_none() {
            return Err(AcpError::invalid_session_state(
                "initialize must complete before authenticate",
            ));
        }
        let known = self
            .config
            .auth_methods
            .iter()
            .any(|method| method.id == request.method_id);
        if !known {
            return Err(AcpError::invalid_params(format!(
                "unknown auth method: {}",
                request.method_id
            )));
        }
        self.authenticated.store(true, Ordering::SeqCst);
        debug!(method = %request.method_id, "authenticated");
        Ok(AuthenticateResponse::default())
    }

    async fn handle_new_session(&self, request: NewSessionRequest) -> Result<NewSessionResponse> {
        self.require_ready()?;
        let session = self.sessions.create(request);
        Ok(NewSessionResponse {
            session_id: session.id().clone(),
            created_at: session.created_at(),
            meta: None,
        })
    }

    async fn handle_load_session(
        &self,
        request: LoadSessionRequest,
    ) -> Result<LoadSessionResponse> {
        self.require_ready()?;
        if !self.config.capabilities.load_session {
            return Err(AcpError::capability_not_supported("loadSession"));
        }
        let session = self.sessions.get(&request.session_id)?;
        Ok(LoadSessionResponse {
            session_id: session.id().clone(),
            working_directory: session.working_directory().to_path_buf(),
            mode: session.mode(),
            created_at: session.created_at(),
            meta: None,
        })
    }

    async fn handle_prompt(&self, request: PromptRequest) -> Result<PromptResponse> {
        let capabilities = self.require_ready()?;
        let session = self.sessions.get(&request.session_id)?;
        // A cancelled session rejects new prompt turns outright.
        session.check_cancelled()?;

        let context = SessionContext::new(
            Arc::clone(&session),
            Arc::clone(&self.endpoint),
            capabilities,
        );
        match self.handler.handle_prompt(context, request).await {
            Ok(mut response) => {
                // A turn that raced cancellation reports it as the stop
                // reason even when the handler finished normally.
                if session.is_cancelled() {
                    response.stop_reason = StopReason::Cancelled;
                }
                Ok(response)
            }
            Err(error) if error.is_cancelled() => {
                Ok(PromptResponse::stopped(StopReason::Cancelled))
            }
            Err(error) => {
                warn!(session = %session.id(), %error, "prompt handler failed");
                Ok(PromptResponse::stopped(StopReason::Error))
            }
        }
    }

    async fn handle_set_mode(&self, request: SetModeRequest) -> Result<EmptyResult> {
        self.require_ready()?;
        let supported = self
            .config
            .capabilities
            .session_capabilities
            .is_some_and(|s| s.modes);
        if !supported {
            return Err(AcpError::capability_not_supported("sessionCapabilities.modes"));
        }
        let session = self.sessions.get(&request.session_id)?;
        session.check_cancelled()?;

        let previous = session.replace_mode(request.mode.clone());
        emit_update(
            &self.endpoint,
            session.id().clone(),
            SessionUpdate::CurrentModeUpdate(ModeUpdate {
                previous_mode: previous,
                current_mode: request.mode,
                reason: request.reason,
            }),
        )
        .await?;
        Ok(EmptyResult::default())
    }

    async fn handle_set_config_option(
        &self,
        request: SetConfigOptionRequest,
    ) -> Result<EmptyResult> {
        self.require_ready()?;
        let supported = self
            .config
            .capabilities
            .session_capabilities
            .is_some_and(|s| s.config_options);
        if !supported {
            return Err(AcpError::capability_not_supported(
                "sessionCapabilities.configOptions",
            ));
        }
        let session = self.sessions.get(&request.session_id)?;
        session.check_cancelled()?;

        let previous = session.replace_config_option(request.key.clone(), request.value.clone());
        emit_update(
            &self.endpoint,
            session.id().clone(),
            SessionUpdate::ConfigOptionUpdate(ConfigOptionUpdate {
                key: request.key,
                previous_value: previous,
                current_value: request.value,
                source: request.source,
            }),
        )
        .await?;
        Ok(EmptyResult::default())
    }

    fn handle_cancel(&self, notification: CancelNotification) {
        match self.sessions.cancel(&notification.session_id) {
            Ok(()) => debug!(session = %notification.session_id, "cancel received"),
            Err(_) => debug!(
                session = %notification.session_id,
                "cancel for unknown session, ignoring"
            ),
        }
    }
}

/// The agent end of an ACP connection
pub struct AgentConnection {
    shared: Arc<AgentShared>,
}

impl std::fmt::Debug for AgentConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConnection")
            .field("agent", &self.shared.config.agent_info.name)
            .field("sessions", &self.shared.sessions)
            .finish_non_exhaustive()
    }
}

impl AgentConnection {
    /// Bind an agent to a transport and start serving.
    ///
    /// Handlers are registered before the transport starts, so no inbound
    /// message can race the setup.
    pub async fn connect(
        transport: Arc<dyn Transport>,
        handler: Arc<dyn PromptHandler>,
        config: AgentConfig,
    ) -> Result<Self> {
        let endpoint = RpcEndpoint::new(transport, config.endpoint.clone());
        let shared = Arc::new(AgentShared {
            config,
            handler,
            endpoint: Arc::clone(&endpoint),
            sessions: SessionRegistry::new(),
            negotiated: StdMutex::new(None),
            authenticated: AtomicBool::new(false),
        });
        Self::register(&shared);

        // Transport closure cancels every session.
        {
            let shared = Arc::clone(&shared);
            endpoint.on_close(move || shared.sessions.teardown_all());
        }

        endpoint.start().await?;
        Ok(Self { shared })
    }

    fn register(shared: &Arc<AgentShared>) {
        let endpoint = &shared.endpoint;

        let s = Arc::clone(shared);
        endpoint.on_request(
            methods::INITIALIZE,
            request_handler(move |params| {
                let s = Arc::clone(&s);
                async move {
                    let request = parse_params(params)?;
                    to_result_value(&s.handle_initialize(request).await?)
                }
            }),
        );

        let s = Arc::clone(shared);
        endpoint.on_request(
            methods::AUTHENTICATE,
            request_handler(move |params| {
                let s = Arc::clone(&s);
                async move {
                    let request = parse_params(params)?;
                    to_result_value(&s.handle_authenticate(request).await?)
                }
            }),
        );

        let s = Arc::clone(shared);
        endpoint.on_request(
            methods::SESSION_NEW,
            request_handler(move |params| {
                let s = Arc::clone(&s);
                async move {
                    let request = parse_params(params)?;
                    to_result_value(&s.handle_new_session(request).await?)
                }
            }),
        );

        let s = Arc::clone(shared);
        endpoint.on_request(
            methods::SESSION_LOAD,
            request_handler(move |params| {
                let s = Arc::clone(&s);
                async move {
                    let request = parse_params(params)?;
                    to_result_value(&s.handle_load_session(request).await?)
                }
            }),
        );

        let s = Arc::clone(shared);
        endpoint.on_request(
            methods::SESSION_PROMPT,
            request_handler(move |params| {
                let s = Arc::clone(&s);
                async move {
                    let request = parse_params(params)?;
                    to_result_value(&s.handle_prompt(request).await?)
                }
            }),
        );

        let s = Arc::clone(shared);
        endpoint.on_request(
            methods::SESSION_SET_MODE,
            request_handler(move |params| {
                let s = Arc::clone(&s);
                async move {
                    let request = parse_params(params)?;
                    to_result_value(&s.handle_set_mode(request).await?)
                }
            }),
        );

        let s = Arc::clone(shared);
        endpoint.on_request(
            methods::SESSION_SET_CONFIG_OPTION,
            request_handler(move |params| {
                let s = Arc::clone(&s);
                async move {
                    let request = parse_params(params)?;
                    to_result_value(&s.handle_set_config_option(request).await?)
                }
            }),
        );

        let s = Arc::clone(shared);
        endpoint.on_notification(
            methods::SESSION_CANCEL,
            notification_handler(move |params| {
                let s = Arc::clone(&s);
                async move {
                    let notification = parse_params(params)?;
                    s.handle_cancel(notification);
                    Ok(())
                }
            }),
        );
    }

    /// The underlying engine, for vendor extension methods
    pub fn endpoint(&self) -> &Arc<RpcEndpoint> {
        &self.shared.endpoint
    }

    /// The live session registry
    pub fn sessions(&self) -> &SessionRegistry {
        &self.shared.sessions
    }

    /// Wait until the connection closes
    pub async fn serve(&self) {
        self.shared.endpoint.wait_closed().await;
    }

    /// Close the connection, cancelling every session
    pub async fn close(&self) {
        self.shared.endpoint.close().await;
    }
}
