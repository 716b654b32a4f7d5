//! The client-side connection.
//!
//! [`ClientConnection`] drives the agent: initialize, authenticate, and the
//! `session/*` methods. The host application implements [`Client`] to serve
//! the agent's reverse RPCs (permission prompts, file access, terminals)
//! and to receive streamed `session/update` notifications. Default trait
//! implementations decline everything the host did not opt into, with
//! `capability_not_supported`.

use std::path::PathBuf;
use std::sync::Mutex as StdMutex;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use acpkit_protocol::{
    AcpError, AgentCapabilities, AuthenticateRequest, AuthenticateResponse, CancelNotification,
    ClientCapabilities, ContentBlock, CreateTerminalRequest, CreateTerminalResponse, EmptyResult,
    Implementation, InitializeRequest, InitializeResponse, KillTerminalRequest,
    KillTerminalResponse, LoadSessionRequest, LoadSessionResponse, NewSessionRequest,
    NewSessionResponse, PROTOCOL_VERSION, PromptRequest, PromptResponse, ReadTextFileRequest,
    ReadTextFileResponse, ReleaseTerminalRequest, ReleaseTerminalResponse,
    RequestPermissionRequest, RequestPermissionResponse, Result, SessionId, SessionNotification,
    SetConfigOptionRequest, SetModeRequest, TerminalOutputRequest, TerminalOutputResponse,
    WaitForExitRequest, WaitForExitResponse, WriteTextFileRequest, WriteTextFileResponse,
    methods,
};
use acpkit_rpc::{
    RpcEndpoint, RpcEndpointConfig, notification_handler, parse_params, request_handler,
    to_result_value,
};
use acpkit_transport::Transport;

/// The host application's side of the protocol.
///
/// `session_update` and `request_permission` are the two obligations every
/// client has; the file-system, terminal, and UI methods default to
/// declining, matching a client that did not advertise those capabilities.
#[async_trait]
pub trait Client: Send + Sync + 'static {
    /// Receive one streamed session update
    async fn session_update(&self, notification: SessionNotification);

    /// Decide a permission request on the user's behalf
    async fn request_permission(
        &self,
        request: RequestPermissionRequest,
    ) -> Result<RequestPermissionResponse>;

    /// Serve `fs/read_text_file`
    async fn read_text_file(&self, request: ReadTextFileRequest) -> Result<ReadTextFileResponse> {
        let _ = request;
        Err(AcpError::capability_not_supported("fs.read"))
    }

    /// Serve `fs/write_text_file`
    async fn write_text_file(
        &self,
        request: WriteTextFileRequest,
    ) -> Result<WriteTextFileResponse> {
        let _ = request;
        Err(AcpError::capability_not_supported("fs.write"))
    }

    /// Serve `terminal/create`
    async fn create_terminal(
        &self,
        request: CreateTerminalRequest,
    ) -> Result<CreateTerminalResponse> {
        let _ = request;
        Err(AcpError::capability_not_supported("terminal"))
    }

    /// Serve `terminal/output`
    async fn terminal_output(
        &self,
        request: TerminalOutputRequest,
    ) -> Result<TerminalOutputResponse> {
        let _ = request;
        Err(AcpError::capability_not_supported("terminal"))
    }

    /// Serve `terminal/wait_for_exit`
    async fn wait_for_exit(&self, request: WaitForExitRequest) -> Result<WaitForExitResponse> {
        let _ = request;
        Err(AcpError::capability_not_supported("terminal"))
    }

    /// Serve `terminal/kill`
    async fn kill_terminal(&self, request: KillTerminalRequest) -> Result<KillTerminalResponse> {
        let _ = request;
        Err(AcpError::capability_not_supported("terminal"))
    }

    /// Serve `terminal/release`
    async fn release_terminal(
        &self,
        request: ReleaseTerminalRequest,
    ) -> Result<ReleaseTerminalResponse> {
        let _ = request;
        Err(AcpError::capability_not_supported("terminal"))
    }

    /// Serve an agent-driven `session/set_mode`
    async fn set_mode(&self, request: SetModeRequest) -> Result<EmptyResult> {
        let _ = request;
        Err(AcpError::capability_not_supported("ui"))
    }
}

/// Client identity and behavior configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Identity sent in `initialize`
    pub client_info: Implementation,
    /// Capabilities the host actually serves
    pub capabilities: ClientCapabilities,
    /// Engine configuration (timeouts, queue sizes)
    pub endpoint: RpcEndpointConfig,
}

impl ClientConfig {
    /// Configuration with the given identity and no capabilities
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            client_info: Implementation::new(name, version),
            capabilities: ClientCapabilities::default(),
            endpoint: RpcEndpointConfig::default(),
        }
    }
}

/// The client end of an ACP connection
pub struct ClientConnection {
    endpoint: Arc<RpcEndpoint>,
    config: ClientConfig,
    agent: StdMutex<Option<InitializeResponse>>,
}

impl std::fmt::Debug for ClientConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConnection")
            .field("client", &self.config.client_info.name)
            .field("initialized", &self.agent.lock().expect("agent mutex poisoned").is_some())
            .finish_non_exhaustive()
    }
}

impl ClientConnection {
    /// Bind a client to a transport.
    ///
    /// Reverse-RPC handlers are registered before the transport starts.
    /// Call [`initialize`](Self::initialize) next.
    pub async fn connect(
        transport: Arc<dyn Transport>,
        client: Arc<dyn Client>,
        config: ClientConfig,
    ) -> Result<Self> {
        let endpoint = RpcEndpoint::new(transport, config.endpoint.clone());
        Self::register(&endpoint, client);
        endpoint.start().await?;
        Ok(Self {
            endpoint,
            config,
            agent: StdMutex::new(None),
        })
    }

    fn register(endpoint: &Arc<RpcEndpoint>, client: Arc<dyn Client>) {
        let c = Arc::clone(&client);
        endpoint.on_notification(
            methods::SESSION_UPDATE,
            notification_handler(move |params| {
                let c = Arc::clone(&c);
                async move {
                    let notification = parse_params(params)?;
                    c.session_update(notification).await;
                    Ok(())
                }
            }),
        );

        let c = Arc::clone(&client);
        endpoint.on_request(
            methods::SESSION_REQUEST_PERMISSION,
            request_handler(move |params| {
                let c = Arc::clone(&c);
                async move {
                    let request = parse_params(params)?;
                    to_result_value(&c.request_permission(request).await?)
                }
            }),
        );

        let c = Arc::clone(&client);
        endpoint.on_request(
            methods::FS_READ_TEXT_FILE,
            request_handler(move |params| {
                let c = Arc::clone(&c);
                async move {
                    let request = parse_params(params)?;
                    to_result_value(&c.read_text_file(request).await?)
                }
            }),
        );

        let c = Arc::clone(&client);
        endpoint.on_request(
            methods::FS_WRITE_TEXT_FILE,
            request_handler(move |params| {
                let c = Arc::clone(&c);
                async move {
                    let request = parse_params(params)?;
                    to_result_value(&c.write_text_file(request).await?)
                }
            }),
        );

        let c = Arc::clone(&client);
        endpoint.on_request(
            methods::TERMINAL_CREATE,
            request_handler(move |params| {
                let c = Arc::clone(&c);
                async move {
                    let request = parse_params(params)?;
                    to_result_value(&c.create_terminal(request).await?)
                }
            }),
        );

        let c = Arc::clone(&client);
        endpoint.on_request(
            methods::TERMINAL_OUTPUT,
            request_handler(move |params| {
                let c = Arc::clone(&c);
                async move {
                    let request = parse_params(params)?;
                    to_result_value(&c.terminal_output(request).await?)
                }
            }),
        );

        let c = Arc::clone(&client);
        endpoint.on_request(
            methods::TERMINAL_WAIT_FOR_EXIT,
            request_handler(move |params| {
                let c = Arc::clone(&c);
                async move {
                    let request = parse_params(params)?;
                    to_result_value(&c.wait_for_exit(request).await?)
                }
            }),
        );

        let c = Arc::clone(&client);
        endpoint.on_request(
            methods::TERMINAL_KILL,
            request_handler(move |params| {
                let c = Arc::clone(&c);
                async move {
                    let request = parse_params(params)?;
                    to_result_value(&c.kill_terminal(request).await?)
                }
            }),
        );

        let c = Arc::clone(&client);
        endpoint.on_request(
            methods::TERMINAL_RELEASE,
            request_handler(move |params| {
                let c = Arc::clone(&c);
                async move {
                    let request = parse_params(params)?;
                    to_result_value(&c.release_terminal(request).await?)
                }
            }),
        );

        let c = Arc::clone(&client);
        endpoint.on_request(
            methods::SESSION_SET_MODE,
            request_handler(move |params| {
                let c = Arc::clone(&c);
                async move {
                    let request = parse_params(params)?;
                    to_result_value(&c.set_mode(request).await?)
                }
            }),
        );
    }

    /// Run the `initialize` handshake and remember the agent's answer
    pub async fn initialize(&self) -> Result<InitializeResponse> {
        let response: InitializeResponse = self
            .endpoint
            .request_typed(
                methods::INITIALIZE,
                &InitializeRequest {
                    protocol_version: PROTOCOL_VERSION,
                    client_info: self.config.client_info.clone(),
                    capabilities: self.config.capabilities.clone(),
                    meta: None,
                },
            )
            .await?;
        info!(
            agent = %response.agent_info.name,
            protocol = response.protocol_version,
            "initialized"
        );
        *self.agent.lock().expect("agent mutex poisoned") = Some(response.clone());
        Ok(response)
    }

    /// The agent's identity, once initialized
    pub fn agent_info(&self) -> Option<Implementation> {
        self.agent
            .lock()
            .expect("agent mutex poisoned")
            .as_ref()
            .map(|r| r.agent_info.clone())
    }

    /// The agent's capabilities, once initialized
    pub fn agent_capabilities(&self) -> Option<AgentCapabilities> {
        self.agent
            .lock()
            .expect("agent mutex poisoned")
            .as_ref()
            .map(|r| r.capabilities.clone())
    }

    /// Authenticate with one of the agent's advertised methods
    pub async fn authenticate(&self, method_id: impl Into<String>) -> Result<()> {
        let _: AuthenticateResponse = self
            .endpoint
            .request_typed(
                methods::AUTHENTICATE,
                &AuthenticateRequest {
                    method_id: method_id.into(),
                    meta: None,
                },
            )
            .await?;
        Ok(())
    }

    /// Create a session rooted at the given working directory
    pub async fn new_session(&self, working_directory: impl Into<PathBuf>) -> Result<NewSessionResponse> {
        self.new_session_with(NewSessionRequest {
            working_directory: working_directory.into(),
            mcp_servers: Vec::new(),
            system_prompt: None,
            mode: None,
            config_options: Default::default(),
            meta: None,
        })
        .await
    }

    /// Create a session with full options
    pub async fn new_session_with(&self, request: NewSessionRequest) -> Result<NewSessionResponse> {
        self.endpoint
            .request_typed(methods::SESSION_NEW, &request)
            .await
    }

    /// Load an existing session; requires the agent's `loadSession`
    /// capability
    pub async fn load_session(&self, session_id: SessionId) -> Result<LoadSessionResponse> {
        if let Some(capabilities) = self.agent_capabilities()
            && !capabilities.load_session
        {
            return Err(AcpError::capability_not_supported("loadSession"));
        }
        self.endpoint
            .request_typed(
                methods::SESSION_LOAD,
                &LoadSessionRequest {
                    session_id,
                    meta: None,
                },
            )
            .await
    }

    /// Run one prompt turn
    pub async fn prompt(
        &self,
        session_id: SessionId,
        content: Vec<ContentBlock>,
    ) -> Result<PromptResponse> {
        self.endpoint
            .request_typed(
                methods::SESSION_PROMPT,
                &PromptRequest {
                    session_id,
                    content,
                    meta: None,
                },
            )
            .await
    }

    /// Switch a session's mode
    pub async fn set_mode(&self, session_id: SessionId, mode: impl Into<String>) -> Result<()> {
        let _: EmptyResult = self
            .endpoint
            .request_typed(
                methods::SESSION_SET_MODE,
                &SetModeRequest {
                    session_id,
                    mode: mode.into(),
                    reason: None,
                    meta: None,
                },
            )
            .await?;
        Ok(())
    }

    /// Set a session configuration option
    pub async fn set_config_option(&self, request: SetConfigOptionRequest) -> Result<()> {
        let _: EmptyResult = self
            .endpoint
            .request_typed(methods::SESSION_SET_CONFIG_OPTION, &request)
            .await?;
        Ok(())
    }

    /// Cancel a session. A notification: there is no response, and the
    /// agent's in-flight prompt resolves with `stopReason = cancelled`.
    pub async fn cancel(&self, session_id: SessionId, reason: Option<String>) -> Result<()> {
        debug!(session = %session_id, "sending cancel");
        self.endpoint
            .notify_typed(
                methods::SESSION_CANCEL,
                &CancelNotification {
                    session_id,
                    reason,
                    meta: None,
                },
            )
            .await
    }

    /// The underlying engine, for vendor extension methods
    pub fn endpoint(&self) -> &Arc<RpcEndpoint> {
        &self.endpoint
    }

    /// Wait until the connection closes
    pub async fn serve(&self) {
        self.endpoint.wait_closed().await;
    }

    /// Close the connection
    pub async fn close(&self) {
        self.endpoint.close().await;
    }
}
