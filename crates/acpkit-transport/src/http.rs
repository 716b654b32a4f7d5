//! Single-envelope HTTP POST carrier.
//!
//! In agent mode an axum endpoint accepts one envelope per POST to a
//! configurable path: requests are answered with the correlated response
//! envelope on 200, notifications with 204, unparseable bodies with 400,
//! and every other path or method with 404.
//!
//! The HTTP carrier moves request/response exchanges only. An agent that
//! needs to stream `session/update` notifications to its client requires a
//! bidirectional transport such as stdio; updates sent here are dropped
//! with a warning.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tokio::sync::{Mutex as TokioMutex, mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::{Transport, TransportError, TransportResult, TransportState};

/// Maximum accepted request body, in bytes
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Agent-mode HTTP endpoint configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    /// Address to bind; use port 0 to pick an ephemeral port
    pub bind_addr: SocketAddr,
    /// Path envelopes are POSTed to
    pub path: String,
    /// How long a POSTed request waits for the engine's response
    pub exchange_timeout: Duration,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([127, 0, 0, 1], 0).into(),
            path: "/acp".to_string(),
            exchange_timeout: Duration::from_secs(30),
        }
    }
}

/// Exchanges awaiting their response envelope, keyed by serialized id
type PendingExchanges = Arc<StdMutex<HashMap<String, oneshot::Sender<String>>>>;

#[derive(Clone)]
struct ServerShared {
    path: String,
    exchange_timeout: Duration,
    inbound: mpsc::Sender<String>,
    pending: PendingExchanges,
}

/// Key a JSON-RPC id value for the pending-exchange table
fn id_key(id: &Value) -> String {
    id.to_string()
}

/// Agent-mode HTTP transport: one envelope per POST
pub struct HttpServerTransport {
    config: HttpServerConfig,
    state: StdMutex<TransportState>,
    local_addr: StdMutex<Option<SocketAddr>>,
    pending: PendingExchanges,
    inbound_rx: TokioMutex<Option<mpsc::Receiver<String>>>,
    inbound_tx: StdMutex<Option<mpsc::Sender<String>>>,
    server_task: StdMutex<Option<tokio::task::JoinHandle<()>>>,
}

impl std::fmt::Debug for HttpServerTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpServerTransport")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl HttpServerTransport {
    /// Create a transport with the given configuration
    #[must_use]
    pub fn new(config: HttpServerConfig) -> Self {
        Self {
            config,
            state: StdMutex::new(TransportState::Idle),
            local_addr: StdMutex::new(None),
            pending: Arc::new(StdMutex::new(HashMap::new())),
            inbound_rx: TokioMutex::new(None),
            inbound_tx: StdMutex::new(None),
            server_task: StdMutex::new(None),
        }
    }

    /// The address the listener actually bound, once started
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().expect("addr mutex poisoned")
    }

    fn state(&self) -> TransportState {
        *self.state.lock().expect("state mutex poisoned")
    }

    fn set_state(&self, next: TransportState) {
        *self.state.lock().expect("state mutex poisoned") = next;
    }
}

async fn handle_post(State(shared): State<ServerShared>, request: Request) -> Response {
    if request.method() != Method::POST || request.uri().path() != shared.path {
        return StatusCode::NOT_FOUND.into_response();
    }

    let body = match to_bytes(request.into_body(), MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("failed to read request body: {e}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            debug!("unparseable envelope: {e}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let frame = value.to_string();
    let request_id = value
        .get("method")
        .and_then(|_| value.get("id"))
        .filter(|id| !id.is_null())
        .cloned();

    match request_id {
        Some(id) => {
            // A request: park the exchange until the engine responds.
            let (tx, rx) = oneshot::channel();
            shared
                .pending
                .lock()
                .expect("pending mutex poisoned")
                .insert(id_key(&id), tx);

            if shared.inbound.send(frame).await.is_err() {
                return StatusCode::NOT_FOUND.into_response();
            }

            match tokio::time::timeout(shared.exchange_timeout, rx).await {
                Ok(Ok(response_frame)) => (
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, "application/json")],
                    response_frame,
                )
                    .into_response(),
                Ok(Err(_)) | Err(_) => {
                    warn!(id = %id, "HTTP exchange expired without a response");
                    shared
                        .pending
                        .lock()
                        .expect("pending mutex poisoned")
                        .remove(&id_key(&id));
                    StatusCode::NO_CONTENT.into_response()
                }
            }
        }
        None => {
            // Notification (or a stray response): hand it to the engine
            // and acknowledge immediately.
            if shared.inbound.send(frame).await.is_err() {
                return StatusCode::NOT_FOUND.into_response();
            }
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

#[async_trait::async_trait]
impl Transport for HttpServerTransport {
    fn endpoint(&self) -> String {
        match self.local_addr() {
            Some(addr) => format!("http://{addr}{}", self.config.path),
            None => format!("http://{}{}", self.config.bind_addr, self.config.path),
        }
    }

    async fn start(&self) -> TransportResult<()> {
        if self.state() == TransportState::Started {
            return Ok(());
        }
        if self.state() == TransportState::Closed {
            return Err(TransportError::Closed("transport already closed".to_string()));
        }

        let (tx, rx) = mpsc::channel(256);
        *self.inbound_rx.lock().await = Some(rx);
        *self.inbound_tx.lock().expect("tx mutex poisoned") = Some(tx.clone());

        let shared = ServerShared {
            path: self.config.path.clone(),
            exchange_timeout: self.config.exchange_timeout,
            inbound: tx,
            pending: Arc::clone(&self.pending),
        };
        let router: Router = Router::new().fallback(handle_post).with_state(shared);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr)
            .await
            .map_err(|e| TransportError::Configuration(format!("bind failed: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| TransportError::Configuration(e.to_string()))?;
        *self.local_addr.lock().expect("addr mutex poisoned") = Some(addr);

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                warn!("HTTP server terminated: {e}");
            }
        });
        *self.server_task.lock().expect("task mutex poisoned") = Some(task);

        self.set_state(TransportState::Started);
        debug!(%addr, "HTTP server transport started");
        Ok(())
    }

    async fn close(&self) -> TransportResult<()> {
        if self.state() == TransportState::Closed {
            return Ok(());
        }
        self.set_state(TransportState::Closed);

        if let Some(task) = self.server_task.lock().expect("task mutex poisoned").take() {
            task.abort();
        }
        self.pending.lock().expect("pending mutex poisoned").clear();
        *self.inbound_tx.lock().expect("tx mutex poisoned") = None;
        *self.inbound_rx.lock().await = None;
        debug!("HTTP server transport closed");
        Ok(())
    }

    async fn send(&self, frame: String) -> TransportResult<()> {
        if self.state() != TransportState::Started {
            return Err(TransportError::Closed("HTTP server transport".to_string()));
        }

        // Only response envelopes have somewhere to go: back out on the
        // HTTP exchange that carried the matching request.
        let value: Value = serde_json::from_str(&frame)
            .map_err(|e| TransportError::SendFailed(format!("unserializable frame: {e}")))?;
        let is_response = value.get("method").is_none();
        let id = value.get("id").filter(|id| !id.is_null());

        match (is_response, id) {
            (true, Some(id)) => {
                let waiter = self
                    .pending
                    .lock()
                    .expect("pending mutex poisoned")
                    .remove(&id_key(id));
                match waiter {
                    Some(tx) => {
                        trace!(id = %id, "routing response to HTTP exchange");
                        let _ = tx.send(frame);
                        Ok(())
                    }
                    None => {
                        warn!(id = %id, "no HTTP exchange waiting for response; dropping");
                        Ok(())
                    }
                }
            }
            _ => {
                warn!("HTTP agent transport cannot push non-response frames; dropping");
                Ok(())
            }
        }
    }

    async fn receive(&self) -> TransportResult<Option<String>> {
        if self.state() == TransportState::Idle {
            return Err(TransportError::NotStarted("HTTP server transport".to_string()));
        }
        let mut inbound = self.inbound_rx.lock().await;
        match inbound.as_mut() {
            Some(rx) => Ok(rx.recv().await),
            None => Ok(None),
        }
    }
}

/// Client-mode HTTP transport: POSTs each outbound frame, queues 200 bodies
/// as inbound frames
pub struct HttpClientTransport {
    url: String,
    client: reqwest::Client,
    state: StdMutex<TransportState>,
    inbound_rx: TokioMutex<Option<mpsc::Receiver<String>>>,
    inbound_tx: StdMutex<Option<mpsc::Sender<String>>>,
}

impl std::fmt::Debug for HttpClientTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClientTransport")
            .field("url", &self.url)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl HttpClientTransport {
    /// Create a transport POSTing to the given URL
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
            state: StdMutex::new(TransportState::Idle),
            inbound_rx: TokioMutex::new(None),
            inbound_tx: StdMutex::new(None),
        }
    }

    fn state(&self) -> TransportState {
        *self.state.lock().expect("state mutex poisoned")
    }
}

#[async_trait::async_trait]
impl Transport for HttpClientTransport {
    fn endpoint(&self) -> String {
        self.url.clone()
    }

    async fn start(&self) -> TransportResult<()> {
        if self.state() == TransportState::Started {
            return Ok(());
        }
        let (tx, rx) = mpsc::channel(256);
        *self.inbound_rx.lock().await = Some(rx);
        *self.inbound_tx.lock().expect("tx mutex poisoned") = Some(tx);
        *self.state.lock().expect("state mutex poisoned") = TransportState::Started;
        Ok(())
    }

    async fn close(&self) -> TransportResult<()> {
        *self.state.lock().expect("state mutex poisoned") = TransportState::Closed;
        *self.inbound_tx.lock().expect("tx mutex poisoned") = None;
        *self.inbound_rx.lock().await = None;
        Ok(())
    }

    async fn send(&self, frame: String) -> TransportResult<()> {
        if self.state() != TransportState::Started {
            return Err(TransportError::NotStarted("HTTP client transport".to_string()));
        }

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(frame)
            .send()
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;

        match response.status().as_u16() {
            200 => {
                let body = response
                    .text()
                    .await
                    .map_err(|e| TransportError::ReceiveFailed(e.to_string()))?;
                let tx = self
                    .inbound_tx
                    .lock()
                    .expect("tx mutex poisoned")
                    .clone();
                if let Some(tx) = tx {
                    let _ = tx.send(body).await;
                }
                Ok(())
            }
            204 => Ok(()),
            status => Err(TransportError::SendFailed(format!(
                "agent answered HTTP {status}"
            ))),
        }
    }

    async fn receive(&self) -> TransportResult<Option<String>> {
        if self.state() == TransportState::Idle {
            return Err(TransportError::NotStarted("HTTP client transport".to_string()));
        }
        let mut inbound = self.inbound_rx.lock().await;
        match inbound.as_mut() {
            Some(rx) => Ok(rx.recv().await),
            None => Ok(None),
        }
    }
}
