//! The bidirectional JSON-RPC endpoint.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{Notify, mpsc, oneshot};
use tracing::{debug, error, trace, warn};

use acpkit_protocol::{
    AcpError, Envelope, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestId, Result,
    decode_envelope, serialize_envelope,
};
use acpkit_transport::Transport;

/// Future returned by a request handler
pub type HandlerFuture = BoxFuture<'static, Result<Value>>;

/// Handler for inbound requests: params in, result value (or error) out
pub type RequestHandler = Arc<dyn Fn(Option<Value>) -> HandlerFuture + Send + Sync>;

/// Future returned by a notification handler
pub type NotificationFuture = BoxFuture<'static, Result<()>>;

/// Handler for inbound notifications; errors are logged, never surfaced
pub type NotificationHandler = Arc<dyn Fn(Option<Value>) -> NotificationFuture + Send + Sync>;

/// Wrap an async closure as a [`RequestHandler`]
pub fn request_handler<F, Fut>(f: F) -> RequestHandler
where
    F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Arc::new(move |params| Box::pin(f(params)))
}

/// Wrap an async closure as a [`NotificationHandler`]
pub fn notification_handler<F, Fut>(f: F) -> NotificationHandler
where
    F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |params| Box::pin(f(params)))
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct RpcEndpointConfig {
    /// How long an outbound request waits for its response
    pub request_timeout: Duration,
    /// Capacity of the outbound write queue
    pub outbound_capacity: usize,
}

impl Default for RpcEndpointConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            outbound_capacity: 256,
        }
    }
}

/// One-shot completion for an in-flight outbound request
type ResponseWaiter = oneshot::Sender<Result<Value>>;

/// Process-global outbound request id counter.
///
/// Ids are pairwise distinct and strictly increasing across every endpoint
/// in the process; only the outbound direction shares it.
static NEXT_OUTBOUND_ID: AtomicI64 = AtomicI64::new(0);

fn next_outbound_id() -> RequestId {
    RequestId::Number(NEXT_OUTBOUND_ID.fetch_add(1, Ordering::SeqCst) + 1)
}

/// A notification waiting its turn on the ordered worker
struct QueuedNotification {
    method: String,
    params: Option<Value>,
    handler: NotificationHandler,
}

/// A bidirectional JSON-RPC endpoint over a transport.
///
/// Construct with [`RpcEndpoint::new`], register handlers, then call
/// [`start`](Self::start). The endpoint owns three background tasks: the
/// routing task (single consumer of `Transport::receive`), the writer task
/// (single producer of `Transport::send`, which keeps outbound frames in
/// emission order), and the notification worker (one consumer, so
/// notification handlers observe delivery order).
pub struct RpcEndpoint {
    transport: Arc<dyn Transport>,
    config: RpcEndpointConfig,
    request_handlers: DashMap<String, RequestHandler>,
    notification_handlers: DashMap<String, NotificationHandler>,
    pending: StdMutex<HashMap<RequestId, ResponseWaiter>>,
    outbound: StdMutex<Option<mpsc::Sender<String>>>,
    notifications: StdMutex<Option<mpsc::Sender<QueuedNotification>>>,
    closed: AtomicBool,
    close_notify: Notify,
    close_hooks: StdMutex<Vec<Box<dyn Fn() + Send + Sync>>>,
    tasks: StdMutex<Vec<tokio::task::JoinHandle<()>>>,
}

impl std::fmt::Debug for RpcEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcEndpoint")
            .field("transport", &self.transport.endpoint())
            .field("config", &self.config)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl RpcEndpoint {
    /// Create an endpoint over the given transport
    pub fn new(transport: Arc<dyn Transport>, config: RpcEndpointConfig) -> Arc<Self> {
        Arc::new(Self {
            transport,
            config,
            request_handlers: DashMap::new(),
            notification_handlers: DashMap::new(),
            pending: StdMutex::new(HashMap::new()),
            outbound: StdMutex::new(None),
            notifications: StdMutex::new(None),
            closed: AtomicBool::new(false),
            close_notify: Notify::new(),
            close_hooks: StdMutex::new(Vec::new()),
            tasks: StdMutex::new(Vec::new()),
        })
    }

    /// Register (or overwrite) a request handler for a method
    pub fn on_request(&self, method: impl Into<String>, handler: RequestHandler) {
        self.request_handlers.insert(method.into(), handler);
    }

    /// Remove a request handler
    pub fn remove_request_handler(&self, method: &str) {
        self.request_handlers.remove(method);
    }

    /// Register (or overwrite) a notification handler for a method
    pub fn on_notification(&self, method: impl Into<String>, handler: NotificationHandler) {
        self.notification_handlers.insert(method.into(), handler);
    }

    /// Remove a notification handler
    pub fn remove_notification_handler(&self, method: &str) {
        self.notification_handlers.remove(method);
    }

    /// Run a hook when the connection closes.
    ///
    /// Fires immediately when the endpoint has already closed.
    pub fn on_close(&self, hook: impl Fn() + Send + Sync + 'static) {
        if self.closed.load(Ordering::SeqCst) {
            hook();
            return;
        }
        self.close_hooks
            .lock()
            .expect("close hooks mutex poisoned")
            .push(Box::new(hook));
    }

    /// Start the transport and the routing and writer tasks
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        self.transport
            .start()
            .await
            .map_err(|e| AcpError::internal(format!("transport start failed: {e}")))?;

        let (tx, mut rx) = mpsc::channel::<String>(self.config.outbound_capacity);
        *self.outbound.lock().expect("outbound mutex poisoned") = Some(tx);

        // Writer task: the single producer of transport writes.
        let writer = {
            let endpoint = Arc::clone(self);
            tokio::spawn(async move {
                while let Some(frame) = rx.recv().await {
                    if let Err(e) = endpoint.transport.send(frame).await {
                        warn!("transport write failed: {e}");
                        endpoint.handle_close();
                        break;
                    }
                }
                debug!("writer task finished");
            })
        };

        // Notification worker: one consumer, so handlers observe
        // notifications in delivery order.
        let (notif_tx, mut notif_rx) =
            mpsc::channel::<QueuedNotification>(self.config.outbound_capacity);
        *self
            .notifications
            .lock()
            .expect("notifications mutex poisoned") = Some(notif_tx);
        let notifier = tokio::spawn(async move {
            while let Some(queued) = notif_rx.recv().await {
                if let Err(e) = (queued.handler)(queued.params).await {
                    error!(method = queued.method, "notification handler failed: {e}");
                }
            }
            debug!("notification worker finished");
        });

        // Routing task: the single consumer of transport reads.
        let router = {
            let endpoint = Arc::clone(self);
            tokio::spawn(async move {
                loop {
                    match endpoint.transport.receive().await {
                        Ok(Some(frame)) => endpoint.dispatch_frame(frame),
                        Ok(None) => {
                            debug!("transport closed, routing task exiting");
                            break;
                        }
                        Err(e) => {
                            warn!("transport receive failed: {e}");
                            break;
                        }
                    }
                }
                endpoint.handle_close();
            })
        };

        let mut tasks = self.tasks.lock().expect("tasks mutex poisoned");
        tasks.push(writer);
        tasks.push(notifier);
        tasks.push(router);
        Ok(())
    }

    /// Whether the connection has closed
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Wait until the connection closes
    pub async fn wait_closed(&self) {
        let notified = self.close_notify.notified();
        if self.is_closed() {
            return;
        }
        notified.await;
    }

    /// Close the connection: tear down the transport, reject every pending
    /// waiter, and fire close hooks. Idempotent.
    pub async fn close(&self) {
        if let Err(e) = self.transport.close().await {
            debug!("transport close reported: {e}");
        }
        self.handle_close();
    }

    /// Send a request and await its correlated response.
    ///
    /// Ids come from a strictly increasing counter. The call completes when
    /// the response arrives, the configured timeout expires, or the
    /// transport closes.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        if self.is_closed() {
            return Err(AcpError::internal("connection closed"));
        }

        let id = next_outbound_id();
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .expect("pending mutex poisoned")
            .insert(id.clone(), tx);

        let request = JsonRpcRequest::new(id.clone(), method, params);
        if let Err(e) = self.enqueue(Envelope::Request(request)).await {
            self.pending
                .lock()
                .expect("pending mutex poisoned")
                .remove(&id);
            return Err(e);
        }
        trace!(%id, method, "outbound request sent");

        match tokio::time::timeout(self.config.request_timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            // Waiter dropped without an answer: the connection closed.
            Ok(Err(_)) => Err(AcpError::internal("connection closed")),
            Err(_) => {
                // Late responses to this id will be discarded as unknown.
                self.pending
                    .lock()
                    .expect("pending mutex poisoned")
                    .remove(&id);
                Err(AcpError::timeout(format!(
                    "request '{method}' timed out after {:?}",
                    self.config.request_timeout
                )))
            }
        }
    }

    /// Send a typed request and decode its typed response
    pub async fn request_typed<P, R>(&self, method: &str, params: &P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let params = serde_json::to_value(params)
            .map_err(|e| AcpError::internal(format!("params serialization failed: {e}")))?;
        let result = self.request(method, Some(params)).await?;
        serde_json::from_value(result).map_err(|e| {
            AcpError::internal(format!("response to '{method}' failed to decode: {e}"))
        })
    }

    /// Send a notification (fire-and-forget)
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        if self.is_closed() {
            return Err(AcpError::internal("connection closed"));
        }
        self.enqueue(Envelope::Notification(JsonRpcNotification::new(method, params)))
            .await
    }

    /// Send a typed notification
    pub async fn notify_typed<P: Serialize>(&self, method: &str, params: &P) -> Result<()> {
        let params = serde_json::to_value(params)
            .map_err(|e| AcpError::internal(format!("params serialization failed: {e}")))?;
        self.notify(method, Some(params)).await
    }

    async fn enqueue(&self, envelope: Envelope) -> Result<()> {
        let frame = serialize_envelope(&envelope)?;
        let sender = self
            .outbound
            .lock()
            .expect("outbound mutex poisoned")
            .clone();
        let sender = sender.ok_or_else(|| AcpError::internal("connection not started"))?;
        sender
            .send(frame)
            .await
            .map_err(|_| AcpError::internal("connection closed"))
    }

    /// Queue a response envelope from a task that cannot await enqueue
    /// failure meaningfully; errors are logged.
    async fn respond(&self, id: RequestId, outcome: Result<Value>) {
        let response = match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error.to_wire()),
        };
        if let Err(e) = self.enqueue(Envelope::Response(response)).await {
            debug!("failed to queue response: {e}");
        }
    }

    /// Classify one inbound frame and dispatch it.
    ///
    /// Requests and notifications run in their own tasks so that a
    /// long-lived handler (a prompt turn) cannot block a concurrent
    /// `session/cancel` from being observed.
    fn dispatch_frame(self: &Arc<Self>, frame: String) {
        let value: Value = match serde_json::from_str(&frame) {
            Ok(value) => value,
            Err(e) => {
                trace!("inbound frame failed to parse: {e}");
                let endpoint = Arc::clone(self);
                let error = AcpError::parse_error(format!("malformed JSON: {e}"));
                tokio::spawn(async move {
                    let response = JsonRpcResponse::parse_error(error.to_wire());
                    if let Err(e) = endpoint.enqueue(Envelope::Response(response)).await {
                        debug!("failed to queue parse-error response: {e}");
                    }
                });
                return;
            }
        };

        // Keep whatever id the sender supplied so schema failures can still
        // be answered with a correlated error.
        let fallback_id = value
            .get("id")
            .cloned()
            .and_then(|id| serde_json::from_value::<RequestId>(id).ok());

        let envelope = match decode_envelope(value) {
            Ok(envelope) => envelope,
            Err(error) => {
                trace!("inbound frame failed envelope schema: {error}");
                let endpoint = Arc::clone(self);
                tokio::spawn(async move {
                    let response = match fallback_id {
                        Some(id) => JsonRpcResponse::error(id, error.to_wire()),
                        None => JsonRpcResponse::parse_error(error.to_wire()),
                    };
                    if let Err(e) = endpoint.enqueue(Envelope::Response(response)).await {
                        debug!("failed to queue invalid-request response: {e}");
                    }
                });
                return;
            }
        };

        match envelope {
            Envelope::Request(request) => self.dispatch_request(request),
            Envelope::Notification(notification) => self.dispatch_notification(notification),
            Envelope::Response(response) => self.dispatch_response(response),
        }
    }

    fn dispatch_request(self: &Arc<Self>, request: JsonRpcRequest) {
        let JsonRpcRequest {
            id, method, params, ..
        } = request;
        debug!(%id, method, "inbound request");

        let handler = self.request_handlers.get(&method).map(|h| h.value().clone());
        let endpoint = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = match handler {
                Some(handler) => handler(params).await,
                None => Err(AcpError::method_not_found(method.as_str())),
            };
            if let Err(error) = &outcome {
                debug!(method, %error, "request handler failed");
            }
            endpoint.respond(id, outcome).await;
        });
    }

    fn dispatch_notification(self: &Arc<Self>, notification: JsonRpcNotification) {
        let JsonRpcNotification { method, params, .. } = notification;
        let Some(handler) = self
            .notification_handlers
            .get(&method)
            .map(|h| h.value().clone())
        else {
            debug!(method, "no handler for notification, ignoring");
            return;
        };
        debug!(method, "inbound notification");
        let queue = self
            .notifications
            .lock()
            .expect("notifications mutex poisoned")
            .clone();
        let Some(queue) = queue else {
            debug!(method, "endpoint closing, dropping notification");
            return;
        };
        let queued = QueuedNotification {
            method,
            params,
            handler,
        };
        if let Err(e) = queue.try_send(queued) {
            warn!("notification queue full or closed, dropping: {e}");
        }
    }

    fn dispatch_response(&self, response: JsonRpcResponse) {
        let Some(id) = response.id.as_request_id().cloned() else {
            warn!("received response with null id, ignoring");
            return;
        };
        let waiter = self
            .pending
            .lock()
            .expect("pending mutex poisoned")
            .remove(&id);
        match waiter {
            Some(tx) => {
                trace!(%id, "correlating response");
                let outcome = response.into_result().map_err(AcpError::from);
                // The requester may have timed out and dropped its receiver.
                let _ = tx.send(outcome);
            }
            None => {
                warn!(%id, "response for unknown or expired request id, discarding");
            }
        }
    }

    /// Reject all waiters, fire close hooks, and mark the endpoint closed.
    fn handle_close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("endpoint closing");

        *self.outbound.lock().expect("outbound mutex poisoned") = None;
        *self
            .notifications
            .lock()
            .expect("notifications mutex poisoned") = None;

        let waiters: Vec<ResponseWaiter> = {
            let mut pending = self.pending.lock().expect("pending mutex poisoned");
            pending.drain().map(|(_, tx)| tx).collect()
        };
        for tx in waiters {
            let _ = tx.send(Err(AcpError::internal("connection closed")));
        }

        let hooks = std::mem::take(
            &mut *self.close_hooks.lock().expect("close hooks mutex poisoned"),
        );
        for hook in hooks {
            hook();
        }

        self.close_notify.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_params;
    use acpkit_protocol::AcpErrorKind;
    use acpkit_transport::StdioTransport;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn connected_pair_with(
        config: RpcEndpointConfig,
    ) -> (Arc<RpcEndpoint>, Arc<RpcEndpoint>) {
        let (left_rx, right_tx) = tokio::io::duplex(64 * 1024);
        let (right_rx, left_tx) = tokio::io::duplex(64 * 1024);
        let left = RpcEndpoint::new(
            Arc::new(StdioTransport::from_raw(left_rx, left_tx)),
            config.clone(),
        );
        let right = RpcEndpoint::new(
            Arc::new(StdioTransport::from_raw(right_rx, right_tx)),
            config,
        );
        left.start().await.unwrap();
        right.start().await.unwrap();
        (left, right)
    }

    async fn connected_pair() -> (Arc<RpcEndpoint>, Arc<RpcEndpoint>) {
        connected_pair_with(RpcEndpointConfig::default()).await
    }

    #[tokio::test]
    async fn request_reaches_handler_and_returns() {
        let (client, server) = connected_pair().await;
        server.on_request(
            "math/add",
            request_handler(|params| async move {
                let (a, b): (i64, i64) = parse_params(params)?;
                Ok(json!(a + b))
            }),
        );

        let result = client.request("math/add", Some(json!([2, 3]))).await.unwrap();
        assert_eq!(result, json!(5));
    }

    #[tokio::test]
    async fn unknown_method_yields_method_not_found() {
        let (client, _server) = connected_pair().await;
        let error = client.request("no/such", None).await.unwrap_err();
        assert_eq!(error.kind, AcpErrorKind::MethodNotFound);
        assert_eq!(error.message, "Method not found: no/such");
        assert_eq!(error.data, Some(json!({"method": "no/such"})));
    }

    #[tokio::test]
    async fn handler_errors_travel_as_structured_errors() {
        let (client, server) = connected_pair().await;
        server.on_request(
            "always/fails",
            request_handler(|_| async move {
                Err::<Value, _>(AcpError::permission_denied("nope"))
            }),
        );

        let error = client.request("always/fails", None).await.unwrap_err();
        assert_eq!(error.kind, AcpErrorKind::PermissionDenied);
        assert_eq!(error.message, "nope");
    }

    #[tokio::test]
    async fn outbound_ids_are_distinct_and_strictly_increasing() {
        // Observe the actual frames: a raw peer echoes success responses
        // and records every request id it sees.
        let (raw_rx, client_tx) = tokio::io::duplex(16 * 1024);
        let (client_rx, raw_tx) = tokio::io::duplex(16 * 1024);
        let raw = Arc::new(StdioTransport::from_raw(raw_rx, raw_tx));
        raw.start().await.unwrap();

        let client = RpcEndpoint::new(
            Arc::new(StdioTransport::from_raw(client_rx, client_tx)),
            RpcEndpointConfig::default(),
        );
        client.start().await.unwrap();

        let seen = Arc::new(StdMutex::new(Vec::<i64>::new()));
        {
            let raw = Arc::clone(&raw);
            let seen = Arc::clone(&seen);
            tokio::spawn(async move {
                while let Ok(Some(frame)) = raw.receive().await {
                    let value: Value = serde_json::from_str(&frame).unwrap();
                    let id = value["id"].as_i64().unwrap();
                    seen.lock().unwrap().push(id);
                    let response =
                        json!({"jsonrpc": "2.0", "id": id, "result": null}).to_string();
                    if raw.send(response).await.is_err() {
                        break;
                    }
                }
            });
        }

        for _ in 0..5 {
            client.request("echo/id", None).await.unwrap();
        }

        // The counter is process-global, so the starting value depends on
        // other tests; only distinctness and order are guaranteed.
        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 5);
        for window in seen.windows(2) {
            assert!(window[0] < window[1], "ids must strictly increase: {seen:?}");
        }
    }

    #[tokio::test]
    async fn notifications_without_handlers_are_ignored() {
        let (client, server) = connected_pair().await;
        server.on_request("probe", request_handler(|_| async move { Ok(json!("ok")) }));

        client.notify("unknown/notification", Some(json!({}))).await.unwrap();
        // The connection still works afterwards.
        let result = client.request("probe", None).await.unwrap();
        assert_eq!(result, json!("ok"));
    }

    #[tokio::test]
    async fn notification_handler_receives_params() {
        let (client, server) = connected_pair().await;
        let (tx, rx) = oneshot::channel::<Value>();
        let tx = StdMutex::new(Some(tx));
        server.on_notification(
            "observe",
            notification_handler(move |params| {
                let tx = tx.lock().expect("tx mutex poisoned").take();
                async move {
                    if let Some(tx) = tx {
                        let _ = tx.send(params.unwrap_or(Value::Null));
                    }
                    Ok(())
                }
            }),
        );

        client.notify("observe", Some(json!({"x": 1}))).await.unwrap();
        assert_eq!(rx.await.unwrap(), json!({"x": 1}));
    }

    #[tokio::test]
    async fn slow_handler_does_not_block_other_dispatch() {
        let (client, server) = connected_pair().await;
        server.on_request(
            "slow",
            request_handler(|_| async move {
                tokio::time::sleep(Duration::from_millis(250)).await;
                Ok(json!("slow done"))
            }),
        );
        server.on_request("fast", request_handler(|_| async move { Ok(json!("fast done")) }));

        let slow = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.request("slow", None).await })
        };
        // The fast request completes while the slow one is still running.
        let fast = client.request("fast", None).await.unwrap();
        assert_eq!(fast, json!("fast done"));
        assert_eq!(slow.await.unwrap().unwrap(), json!("slow done"));
    }

    #[tokio::test]
    async fn request_timeout_rejects_waiter() {
        let (client, server) = connected_pair_with(RpcEndpointConfig {
            request_timeout: Duration::from_millis(50),
            ..Default::default()
        })
        .await;

        server.on_request(
            "never/answers-in-time",
            request_handler(|_| async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(json!(null))
            }),
        );

        let error = client
            .request("never/answers-in-time", None)
            .await
            .unwrap_err();
        assert_eq!(error.kind, AcpErrorKind::Timeout);
    }

    #[tokio::test]
    async fn close_rejects_pending_waiters() {
        let (client, server) = connected_pair().await;
        server.on_request(
            "hangs",
            request_handler(|_| async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(json!(null))
            }),
        );

        let in_flight = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.request("hangs", None).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.close().await;

        let error = in_flight.await.unwrap().unwrap_err();
        assert_eq!(error.kind, AcpErrorKind::Internal);
        assert!(client.is_closed());

        // Further sends fail fast.
        let error = client.request("hangs", None).await.unwrap_err();
        assert_eq!(error.kind, AcpErrorKind::Internal);
    }

    #[tokio::test]
    async fn close_hooks_fire_once() {
        let (client, _server) = connected_pair().await;
        let count = Arc::new(AtomicI64::new(0));
        {
            let count = Arc::clone(&count);
            client.on_close(move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        client.close().await;
        client.close().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // Hooks registered after close run immediately.
        let late = Arc::new(AtomicI64::new(0));
        {
            let late = Arc::clone(&late);
            client.on_close(move || {
                late.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(late.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_frame_gets_parse_error_response() {
        // Drive the server endpoint directly over a raw transport pair.
        let (raw_rx, server_tx) = tokio::io::duplex(4096);
        let (server_rx, raw_tx) = tokio::io::duplex(4096);
        let raw = StdioTransport::from_raw(raw_rx, raw_tx);
        raw.start().await.unwrap();

        let server = RpcEndpoint::new(
            Arc::new(StdioTransport::from_raw(server_rx, server_tx)),
            RpcEndpointConfig::default(),
        );
        server.start().await.unwrap();

        raw.send("{definitely not json".to_string()).await.unwrap();
        let frame = raw.receive().await.unwrap().unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["id"], Value::Null);
        assert_eq!(value["error"]["code"], json!(-32700));
    }

    #[tokio::test]
    async fn unclassifiable_envelope_gets_invalid_request() {
        let (raw_rx, server_tx) = tokio::io::duplex(4096);
        let (server_rx, raw_tx) = tokio::io::duplex(4096);
        let raw = StdioTransport::from_raw(raw_rx, raw_tx);
        raw.start().await.unwrap();

        let server = RpcEndpoint::new(
            Arc::new(StdioTransport::from_raw(server_rx, server_tx)),
            RpcEndpointConfig::default(),
        );
        server.start().await.unwrap();

        // Valid JSON, but no method and no result/error.
        raw.send(r#"{"jsonrpc":"2.0","id":9}"#.to_string()).await.unwrap();
        let frame = raw.receive().await.unwrap().unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["id"], json!(9));
        assert_eq!(value["error"]["code"], json!(-32600));
    }
}
