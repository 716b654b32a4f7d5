//! JSON-RPC 2.0 envelope types.
//!
//! ACP is carried over plain JSON-RPC 2.0: requests, responses, and
//! notifications. Classification of an inbound message is by field
//! presence, not by any tag:
//!
//! - request: `id` present and non-null, `method` present
//! - response: `id` present (possibly null), exactly one of `result`/`error`
//!   present, `method` absent
//! - notification: `method` present, `id` absent
//!
//! Anything else fails classification and is a protocol error.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// JSON-RPC version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC version marker type
///
/// Serializes as the literal string `"2.0"` and rejects anything else on
/// deserialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonRpcVersion;

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(JSONRPC_VERSION)
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let version = String::deserialize(deserializer)?;
        if version == JSONRPC_VERSION {
            Ok(JsonRpcVersion)
        } else {
            Err(serde::de::Error::custom(format!(
                "invalid JSON-RPC version: expected '{JSONRPC_VERSION}', got '{version}'"
            )))
        }
    }
}

/// Request identifier: an integer or a string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric id
    Number(i64),
    /// String id
    String(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

/// Response id: a request id, or null for parse-error replies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseId(pub Option<RequestId>);

impl ResponseId {
    /// Response id echoing a request
    pub fn from_request(id: RequestId) -> Self {
        Self(Some(id))
    }

    /// Null id, used only when the triggering message could not be parsed
    pub const fn null() -> Self {
        Self(None)
    }

    /// Get the request id if present
    pub fn as_request_id(&self) -> Option<&RequestId> {
        self.0.as_ref()
    }

    /// Check whether this is the null id
    pub const fn is_null(&self) -> bool {
        self.0.is_none()
    }
}

/// JSON-RPC request message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version
    pub jsonrpc: JsonRpcVersion,
    /// Request identifier
    pub id: RequestId,
    /// Method name
    pub method: String,
    /// Method parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl JsonRpcRequest {
    /// Create a new request
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id: id.into(),
            method: method.into(),
            params,
            meta: None,
        }
    }

    /// Create a request with serializable parameters
    pub fn with_params<P: Serialize>(
        id: impl Into<RequestId>,
        method: impl Into<String>,
        params: &P,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(id, method, Some(serde_json::to_value(params)?)))
    }
}

/// JSON-RPC notification message (no response expected)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// JSON-RPC version
    pub jsonrpc: JsonRpcVersion,
    /// Method name
    pub method: String,
    /// Notification parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl JsonRpcNotification {
    /// Create a new notification
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            method: method.into(),
            params,
            meta: None,
        }
    }

    /// Create a notification with serializable parameters
    pub fn with_params<P: Serialize>(
        method: impl Into<String>,
        params: &P,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(method, Some(serde_json::to_value(params)?)))
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Response payload: exactly one of `result` or `error`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponsePayload {
    /// Successful response
    Success {
        /// Result value
        result: Value,
    },
    /// Error response
    Error {
        /// Error object
        error: JsonRpcError,
    },
}

/// JSON-RPC response message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version
    pub jsonrpc: JsonRpcVersion,
    /// Response payload (result or error, never both)
    #[serde(flatten)]
    pub payload: ResponsePayload,
    /// Id of the request this answers (null only for parse errors)
    pub id: ResponseId,
    /// Extension metadata, preserved unchanged
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl JsonRpcResponse {
    /// Create a successful response
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            payload: ResponsePayload::Success { result },
            id: ResponseId::from_request(id),
            meta: None,
        }
    }

    /// Create an error response for a known request id
    pub fn error(id: RequestId, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            payload: ResponsePayload::Error { error },
            id: ResponseId::from_request(id),
            meta: None,
        }
    }

    /// Create a parse-error response (null id)
    pub fn parse_error(error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            payload: ResponsePayload::Error { error },
            id: ResponseId::null(),
            meta: None,
        }
    }

    /// Get the result if this is a success response
    pub fn result(&self) -> Option<&Value> {
        match &self.payload {
            ResponsePayload::Success { result } => Some(result),
            ResponsePayload::Error { .. } => None,
        }
    }

    /// Get the error if this is an error response
    pub fn error_object(&self) -> Option<&JsonRpcError> {
        match &self.payload {
            ResponsePayload::Success { .. } => None,
            ResponsePayload::Error { error } => Some(error),
        }
    }

    /// Consume this response into a `Result` over its payload
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        match self.payload {
            ResponsePayload::Success { result } => Ok(result),
            ResponsePayload::Error { error } => Err(error),
        }
    }

    /// Check whether this is a success response
    pub const fn is_success(&self) -> bool {
        matches!(self.payload, ResponsePayload::Success { .. })
    }
}

/// Message classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// A request: non-null id and a method
    Request,
    /// A response: id (possibly null) and exactly one of result/error
    Response,
    /// A notification: method and no id
    Notification,
}

/// Classify a raw JSON value as request, response, or notification.
///
/// Returns `None` when the value matches none of the three shapes; such
/// messages are protocol errors. Exactly one classifier can match any given
/// value: requests and notifications require `method` while responses forbid
/// it, and requests require an `id` that notifications forbid.
#[must_use]
pub fn classify(value: &Value) -> Option<MessageKind> {
    let object = value.as_object()?;
    let has_method = object.contains_key("method");
    let id = object.get("id");
    let has_result = object.contains_key("result");
    let has_error = object.contains_key("error");

    if has_method {
        return match id {
            Some(Value::Null) => None,
            Some(_) => Some(MessageKind::Request),
            None => Some(MessageKind::Notification),
        };
    }

    if id.is_some() && (has_result ^ has_error) {
        return Some(MessageKind::Response);
    }

    None
}

/// A classified JSON-RPC message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    /// Request message
    Request(JsonRpcRequest),
    /// Response message
    Response(JsonRpcResponse),
    /// Notification message
    Notification(JsonRpcNotification),
}

impl Envelope {
    /// Classify and decode a raw JSON value
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        use serde::de::Error as _;
        match classify(&value) {
            Some(MessageKind::Request) => serde_json::from_value(value).map(Self::Request),
            Some(MessageKind::Response) => serde_json::from_value(value).map(Self::Response),
            Some(MessageKind::Notification) => {
                serde_json::from_value(value).map(Self::Notification)
            }
            None => Err(serde_json::Error::custom(
                "message is not a JSON-RPC request, response, or notification",
            )),
        }
    }

    /// Get the method name for requests and notifications
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(r) => Some(&r.method),
            Self::Notification(n) => Some(&n.method),
            Self::Response(_) => None,
        }
    }
}

impl<'de> Deserialize<'de> for Envelope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl From<JsonRpcRequest> for Envelope {
    fn from(request: JsonRpcRequest) -> Self {
        Self::Request(request)
    }
}

impl From<JsonRpcResponse> for Envelope {
    fn from(response: JsonRpcResponse) -> Self {
        Self::Response(response)
    }
}

impl From<JsonRpcNotification> for Envelope {
    fn from(notification: JsonRpcNotification) -> Self {
        Self::Notification(notification)
    }
}
