//! The ACP error taxonomy.
//!
//! Every failure that crosses the wire is an [`AcpError`]: a classification
//! kind, a human-readable message, and optional structured data. Each kind
//! maps one-to-one onto a JSON-RPC error code, so handlers fail locally
//! with an `AcpError` and the engine serializes it into the
//! `{code, message, data}` wire object.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::jsonrpc::JsonRpcError;

/// Result type alias for ACP operations
pub type Result<T> = std::result::Result<T, AcpError>;

/// JSON-RPC and ACP error codes
pub mod codes {
    /// Parse error - malformed JSON was received
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid Request - the envelope fails the JSON-RPC schema
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found - the method does not exist on this endpoint
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params - params fail the handler-declared schema
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error - unclassified failure
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Referenced session absent from the registry
    pub const SESSION_NOT_FOUND: i32 = -32000;
    /// Operation requires authentication that has not succeeded
    pub const AUTH_REQUIRED: i32 = -32001;
    /// User-level denial
    pub const PERMISSION_DENIED: i32 = -32002;
    /// Operation raced with session cancellation
    pub const CANCELLED: i32 = -32003;
    /// Path, terminal id, or mode id absent
    pub const RESOURCE_NOT_FOUND: i32 = -32004;
    /// Client policy forbids access
    pub const RESOURCE_ACCESS_DENIED: i32 = -32005;
    /// Operation illegal in the current state
    pub const INVALID_SESSION_STATE: i32 = -32006;
    /// Negotiated capabilities forbid the operation
    pub const CAPABILITY_NOT_SUPPORTED: i32 = -32007;
    /// Too many requests; data may include `retryAfter`
    pub const RATE_LIMITED: i32 = -32008;
    /// Outbound request deadline expired
    pub const TIMEOUT: i32 = -32009;
}

/// Error classification for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcpErrorKind {
    /// Malformed JSON in the envelope (-32700)
    Parse,
    /// Envelope fails the JSON-RPC schema (-32600)
    InvalidRequest,
    /// Unknown method in either direction (-32601)
    MethodNotFound,
    /// Params fail the handler-declared schema (-32602)
    InvalidParams,
    /// Unclassified failure (-32603)
    Internal,
    /// Referenced session absent from the registry (-32000)
    SessionNotFound,
    /// Authentication has not succeeded (-32001)
    AuthRequired,
    /// User-level denial (-32002)
    PermissionDenied,
    /// Operation raced with session cancellation (-32003)
    Cancelled,
    /// Path, terminal id, or mode id absent (-32004)
    ResourceNotFound,
    /// Client policy forbids access (-32005)
    ResourceAccessDenied,
    /// Operation illegal in the current state (-32006)
    InvalidSessionState,
    /// Negotiated capabilities forbid the operation (-32007)
    CapabilityNotSupported,
    /// Too many requests (-32008)
    RateLimited,
    /// Outbound request deadline expired (-32009)
    Timeout,
}

impl AcpErrorKind {
    /// Get the JSON-RPC error code for this kind
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Parse => codes::PARSE_ERROR,
            Self::InvalidRequest => codes::INVALID_REQUEST,
            Self::MethodNotFound => codes::METHOD_NOT_FOUND,
            Self::InvalidParams => codes::INVALID_PARAMS,
            Self::Internal => codes::INTERNAL_ERROR,
            Self::SessionNotFound => codes::SESSION_NOT_FOUND,
            Self::AuthRequired => codes::AUTH_REQUIRED,
            Self::PermissionDenied => codes::PERMISSION_DENIED,
            Self::Cancelled => codes::CANCELLED,
            Self::ResourceNotFound => codes::RESOURCE_NOT_FOUND,
            Self::ResourceAccessDenied => codes::RESOURCE_ACCESS_DENIED,
            Self::InvalidSessionState => codes::INVALID_SESSION_STATE,
            Self::CapabilityNotSupported => codes::CAPABILITY_NOT_SUPPORTED,
            Self::RateLimited => codes::RATE_LIMITED,
            Self::Timeout => codes::TIMEOUT,
        }
    }

    /// Classify a numeric code back into a kind.
    ///
    /// Unknown codes fall back to [`AcpErrorKind::Internal`] so that foreign
    /// application errors still surface as structured failures.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            codes::PARSE_ERROR => Self::Parse,
            codes::INVALID_REQUEST => Self::InvalidRequest,
            codes::METHOD_NOT_FOUND => Self::MethodNotFound,
            codes::INVALID_PARAMS => Self::InvalidParams,
            codes::SESSION_NOT_FOUND => Self::SessionNotFound,
            codes::AUTH_REQUIRED => Self::AuthRequired,
            codes::PERMISSION_DENIED => Self::PermissionDenied,
            codes::CANCELLED => Self::Cancelled,
            codes::RESOURCE_NOT_FOUND => Self::ResourceNotFound,
            codes::RESOURCE_ACCESS_DENIED => Self::ResourceAccessDenied,
            codes::INVALID_SESSION_STATE => Self::InvalidSessionState,
            codes::CAPABILITY_NOT_SUPPORTED => Self::CapabilityNotSupported,
            codes::RATE_LIMITED => Self::RateLimited,
            codes::TIMEOUT => Self::Timeout,
            _ => Self::Internal,
        }
    }

    /// Get a human-readable description of this error kind
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Parse => "Parse error",
            Self::InvalidRequest => "Invalid Request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::Internal => "Internal error",
            Self::SessionNotFound => "Session not found",
            Self::AuthRequired => "Authentication required",
            Self::PermissionDenied => "Permission denied",
            Self::Cancelled => "Cancelled",
            Self::ResourceNotFound => "Resource not found",
            Self::ResourceAccessDenied => "Resource access denied",
            Self::InvalidSessionState => "Invalid session state",
            Self::CapabilityNotSupported => "Capability not supported",
            Self::RateLimited => "Rate limited",
            Self::Timeout => "Timeout",
        }
    }
}

impl fmt::Display for AcpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Structured ACP error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcpError {
    /// Error classification
    pub kind: AcpErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Additional structured error data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl AcpError {
    /// Create a new error with the specified kind and message
    pub fn new(kind: AcpErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured data to this error
    #[must_use]
    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Create a parse error (-32700)
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(AcpErrorKind::Parse, message)
    }

    /// Create an invalid request error (-32600)
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(AcpErrorKind::InvalidRequest, message)
    }

    /// Create a method-not-found error (-32601) carrying `data.method`
    pub fn method_not_found(method: impl Into<String>) -> Self {
        let method = method.into();
        Self::new(
            AcpErrorKind::MethodNotFound,
            format!("Method not found: {method}"),
        )
        .with_data(serde_json::json!({ "method": method }))
    }

    /// Create an invalid params error (-32602)
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(AcpErrorKind::InvalidParams, message)
    }

    /// Create an internal error (-32603)
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(AcpErrorKind::Internal, message)
    }

    /// Create a session-not-found error (-32000) for the given session id
    pub fn session_not_found(session_id: impl fmt::Display) -> Self {
        Self::new(
            AcpErrorKind::SessionNotFound,
            format!("Session not found: {session_id}"),
        )
    }

    /// Create an auth-required error (-32001)
    pub fn auth_required(message: impl Into<String>) -> Self {
        Self::new(AcpErrorKind::AuthRequired, message)
    }

    /// Create a permission-denied error (-32002)
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(AcpErrorKind::PermissionDenied, message)
    }

    /// Create a cancelled error (-32003)
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(AcpErrorKind::Cancelled, message)
    }

    /// Create a resource-not-found error (-32004)
    pub fn resource_not_found(resource: impl fmt::Display) -> Self {
        Self::new(
            AcpErrorKind::ResourceNotFound,
            format!("Resource not found: {resource}"),
        )
    }

    /// Create a resource-access-denied error (-32005)
    pub fn resource_access_denied(message: impl Into<String>) -> Self {
        Self::new(AcpErrorKind::ResourceAccessDenied, message)
    }

    /// Create an invalid-session-state error (-32006)
    pub fn invalid_session_state(message: impl Into<String>) -> Self {
        Self::new(AcpErrorKind::InvalidSessionState, message)
    }

    /// Create a capability-not-supported error (-32007)
    pub fn capability_not_supported(capability: impl fmt::Display) -> Self {
        Self::new(
            AcpErrorKind::CapabilityNotSupported,
            format!("Capability not supported: {capability}"),
        )
    }

    /// Create a rate-limited error (-32008) with an optional retry hint in ms
    pub fn rate_limited(message: impl Into<String>, retry_after_ms: Option<u64>) -> Self {
        let error = Self::new(AcpErrorKind::RateLimited, message);
        match retry_after_ms {
            Some(ms) => error.with_data(serde_json::json!({ "retryAfter": ms })),
            None => error,
        }
    }

    /// Create a timeout error (-32009)
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(AcpErrorKind::Timeout, message)
    }

    /// Get the JSON-RPC error code for this error
    #[must_use]
    pub const fn code(&self) -> i32 {
        self.kind.code()
    }

    /// Check whether this error is a cancellation
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.kind, AcpErrorKind::Cancelled)
    }

    /// Convert to the wire-level JSON-RPC error object
    #[must_use]
    pub fn to_wire(&self) -> JsonRpcError {
        JsonRpcError {
            code: self.code(),
            message: self.message.clone(),
            data: self.data.clone(),
        }
    }
}

impl fmt::Display for AcpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for AcpError {}

impl From<JsonRpcError> for AcpError {
    fn from(error: JsonRpcError) -> Self {
        Self {
            kind: AcpErrorKind::from_code(error.code),
            message: error.message,
            data: error.data,
        }
    }
}

impl From<AcpError> for JsonRpcError {
    fn from(error: AcpError) -> Self {
        error.to_wire()
    }
}

impl From<serde_json::Error> for AcpError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_params(format!("JSON conversion failed: {err}"))
    }
}
