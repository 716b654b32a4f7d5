//! # acpkit-rpc
//!
//! The ACP protocol engine. An [`RpcEndpoint`] sits on top of a
//! [`Transport`](acpkit_transport::Transport) and does four jobs:
//!
//! - dispatch inbound requests to registered handlers and write back the
//!   correlated response (method-not-found when no handler is registered);
//! - dispatch inbound notifications to registered handlers, silently
//!   ignoring unknown methods and logging handler failures;
//! - correlate inbound responses with outbound requests through a
//!   pending-request table of one-shot waiters;
//! - serialize every outbound write through a single writer task.
//!
//! The engine is the single consumer of `Transport::receive`. Outbound
//! request ids are generated from a strictly increasing process-global
//! counter. Transport closure rejects every pending waiter and fires the
//! registered close hooks.

#![warn(missing_docs, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod endpoint;

pub use endpoint::{
    NotificationHandler, RequestHandler, RpcEndpoint, RpcEndpointConfig, notification_handler,
    request_handler,
};

use acpkit_protocol::{AcpError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode handler params, mapping absence and shape mismatches to
/// invalid-params errors.
pub fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T> {
    let params = params.unwrap_or(Value::Null);
    serde_json::from_value(params)
        .map_err(|e| AcpError::invalid_params(format!("invalid params: {e}")))
}

/// Encode a handler result value.
pub fn to_result_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| AcpError::internal(format!("result serialization failed: {e}")))
}
