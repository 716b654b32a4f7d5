//! # acpkit-protocol
//!
//! Wire-level foundation of the Agent Client Protocol (ACP): the JSON-RPC
//! 2.0 envelope with field-presence classification, the codec that maps
//! text to classified envelopes and back, the ACP error taxonomy, and every
//! typed request, result, notification, and update payload the protocol
//! defines.
//!
//! Higher layers build on this crate: `acpkit-rpc` dispatches envelopes,
//! `acpkit-agent` and `acpkit-client` implement the two endpoint roles.
//!
//! ## Message model
//!
//! A message is a request (non-null `id` + `method`), a response (`id`,
//! exactly one of `result`/`error`, no `method`), or a notification
//! (`method`, no `id`). Anything else is a protocol error. See
//! [`jsonrpc::classify`].
//!
//! ## Extensibility
//!
//! `_meta` may appear on any message or object and is preserved unchanged.
//! Vendor methods begin with `_` and resolve to method-not-found when
//! unsupported.

#![warn(missing_docs, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod jsonrpc;
pub mod methods;
pub mod types;

pub use codec::{decode_envelope, parse_envelope, serialize_envelope};
pub use error::{AcpError, AcpErrorKind, Result, codes};
pub use jsonrpc::{
    Envelope, JSONRPC_VERSION, JsonRpcError, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, JsonRpcVersion, MessageKind, RequestId, ResponseId, ResponsePayload,
    classify,
};
pub use types::*;
