//! # acpkit-transport
//!
//! The transport contract for ACP connections, plus the two built-in
//! carriers: newline-delimited JSON over stdio and single-envelope HTTP
//! POST.
//!
//! A transport is a framed, bidirectional byte carrier. It moves opaque
//! JSON text frames; parsing, classification, and dispatch belong to the
//! protocol engine above it. The engine is the single consumer of
//! [`Transport::receive`].

#![warn(missing_docs, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod http;
pub mod stdio;

use async_trait::async_trait;

pub use http::{HttpClientTransport, HttpServerConfig, HttpServerTransport};
pub use stdio::{StdioConfig, StdioTransport};

/// Result type for transport operations
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Errors reported by a transport
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The transport was used before `start` or after `close`
    #[error("transport not started: {0}")]
    NotStarted(String),

    /// The peer went away or the carrier shut down
    #[error("transport closed: {0}")]
    Closed(String),

    /// A frame could not be written
    #[error("send failed: {0}")]
    SendFailed(String),

    /// A frame could not be read
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// A frame violated the carrier's framing rules
    #[error("framing violation: {0}")]
    Framing(String),

    /// The transport was misconfigured
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// A framed, bidirectional message carrier.
///
/// `start` brings the carrier up, `close` tears it down (idempotently),
/// `send` writes one frame, and `receive` yields the next inbound frame or
/// `None` once the carrier has closed. Implementations must tolerate `send`
/// from multiple tasks; callers above serialize writes anyway.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Human-readable endpoint description, for diagnostics
    fn endpoint(&self) -> String;

    /// Bring the carrier up; must be called before `send`/`receive`
    async fn start(&self) -> TransportResult<()>;

    /// Tear the carrier down; further operations fail with `Closed`.
    ///
    /// Closing twice is a no-op.
    async fn close(&self) -> TransportResult<()>;

    /// Write one JSON text frame
    async fn send(&self, frame: String) -> TransportResult<()>;

    /// Read the next inbound frame; `Ok(None)` means the carrier closed
    async fn receive(&self) -> TransportResult<Option<String>>;
}

/// Lifecycle state shared by the built-in transports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransportState {
    /// Created, not yet started
    Idle,
    /// Running
    Started,
    /// Torn down
    Closed,
}
