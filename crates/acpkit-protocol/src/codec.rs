//! Parsing and serialization of wire envelopes.
//!
//! The codec turns UTF-8 JSON text into classified [`Envelope`]s and back.
//! Failure modes map onto the error taxonomy: malformed JSON is a parse
//! error (-32700), structurally valid JSON that fails the envelope schema is
//! an invalid request (-32600).

use serde_json::Value;

use crate::error::{AcpError, Result};
use crate::jsonrpc::Envelope;

/// Parse a UTF-8 JSON string into a classified envelope.
///
/// # Errors
///
/// Returns [`AcpError`] of kind `Parse` for malformed JSON and
/// `InvalidRequest` for JSON that fails envelope classification or schema
/// validation.
pub fn parse_envelope(text: &str) -> Result<Envelope> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| AcpError::parse_error(format!("malformed JSON: {e}")))?;
    decode_envelope(value)
}

/// Classify and decode an already-parsed JSON value.
///
/// # Errors
///
/// Returns [`AcpError`] of kind `InvalidRequest` when the value fails
/// classification or the envelope schema.
pub fn decode_envelope(value: Value) -> Result<Envelope> {
    Envelope::from_value(value).map_err(|e| AcpError::invalid_request(e.to_string()))
}

/// Serialize an envelope to canonical JSON, omitting absent optional fields.
///
/// # Errors
///
/// Returns [`AcpError`] of kind `Internal` when serialization fails, which
/// indicates a bug in the caller-supplied payload rather than a wire issue.
pub fn serialize_envelope(envelope: &Envelope) -> Result<String> {
    serde_json::to_string(envelope)
        .map_err(|e| AcpError::internal(format!("envelope serialization failed: {e}")))
}
