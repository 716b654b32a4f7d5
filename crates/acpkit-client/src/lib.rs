//! # acpkit-client
//!
//! The client (editor) side of the Agent Client Protocol. A
//! [`ClientConnection`] drives the agent — initialize, sessions, prompts,
//! cancellation — while the host's [`Client`] implementation serves the
//! agent's reverse RPCs: permission prompts, text-file access, terminals,
//! and streamed session updates.
//!
//! [`fs::LocalFileSystem`] and [`fs::slice_lines`] implement the text-file
//! read/write contract (line slicing, UTF-8 policy, `created` reporting)
//! for clients that host a real workspace.

#![warn(missing_docs, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod client;
pub mod fs;

pub use client::{Client, ClientConfig, ClientConnection};
pub use fs::{LocalFileSystem, SliceResult, slice_lines};
