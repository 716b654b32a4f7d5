//! Wire method names.
//!
//! Both sides address each other through these constants instead of string
//! literals. Vendor extension methods begin with `_` and resolve to
//! method-not-found when unsupported.

/// Capability negotiation handshake (client -> agent)
pub const INITIALIZE: &str = "initialize";
/// Authentication against an advertised method (client -> agent)
pub const AUTHENTICATE: &str = "authenticate";
/// Create a session (client -> agent)
pub const SESSION_NEW: &str = "session/new";
/// Load an existing session (client -> agent)
pub const SESSION_LOAD: &str = "session/load";
/// Run a prompt turn (client -> agent)
pub const SESSION_PROMPT: &str = "session/prompt";
/// Switch the session mode (either direction)
pub const SESSION_SET_MODE: &str = "session/set_mode";
/// Set a configuration option (client -> agent)
pub const SESSION_SET_CONFIG_OPTION: &str = "session/set_config_option";
/// Cancel a session; a notification, not a request (client -> agent)
pub const SESSION_CANCEL: &str = "session/cancel";
/// Streamed session update; a notification (agent -> client)
pub const SESSION_UPDATE: &str = "session/update";
/// Ask the user to authorize an operation (agent -> client)
pub const SESSION_REQUEST_PERMISSION: &str = "session/request_permission";
/// Read a text file from the workspace (agent -> client)
pub const FS_READ_TEXT_FILE: &str = "fs/read_text_file";
/// Write a text file into the workspace (agent -> client)
pub const FS_WRITE_TEXT_FILE: &str = "fs/write_text_file";
/// Create a terminal (agent -> client)
pub const TERMINAL_CREATE: &str = "terminal/create";
/// Fetch accumulated terminal output (agent -> client)
pub const TERMINAL_OUTPUT: &str = "terminal/output";
/// Wait for a terminal's process to exit (agent -> client)
pub const TERMINAL_WAIT_FOR_EXIT: &str = "terminal/wait_for_exit";
/// Send a signal to a terminal's process (agent -> client)
pub const TERMINAL_KILL: &str = "terminal/kill";
/// Release a terminal and its resources (agent -> client)
pub const TERMINAL_RELEASE: &str = "terminal/release";

/// Check whether a method name is a vendor extension (leading underscore)
#[must_use]
pub fn is_vendor_extension(method: &str) -> bool {
    method.starts_with('_')
}
