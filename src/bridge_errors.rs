//! Errors used throughout the bridge.
//!
//! `BridgeError` is the single error type returned by the coordinate mapper,
//! the board observer, the move executor, the engine channel and the session
//! loop. Every variant except `Timeout` on an optional wait is fatal for the
//! running game session: the session loop stops at the first error it sees and
//! runs its teardown path.
//!
//! Usage guidelines:
//! - Functions return `BridgeResult<T>` and propagate with `?`.
//! - Unexpected payloads while waiting for an acknowledgment are not errors;
//!   they are discarded by the channel and never surface here.

use thiserror::Error;

/// Unified error type for the bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// A UI element the core relies on could not be located.
    ///
    /// Payload: a printable form of the selector that failed. The UI is
    /// assumed to have changed incompatibly, so this ends the session.
    #[error("UI element not found: {selector}")]
    ElementNotFound { selector: String },

    /// The engine's result line did not end in a parseable move token.
    #[error("malformed engine result: {0:?}")]
    MalformedResult(String),

    /// A square could not be converted between representations.
    ///
    /// Payload: the offending identifier, algebraic text or index.
    #[error("invalid square: {0}")]
    InvalidSquare(String),

    /// The clock text read from the UI was not `[h:]m:ss[.f]`.
    #[error("invalid clock reading: {0:?}")]
    InvalidClock(String),

    /// A bounded wait expired before the awaited transition happened.
    #[error("timed out waiting for {waiting_for}")]
    Timeout { waiting_for: &'static str },

    /// The peer closed the engine connection (zero-byte read).
    #[error("engine connection closed")]
    ConnectionClosed,

    /// Unexpected command on the engine side of the protocol.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Credentials could not be obtained from the configured provider.
    #[error("credentials unavailable: {0}")]
    Credentials(String),

    /// The automation layer failed outside of element lookup.
    #[error("automation failure: {0}")]
    Automation(String),

    /// Transport-level failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    pub fn element_not_found(selector: impl std::fmt::Display) -> Self {
        BridgeError::ElementNotFound {
            selector: selector.to_string(),
        }
    }
}

/// Result alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
