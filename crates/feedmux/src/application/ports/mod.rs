//! Port Interfaces
//!
//! Defines the interfaces (ports) between the router and the RPC transport
//! collaborator, following the Hexagonal Architecture pattern.
//!
//! ## Driven Ports (Outbound)
//!
//! - [`RpcTransport`]: Correlated request/response calls over the shared
//!   connection, plus connection teardown. Request/response matching by
//!   identifier is the transport's responsibility; the router awaits exactly
//!   one result or error per call.
//!
//! ## Driver Ports (Inbound)
//!
//! - [`NotificationSink`]: The registration point the transport invokes once
//!   per inbound unsolicited message. The router's dispatcher implements
//!   this; delivery runs synchronously on whatever task the transport calls
//!   it from.

use async_trait::async_trait;
use serde_json::Value;

// =============================================================================
// Errors
// =============================================================================

/// Failure of a correlated transport call.
///
/// The transport is an opaque collaborator; this type only distinguishes the
/// failure classes the router reacts to. Protocol-level structured errors
/// (an error object in place of a result) surface as [`Self::Server`] rather
/// than being modeled by the router.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The underlying connection is gone.
    #[error("connection closed")]
    ConnectionClosed,

    /// The server answered the call with a protocol-level error.
    #[error("server error {code}: {message}")]
    Server {
        /// Server-assigned error code.
        code: i64,
        /// Human-readable message.
        message: String,
    },

    /// Any other transport failure (I/O, framing, timeout at the transport
    /// layer).
    #[error("transport failure: {0}")]
    Transport(String),
}

// =============================================================================
// Driven Port: RPC Transport
// =============================================================================

/// Correlated request/response transport over the shared connection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Issue a correlated call and await its single result or error.
    async fn call(&self, method: &str, params: Value) -> Result<Value, TransportError>;

    /// Close the underlying connection.
    async fn close_connection(&self);
}

// =============================================================================
// Driver Port: Notification Sink
// =============================================================================

/// Handler for inbound unsolicited messages.
///
/// The transport collaborator registers one sink and invokes it with the
/// method name and raw payload of every out-of-band message it receives.
pub trait NotificationSink: Send + Sync {
    /// Process one inbound notification.
    fn on_notification(&self, method: &str, payload: &Value);
}
