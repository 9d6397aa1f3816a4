//! Transport trait definitions

use async_trait::async_trait;

use crate::error::Result;

/// Events that can occur on a transport
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Connection closed (clean or error)
    Disconnected { reason: Option<String> },
    /// A complete protocol line, framing stripped
    Line(String),
    /// Error occurred
    Error(String),
}

/// Trait for sending protocol lines
#[async_trait]
pub trait TransportSender: Send + Sync {
    /// Send one line; framing is added by the transport
    async fn send(&self, line: &str) -> Result<()>;

    /// Non-blocking send for use from synchronous callers
    fn try_send(&self, line: &str) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Close the sender
    async fn close(&self) -> Result<()>;
}

/// Trait for receiving transport events
#[async_trait]
pub trait TransportReceiver: Send {
    /// Receive the next event
    async fn recv(&mut self) -> Option<TransportEvent>;
}
