//! Transport error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransportError>;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("not connected")]
    NotConnected,

    #[error("outbound buffer full")]
    BufferFull,

    #[error("line exceeds maximum length of {0} bytes")]
    LineTooLong(usize),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
