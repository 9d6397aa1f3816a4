//! Client error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("session already started")]
    AlreadyStarted,

    #[error("gateway refused the session: {0}")]
    SessionRefused(String),

    #[error("timed out waiting for the session to open")]
    HandshakeTimeout,

    #[error(transparent)]
    Transport(#[from] dethlink_transport::TransportError),
}
