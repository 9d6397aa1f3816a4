//! DETHLINK Client
//!
//! Session engine for DETH home automation gateways: persistent TCP
//! connection, LOGIN handshake, PING keepalive, APPINFO description
//! cycles, stale detection and optional auto-reconnect. Inbound status
//! lines are routed into the [`dethlink_core::Registry`] owned by the
//! connection.
//!
//! ```no_run
//! use dethlink_client::{GatewayConfig, GatewayConnection};
//!
//! # async fn run() -> dethlink_client::Result<()> {
//! let connection = GatewayConnection::new(GatewayConfig::new("192.168.1.10"))?;
//! connection.start_gateway().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod reset;
pub mod session;

pub use config::GatewayConfig;
pub use connection::GatewayConnection;
pub use error::{ClientError, Result};
pub use reset::ResetTimer;
pub use session::{SessionState, StateListener};
