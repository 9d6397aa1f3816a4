//! DETHLINK Transport
//!
//! Line-framed TCP transport for the DETH gateway protocol: newline
//! framing, TCP keep-alive, and a channel-based sender/receiver split so
//! one task owns the socket.

pub mod error;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
pub use tcp::{LineConfig, LineReceiver, LineSender, LineTransport};
pub use traits::{TransportEvent, TransportReceiver, TransportSender};
