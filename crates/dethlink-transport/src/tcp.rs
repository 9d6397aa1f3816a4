//! Line-framed TCP transport
//!
//! The gateway speaks newline-terminated ASCII over one persistent TCP
//! connection. Lines are framed by `\n`; a trailing `\r` is tolerated on
//! inbound lines and never emitted outbound.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::error::{Result, TransportError};
use crate::traits::{TransportEvent, TransportReceiver, TransportSender};

/// Maximum accepted line length. Status lines are short; anything near
/// this limit means the peer is not speaking the protocol.
const MAX_LINE_LEN: usize = 4096;

/// Channel buffer size per connection
const CHANNEL_BUFFER_SIZE: usize = 1000;

/// Line transport configuration
#[derive(Debug, Clone)]
pub struct LineConfig {
    /// Maximum line length in bytes
    pub max_line_len: usize,
    /// TCP keep-alive time in seconds (0 = disabled)
    pub keepalive_secs: u64,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            max_line_len: MAX_LINE_LEN,
            keepalive_secs: 30,
        }
    }
}

/// Client-side line-framed TCP transport
pub struct LineTransport {
    config: LineConfig,
}

impl LineTransport {
    pub fn new() -> Self {
        Self {
            config: LineConfig::default(),
        }
    }

    pub fn with_config(config: LineConfig) -> Self {
        Self { config }
    }

    /// Connect to a gateway
    pub async fn connect(&self, addr: &str) -> Result<(LineSender, LineReceiver)> {
        info!("connecting to gateway at {}", addr);

        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        if self.config.keepalive_secs > 0 {
            let socket = socket2::SockRef::from(&stream);
            let keepalive = socket2::TcpKeepalive::new()
                .with_time(std::time::Duration::from_secs(self.config.keepalive_secs));
            let _ = socket.set_tcp_keepalive(&keepalive);
        }

        let connected = Arc::new(Mutex::new(true));
        let (outgoing_tx, outgoing_rx) = mpsc::channel::<String>(CHANNEL_BUFFER_SIZE);
        let (incoming_tx, incoming_rx) = mpsc::channel::<TransportEvent>(CHANNEL_BUFFER_SIZE);

        let sender = LineSender {
            tx: outgoing_tx,
            connected: connected.clone(),
        };
        let receiver = LineReceiver { rx: incoming_rx };

        let max_line_len = self.config.max_line_len;
        let connected_clone = connected.clone();
        tokio::spawn(async move {
            let (reader, writer) = stream.into_split();
            run_line_io_loop(reader, writer, outgoing_rx, incoming_tx, max_line_len, connected_clone)
                .await;
        });

        info!("connected to {}", addr);
        Ok((sender, receiver))
    }
}

impl Default for LineTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Reader/writer loop owning both socket halves
async fn run_line_io_loop(
    mut reader: OwnedReadHalf,
    mut writer: OwnedWriteHalf,
    mut outgoing_rx: mpsc::Receiver<String>,
    incoming_tx: mpsc::Sender<TransportEvent>,
    max_line_len: usize,
    connected: Arc<Mutex<bool>>,
) {
    let mut read_buf = BytesMut::with_capacity(8192);

    loop {
        tokio::select! {
            outgoing = outgoing_rx.recv() => {
                let Some(line) = outgoing else {
                    debug!("outbound channel closed, shutting down io loop");
                    break;
                };
                let mut frame = line.into_bytes();
                frame.push(b'\n');
                if let Err(e) = writer.write_all(&frame).await {
                    error!("tcp write error: {}", e);
                    let _ = incoming_tx
                        .send(TransportEvent::Disconnected { reason: Some(e.to_string()) })
                        .await;
                    break;
                }
            }

            result = reader.read_buf(&mut read_buf) => {
                match result {
                    Ok(0) => {
                        debug!("gateway closed the connection");
                        let _ = incoming_tx
                            .send(TransportEvent::Disconnected { reason: None })
                            .await;
                        break;
                    }
                    Ok(_) => {
                        if !drain_lines(&mut read_buf, &incoming_tx, max_line_len).await {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("tcp read error: {}", e);
                        let _ = incoming_tx.send(TransportEvent::Error(e.to_string())).await;
                        break;
                    }
                }
            }
        }
    }

    *connected.lock() = false;
}

/// Split buffered bytes into complete lines and forward them. Returns
/// `false` when the receiver is gone or the peer overruns the line
/// limit.
async fn drain_lines(
    read_buf: &mut BytesMut,
    incoming_tx: &mpsc::Sender<TransportEvent>,
    max_line_len: usize,
) -> bool {
    loop {
        let Some(newline) = read_buf.iter().position(|&b| b == b'\n') else {
            if read_buf.len() > max_line_len {
                let err = TransportError::LineTooLong(max_line_len);
                error!("{}, dropping connection", err);
                let _ = incoming_tx.send(TransportEvent::Error(err.to_string())).await;
                let _ = incoming_tx
                    .send(TransportEvent::Disconnected {
                        reason: Some(err.to_string()),
                    })
                    .await;
                return false;
            }
            return true;
        };

        let mut raw = read_buf.split_to(newline);
        read_buf.advance(1);
        if raw.last() == Some(&b'\r') {
            raw.truncate(raw.len() - 1);
        }
        if raw.is_empty() {
            continue;
        }
        let line = String::from_utf8_lossy(&raw).into_owned();
        if incoming_tx.send(TransportEvent::Line(line)).await.is_err() {
            return false;
        }
    }
}

/// Sending half of a gateway connection
pub struct LineSender {
    tx: mpsc::Sender<String>,
    connected: Arc<Mutex<bool>>,
}

#[async_trait]
impl TransportSender for LineSender {
    async fn send(&self, line: &str) -> Result<()> {
        if !*self.connected.lock() {
            return Err(TransportError::NotConnected);
        }
        self.tx
            .send(line.to_string())
            .await
            .map_err(|_| TransportError::SendFailed("channel closed".into()))
    }

    fn try_send(&self, line: &str) -> Result<()> {
        if !*self.connected.lock() {
            return Err(TransportError::NotConnected);
        }
        self.tx.try_send(line.to_string()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::BufferFull,
            mpsc::error::TrySendError::Closed(_) => TransportError::ConnectionClosed,
        })
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock()
    }

    async fn close(&self) -> Result<()> {
        *self.connected.lock() = false;
        Ok(())
    }
}

/// Receiving half of a gateway connection
pub struct LineReceiver {
    rx: mpsc::Receiver<TransportEvent>,
}

#[async_trait]
impl TransportReceiver for LineReceiver {
    async fn recv(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await
    }
}
