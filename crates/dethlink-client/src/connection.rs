//! Gateway session engine
//!
//! One [`GatewayConnection`] owns the TCP link to one gateway: it runs
//! the LOGIN handshake, keeps the session alive with periodic PINGs,
//! refreshes module descriptions over APPINFO cycles, routes inbound
//! status lines into the registry and watches for stale links. Outbound
//! commands are fire-and-drop: they are only written while the session
//! is online.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Instant as TokioInstant};
use tracing::{debug, error, info, warn};

use dethlink_core::message::is_system_time;
use dethlink_core::{
    parse_system_time, CommandSink, Registry, StatusMessage, CMD_APPINFO, CMD_LOGIN, CMD_PING,
    INFO_PREFIX,
};
use dethlink_transport::{
    LineReceiver, LineSender, LineTransport, TransportEvent, TransportReceiver, TransportSender,
};

use crate::config::GatewayConfig;
use crate::error::{ClientError, Result};
use crate::session::{SessionState, StateListener};

/// The gateway closes idle sessions after about a minute
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(50);

/// How long the LOGIN handshake may take before giving up
const SESSION_OPEN_TIMEOUT: Duration = Duration::from_secs(10);

/// How often the stale watchdog samples the inbound clock
const STALE_CHECK_INTERVAL: Duration = Duration::from_secs(5);

const INFO_SESSION_OPENED: &str = "Session opened";
const INFO_SESSION_TIMEOUT: &str = "Session timeout";
const INFO_ACCESS_DENIED: &str = "Access denied";

/// State shared between the public handle, the io task and the command
/// sink handed to the registry
struct Shared {
    state: RwLock<SessionState>,
    state_listener: Mutex<Option<Arc<dyn StateListener>>>,
    sender: RwLock<Option<Arc<LineSender>>>,
    appinfo_cycle: AtomicBool,
    gateway_time: RwLock<Option<NaiveDateTime>>,
    last_inbound: Mutex<Instant>,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: RwLock::new(SessionState::Offline),
            state_listener: Mutex::new(None),
            sender: RwLock::new(None),
            appinfo_cycle: AtomicBool::new(false),
            gateway_time: RwLock::new(None),
            last_inbound: Mutex::new(Instant::now()),
        }
    }

    fn state(&self) -> SessionState {
        *self.state.read()
    }

    fn set_state(&self, state: SessionState, message: Option<&str>) {
        {
            let mut current = self.state.write();
            if *current == state {
                return;
            }
            *current = state;
        }
        match message {
            Some(m) => info!("session state: {} ({})", state, m),
            None => info!("session state: {}", state),
        }
        let listener = self.state_listener.lock().clone();
        if let Some(listener) = listener {
            listener.on_state_changed(state, message);
        }
    }

    /// Hand a line to the writer channel. Failures are logged and the
    /// line is dropped.
    fn try_send_line(&self, line: &str) -> bool {
        let sender = self.sender.read().clone();
        match sender {
            Some(sender) => match sender.try_send(line) {
                Ok(()) => {
                    debug!("sent: {}", line);
                    true
                }
                Err(e) => {
                    warn!("dropping command {}: {}", line, e);
                    false
                }
            },
            None => {
                warn!("no open connection, dropping command: {}", line);
                false
            }
        }
    }
}

/// Command sink handed to the registry's modules and groups
struct SessionSink {
    shared: Arc<Shared>,
}

impl CommandSink for SessionSink {
    fn send_command(&self, line: &str) {
        if self.shared.state() != SessionState::Online {
            warn!("session not online, dropping command: {}", line);
            return;
        }
        self.shared.try_send_line(line);
    }

    fn is_online(&self) -> bool {
        self.shared.state() == SessionState::Online
    }
}

/// Live connection to one gateway
pub struct GatewayConnection {
    config: GatewayConfig,
    shared: Arc<Shared>,
    registry: Arc<Registry>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl GatewayConnection {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        config.validate()?;
        let shared = Arc::new(Shared::new());
        let registry = Arc::new(Registry::new(Arc::new(SessionSink {
            shared: shared.clone(),
        })));
        Ok(Self {
            config,
            shared,
            registry,
            task: Mutex::new(None),
        })
    }

    /// Modules and groups known on this connection
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    pub fn is_online(&self) -> bool {
        self.shared.state() == SessionState::Online
    }

    /// Last clock value announced by the gateway
    pub fn gateway_time(&self) -> Option<NaiveDateTime> {
        *self.shared.gateway_time.read()
    }

    /// Replace the session state listener
    pub fn set_state_listener(&self, listener: Option<Arc<dyn StateListener>>) {
        *self.shared.state_listener.lock() = listener;
    }

    /// Connect and open the session. Returns once the session is online;
    /// afterwards a background task keeps it alive (and reconnects, when
    /// configured).
    pub async fn start_gateway(&self) -> Result<()> {
        {
            let task = self.task.lock();
            if task.as_ref().map(|t| !t.is_finished()).unwrap_or(false) {
                return Err(ClientError::AlreadyStarted);
            }
        }

        self.shared.set_state(SessionState::Initializing, None);
        let receiver = match open_session(&self.config, &self.shared).await {
            Ok(receiver) => receiver,
            Err(e) => {
                self.shared.set_state(failure_state(&e), Some(&e.to_string()));
                return Err(e);
            }
        };

        let config = self.config.clone();
        let shared = self.shared.clone();
        let registry = self.registry.clone();
        let handle = tokio::spawn(async move {
            supervise(config, shared, registry, receiver).await;
        });
        *self.task.lock() = Some(handle);
        Ok(())
    }

    /// Orderly shutdown: no further sends, in-flight reads terminate
    pub async fn stop_gateway(&self) {
        self.shared.set_state(SessionState::Stopping, None);
        // dropping the sender closes the writer channel and unwinds the
        // transport io loop
        *self.shared.sender.write() = None;
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.shared.set_state(SessionState::Offline, None);
    }

    /// Fire-and-drop command send; refused unless the session is online
    pub fn send_command(&self, line: &str) {
        if !self.is_online() {
            warn!("session not online, dropping command: {}", line);
            return;
        }
        self.shared.try_send_line(line);
    }

    /// Trigger a description refresh outside the periodic schedule
    pub fn refresh_descriptions(&self) {
        if self.is_online() {
            request_appinfo(&self.shared);
        }
    }
}

/// Connect, log in and wait for the gateway to open the session
async fn open_session(config: &GatewayConfig, shared: &Arc<Shared>) -> Result<LineReceiver> {
    let transport = LineTransport::new();
    let (sender, mut receiver) = transport.connect(&config.endpoint()).await?;
    let sender = Arc::new(sender);

    shared.set_state(SessionState::StartingSession, None);
    sender.send(CMD_LOGIN).await?;

    match timeout(SESSION_OPEN_TIMEOUT, wait_for_session_open(&mut receiver)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(e),
        Err(_) => return Err(ClientError::HandshakeTimeout),
    }

    *shared.sender.write() = Some(sender);
    *shared.last_inbound.lock() = Instant::now();
    shared.set_state(SessionState::Online, None);
    request_appinfo(shared);
    Ok(receiver)
}

async fn wait_for_session_open(receiver: &mut LineReceiver) -> Result<()> {
    while let Some(event) = receiver.recv().await {
        match event {
            TransportEvent::Line(line) if line.starts_with(INFO_PREFIX) => {
                if line.contains(INFO_SESSION_OPENED) {
                    return Ok(());
                }
                if line.contains(INFO_ACCESS_DENIED) || line.contains(INFO_SESSION_TIMEOUT) {
                    return Err(ClientError::SessionRefused(line));
                }
                debug!("session control during handshake: {}", line);
            }
            TransportEvent::Line(line) => {
                debug!("ignoring pre-session line: {}", line);
            }
            TransportEvent::Disconnected { reason } => {
                return Err(ClientError::ConnectionFailed(
                    reason.unwrap_or_else(|| "disconnected".to_string()),
                ));
            }
            TransportEvent::Error(e) => {
                return Err(ClientError::ConnectionFailed(e));
            }
        }
    }
    Err(ClientError::ConnectionFailed("connection closed".to_string()))
}

/// State a failed session attempt lands in. A gateway that refuses the
/// session will refuse the next attempt too, so retrying is pointless.
fn failure_state(error: &ClientError) -> SessionState {
    match error {
        ClientError::SessionRefused(_) => SessionState::Fatal,
        _ => SessionState::Error,
    }
}

/// Raise the description-cycle flag and ask for the full dump. The flag
/// stays up until the next gateway clock line.
fn request_appinfo(shared: &Shared) {
    shared.appinfo_cycle.store(true, Ordering::SeqCst);
    shared.try_send_line(CMD_APPINFO);
}

/// Drive the session until it ends; reconnect when configured
async fn supervise(
    config: GatewayConfig,
    shared: Arc<Shared>,
    registry: Arc<Registry>,
    mut receiver: LineReceiver,
) {
    loop {
        run_io(&config, &shared, &registry, &mut receiver).await;
        *shared.sender.write() = None;

        if !shared.state().recoverable() || !config.reconnect {
            shared.set_state(SessionState::Offline, None);
            return;
        }
        shared.set_state(SessionState::Offline, None);

        loop {
            tokio::time::sleep(Duration::from_millis(config.reconnect_interval_ms)).await;
            if !shared.state().recoverable() {
                return;
            }
            shared.set_state(SessionState::Initializing, None);
            match open_session(&config, &shared).await {
                Ok(r) => {
                    receiver = r;
                    break;
                }
                Err(e) => {
                    let state = failure_state(&e);
                    if state == SessionState::Fatal {
                        error!("giving up on gateway: {}", e);
                        shared.set_state(state, Some(&e.to_string()));
                        return;
                    }
                    warn!("reconnect attempt failed: {}", e);
                    shared.set_state(state, Some(&e.to_string()));
                }
            }
        }
    }
}

/// Inbound routing plus session timers. Returns when the link is down,
/// stale or stopping.
async fn run_io(
    config: &GatewayConfig,
    shared: &Arc<Shared>,
    registry: &Arc<Registry>,
    receiver: &mut LineReceiver,
) {
    let mut keepalive = interval_at(TokioInstant::now() + KEEPALIVE_INTERVAL, KEEPALIVE_INTERVAL);
    let appinfo_period = Duration::from_secs(config.appinfo_interval_secs);
    let mut appinfo = interval_at(TokioInstant::now() + appinfo_period, appinfo_period);
    let mut stale_check = tokio::time::interval(STALE_CHECK_INTERVAL);
    let stale_timeout = Duration::from_secs(config.stale_timeout_secs);

    loop {
        tokio::select! {
            event = receiver.recv() => match event {
                Some(TransportEvent::Line(line)) => {
                    *shared.last_inbound.lock() = Instant::now();
                    handle_line(&line, shared, registry);
                }
                Some(TransportEvent::Disconnected { reason }) => {
                    info!("gateway disconnected: {}", reason.as_deref().unwrap_or("eof"));
                    return;
                }
                Some(TransportEvent::Error(e)) => {
                    error!("transport error: {}", e);
                }
                None => return,
            },
            _ = keepalive.tick() => {
                if shared.state() == SessionState::Online {
                    shared.try_send_line(CMD_PING);
                }
            }
            _ = appinfo.tick() => {
                if shared.state() == SessionState::Online {
                    request_appinfo(shared);
                }
            }
            _ = stale_check.tick() => {
                if shared.state() == SessionState::Stopping {
                    return;
                }
                if shared.last_inbound.lock().elapsed() > stale_timeout {
                    warn!("no inbound traffic for {:?}, dropping session", stale_timeout);
                    shared.set_state(SessionState::Stale, None);
                    return;
                }
            }
        }
    }
}

/// Classify one inbound line: session control, gateway clock, or module
/// status
fn handle_line(line: &str, shared: &Shared, registry: &Registry) {
    if line.starts_with(INFO_PREFIX) {
        if line.contains(INFO_SESSION_TIMEOUT) {
            warn!("gateway is closing the session: {}", line);
        } else {
            debug!("session control: {}", line);
        }
        return;
    }

    if is_system_time(line) {
        if let Some(dt) = parse_system_time(line) {
            *shared.gateway_time.write() = Some(dt);
        }
        // the clock line closes a running description cycle
        shared.appinfo_cycle.store(false, Ordering::SeqCst);
        return;
    }

    let appinfo = shared.appinfo_cycle.load(Ordering::SeqCst);
    let is_description = appinfo || line.get(9..).map_or(false, |tail| tail.contains('['));
    match StatusMessage::parse(line, is_description) {
        Ok(msg) => match registry.get_module(msg.module_type(), msg.serial_number()) {
            Ok(module) => module.process_status(&msg, appinfo),
            Err(e) => warn!("no model for {}: {}", line, e),
        },
        Err(e) => debug!("skipping unparseable line {:?}: {}", line, e),
    }
}
