//! Session engine tests against a scripted local gateway

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::time::sleep;

use dethlink_client::{GatewayConfig, GatewayConnection, SessionState, StateListener};
use dethlink_core::{ItemKey, ItemValue, ModuleType, SerialNumber};

#[derive(Default)]
struct RecordingStateListener {
    states: Mutex<Vec<SessionState>>,
}

impl StateListener for RecordingStateListener {
    fn on_state_changed(&self, state: SessionState, _message: Option<&str>) {
        self.states.lock().push(state);
    }
}

fn config_for(addr: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::new(addr.ip().to_string());
    config.port = addr.port();
    config.reconnect = false;
    config
}

/// Scripted gateway: answers LOGIN with a session-open line and APPINFO
/// with a description dump followed by the clock and a status line.
async fn spawn_gateway() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = socket.into_split();
        let mut lines = BufReader::new(read_half).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match line.as_str() {
                "LOGIN" => {
                    write_half
                        .write_all(b"INFO:Session opened:INFO\n")
                        .await
                        .unwrap();
                }
                "APPINFO" => {
                    write_half
                        .write_all(
                            b"BIR002F02Kitchen lights[Kitchen]\n\
                              14:25 03/11/2021\n\
                              BIR002F02O03\n",
                        )
                        .await
                        .unwrap();
                }
                _ => {}
            }
        }
    });
    addr
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..250 {
        if condition() {
            return;
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not met within timeout");
}

#[tokio::test]
async fn session_comes_online_and_routes_traffic() {
    let _ = tracing_subscriber::fmt::try_init();
    let addr = spawn_gateway().await;
    let connection = GatewayConnection::new(config_for(addr)).unwrap();
    let listener = Arc::new(RecordingStateListener::default());
    connection.set_state_listener(Some(listener.clone()));

    connection.start_gateway().await.unwrap();
    assert!(connection.is_online());
    assert_eq!(
        listener.states.lock().as_slice(),
        &[
            SessionState::Initializing,
            SessionState::StartingSession,
            SessionState::Online
        ]
    );

    // the APPINFO answer populates the registry and the clock
    let registry = connection.registry().clone();
    wait_until(|| registry.module_count() == 1).await;
    wait_until(|| connection.gateway_time().is_some()).await;

    let serial = SerialNumber::new(0x2F02).unwrap();
    let module = registry.get_module(ModuleType::Bir, serial).unwrap();
    assert_eq!(module.description().name(), "Kitchen lights");

    // status line after the clock closed the description cycle
    let key = ItemKey::io(module.module_key(), 1);
    wait_until(|| module.item(&key).unwrap().value() == Some(ItemValue::Bool(true))).await;
    assert_eq!(
        module
            .item(&ItemKey::io(module.module_key(), 3))
            .unwrap()
            .value(),
        Some(ItemValue::Bool(false))
    );

    let time = connection.gateway_time().unwrap();
    assert_eq!(time.format("%H:%M %d/%m/%Y").to_string(), "14:25 03/11/2021");

    connection.stop_gateway().await;
    assert_eq!(connection.state(), SessionState::Offline);
    assert_eq!(
        listener.states.lock().last().copied(),
        Some(SessionState::Offline)
    );
}

#[tokio::test]
async fn commands_are_dropped_while_offline() {
    let connection =
        GatewayConnection::new(config_for("127.0.0.1:17481".parse().unwrap())).unwrap();
    assert!(!connection.is_online());

    // fire-and-drop: nothing to assert beyond not blowing up
    connection.send_command("&BIR002F02-1%I");

    let serial = SerialNumber::new(0x2F02).unwrap();
    let module = connection
        .registry()
        .get_module(ModuleType::Bir, serial)
        .unwrap();
    module.set_output(1);
}

#[tokio::test]
async fn refused_session_fails_start() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = socket.into_split();
        let mut lines = BufReader::new(read_half).lines();
        if let Ok(Some(_login)) = lines.next_line().await {
            write_half
                .write_all(b"INFO:Access denied:INFO\n")
                .await
                .unwrap();
        }
    });

    let connection = GatewayConnection::new(config_for(addr)).unwrap();
    let result = connection.start_gateway().await;
    assert!(result.is_err());
    // a refused session is not worth retrying
    assert_eq!(connection.state(), SessionState::Fatal);
}

#[tokio::test]
async fn refusal_during_reconnect_goes_fatal() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        // first session opens, then the gateway hangs up
        let (socket, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = socket.into_split();
        let mut lines = BufReader::new(read_half).lines();
        if let Ok(Some(_login)) = lines.next_line().await {
            write_half
                .write_all(b"INFO:Session opened:INFO\n")
                .await
                .unwrap();
        }
        drop(write_half);
        drop(lines);

        // the reconnect attempt is refused
        let (socket, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = socket.into_split();
        let mut lines = BufReader::new(read_half).lines();
        if let Ok(Some(_login)) = lines.next_line().await {
            write_half
                .write_all(b"INFO:Access denied:INFO\n")
                .await
                .unwrap();
        }
        let _ = lines.next_line().await;
    });

    let mut config = config_for(addr);
    config.reconnect = true;
    config.reconnect_interval_ms = 100;
    let connection = GatewayConnection::new(config).unwrap();
    connection.start_gateway().await.unwrap();

    // the engine must park in FATAL instead of retrying the refusal
    wait_until(|| connection.state() == SessionState::Fatal).await;
}

#[tokio::test]
async fn unreachable_gateway_fails_start() {
    // bind then drop to get a dead port
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let connection = GatewayConnection::new(config_for(addr)).unwrap();
    assert!(connection.start_gateway().await.is_err());
    assert_eq!(connection.state(), SessionState::Error);
}

#[tokio::test]
async fn peer_close_without_reconnect_goes_offline() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = socket.into_split();
        let mut lines = BufReader::new(read_half).lines();
        if let Ok(Some(_login)) = lines.next_line().await {
            write_half
                .write_all(b"INFO:Session opened:INFO\n")
                .await
                .unwrap();
        }
        // wait for APPINFO, then hang up
        let _ = lines.next_line().await;
    });

    let connection = GatewayConnection::new(config_for(addr)).unwrap();
    connection.start_gateway().await.unwrap();
    wait_until(|| connection.state() == SessionState::Offline).await;
}
