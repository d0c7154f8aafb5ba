use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures_util::{SinkExt, StreamExt};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{Instant, timeout_at};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tower::ServiceExt;

use rs_webterm::app_state::AppState;
use rs_webterm::config::TerminalConfig;
use rs_webterm::protocol::NOT_FOUND_NOTICE;
use rs_webterm::pty::PortablePtyFactory;
use rs_webterm::server::{build_router, serve};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const PACKET_TIMEOUT: Duration = Duration::from_secs(5);

fn test_state() -> AppState {
    let mut config = TerminalConfig::default();
    config.shell.command = Some(vec!["/bin/sh".to_string()]);
    AppState::with_factory(config, Arc::new(PortablePtyFactory))
}

async fn start_server(state: AppState) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, build_router(state), std::future::pending()));
    addr
}

/// A Socket.IO packet on the default namespace
#[derive(Debug)]
struct Packet {
    kind: char,
    ack: Option<u64>,
    payload: Value,
}

/// Split an Engine.IO message packet (`4`) into Socket.IO type, ack id and JSON
fn parse_packet(text: &str) -> Option<Packet> {
    let body = text.strip_prefix('4')?;
    let mut chars = body.chars();
    let kind = chars.next()?;
    let rest = chars.as_str();
    let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let payload = match &rest[digits..] {
        "" => Value::Null,
        json => serde_json::from_str(json).ok()?,
    };
    Some(Packet {
        kind,
        ack: rest[..digits].parse().ok(),
        payload,
    })
}

/// Read packets until one satisfies `matches`, answering engine pings on the way
async fn wait_for(client: &mut Client, matches: impl Fn(&Packet) -> bool) -> Packet {
    let deadline = Instant::now() + PACKET_TIMEOUT;
    loop {
        let message = timeout_at(deadline, client.next())
            .await
            .expect("timed out waiting for packet")
            .expect("connection closed")
            .unwrap();
        let Message::Text(text) = message else {
            continue;
        };
        if text == "2" {
            client.send(Message::Text("3".to_string())).await.unwrap();
            continue;
        }
        if let Some(packet) = parse_packet(&text) {
            if matches(&packet) {
                return packet;
            }
        }
    }
}

/// Open the transport and join the default namespace
async fn connect(addr: SocketAddr) -> Client {
    let url = format!("ws://{}/socket.io/?EIO=4&transport=websocket", addr);
    let (mut client, _) = connect_async(url).await.unwrap();

    let open = timeout_at(Instant::now() + PACKET_TIMEOUT, client.next())
        .await
        .expect("no open packet")
        .expect("connection closed")
        .unwrap();
    let open = open.into_text().unwrap();
    assert!(open.starts_with('0'), "unexpected open packet: {}", open);
    let handshake: Value = serde_json::from_str(&open[1..]).unwrap();
    assert!(handshake["sid"].is_string());

    client.send(Message::Text("40".to_string())).await.unwrap();
    let joined = wait_for(&mut client, |packet| packet.kind == '0').await;
    assert!(joined.payload["sid"].is_string());
    client
}

async fn emit(client: &mut Client, event: &str, data: Value, ack: Option<u64>) {
    let ack = ack.map(|id| id.to_string()).unwrap_or_default();
    let text = format!("42{}{}", ack, json!([event, data]));
    client.send(Message::Text(text)).await.unwrap();
}

async fn wait_for_ack(client: &mut Client, ack: u64) -> Value {
    let packet = wait_for(client, |packet| packet.kind == '3' && packet.ack == Some(ack)).await;
    packet.payload[0].clone()
}

/// Accumulate a session's output events until they contain `needle`
async fn wait_for_output(client: &mut Client, id: &str, needle: &str) -> String {
    let event = format!("terminal_output_{}", id);
    let mut seen = String::new();
    while !seen.contains(needle) {
        let packet = wait_for(client, |packet| packet.kind == '2' && packet.payload[0] == event.as_str()).await;
        seen.push_str(packet.payload[1]["output"].as_str().unwrap_or_default());
    }
    seen
}

#[tokio::test]
async fn test_terminal_round_trip_over_socketio() {
    let addr = start_server(test_state()).await;
    let mut client = connect(addr).await;

    emit(
        &mut client,
        "create_terminal",
        json!({"terminal_id": "t1", "cols": 80, "rows": 24}),
        Some(1),
    )
    .await;
    assert_eq!(wait_for_ack(&mut client, 1).await, json!({"success": true, "id": "t1"}));

    emit(
        &mut client,
        "terminal_input",
        json!({"terminal_id": "t1", "input": "printf 'MARK%s\\n' ER\n"}),
        None,
    )
    .await;
    let seen = wait_for_output(&mut client, "t1", "MARKER").await;
    assert!(seen.contains("MARKER"));

    emit(&mut client, "resize_terminal", json!({"terminal_id": "t1", "cols": 100, "rows": 30}), None).await;

    emit(&mut client, "close_terminal", json!({"terminal_id": "t1"}), Some(2)).await;
    assert_eq!(wait_for_ack(&mut client, 2).await, json!({"success": true}));

    emit(&mut client, "terminal_input", json!({"terminal_id": "t1", "input": "ls\n"}), None).await;
    let notice = wait_for_output(&mut client, "t1", NOT_FOUND_NOTICE).await;
    assert!(notice.contains(NOT_FOUND_NOTICE));
}

#[tokio::test]
async fn test_close_unknown_and_invalid_payload_ack_failure() {
    let addr = start_server(test_state()).await;
    let mut client = connect(addr).await;

    emit(&mut client, "close_terminal", json!({"terminal_id": "nope"}), Some(3)).await;
    let reply = wait_for_ack(&mut client, 3).await;
    assert_eq!(reply["success"], false);
    assert!(reply["error"].is_string());

    emit(&mut client, "create_terminal", json!({"terminal_id": 5}), Some(4)).await;
    let reply = wait_for_ack(&mut client, 4).await;
    assert_eq!(reply["success"], false);
    assert!(reply["error"].as_str().unwrap().starts_with("Invalid request"));
}

#[tokio::test]
async fn test_socketio_and_websocket_share_sessions() {
    let state = test_state();
    let sessions = state.sessions.clone();
    let addr = start_server(state).await;
    let mut client = connect(addr).await;

    sessions.create("shared", None, None).await.unwrap();
    sessions
        .send_input("shared", b"printf 'SHA%s\\n' RED\n")
        .await
        .unwrap();
    let seen = wait_for_output(&mut client, "shared", "SHARED").await;
    assert!(seen.contains("SHARED"));

    emit(&mut client, "close_terminal", json!({"terminal_id": "shared"}), Some(5)).await;
    assert_eq!(wait_for_ack(&mut client, 5).await, json!({"success": true}));
    assert!(!sessions.contains("shared").await);
}

#[tokio::test]
async fn test_polling_handshake_is_not_served_as_static() {
    let router = build_router(test_state());

    let response = router
        .oneshot(
            Request::builder()
                .uri("/socket.io/?EIO=4&transport=polling")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(body.starts_with("0{"), "unexpected body: {}", body);
}
