// Shared helpers: one server per test binary plus a small JSON-over-WebSocket client.
#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use snake_server::domain::BoardSize;
use snake_server::use_cases::MatchSettings;
use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

// Host:port of the shared server, published once it is accepting connections.
static SERVER_ADDR: OnceLock<String> = OnceLock::new();
static SERVER_READY: OnceLock<()> = OnceLock::new();

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn test_settings() -> MatchSettings {
    MatchSettings {
        board: BoardSize::new(30, 30),
        tick_interval: Duration::from_millis(50),
        // Long enough that no test sees a time-out.
        match_duration: Duration::from_secs(120),
        event_broadcast_capacity: 128,
    }
}

// Ensure the test server is running and return its host:port.
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let published = Arc::new(OnceLock::<String>::new());
        let published_thread = Arc::clone(&published);
        // The server gets its own runtime so it outlives individual `#[tokio::test]` runtimes.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_thread.set(addr.to_string());
                snake_server::run_with_settings(listener, test_settings())
                    .await
                    .expect("server failed");
            });
        });
        wait_for_readiness(published);
    });

    SERVER_ADDR
        .get()
        .expect("server addr should be initialized")
        .as_str()
}

fn wait_for_readiness(published: Arc<OnceLock<String>>) {
    let addr = loop {
        if let Some(addr) = published.get() {
            break addr.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };
    let _ = SERVER_ADDR.set(addr.clone());

    for _ in 0..100 {
        if std::net::TcpStream::connect(&addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("server did not become ready in time");
}

pub fn http_url(path: &str) -> String {
    format!("http://{}{}", ensure_server(), path)
}

pub async fn connect() -> Ws {
    let url = format!("ws://{}/ws", ensure_server());
    let (ws, _response) = connect_async(url).await.expect("websocket connect");
    ws
}

pub async fn send(ws: &mut Ws, kind: &str, data: Value) {
    let msg = serde_json::json!({ "type": kind, "data": data });
    ws.send(Message::text(msg.to_string()))
        .await
        .expect("send message");
}

// Next JSON text message from the server.
pub async fn recv(ws: &mut Ws) -> Value {
    loop {
        let next = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for server message")
            .expect("socket closed")
            .expect("websocket error");
        if let Message::Text(text) = next {
            return serde_json::from_str(text.as_str()).expect("server sends JSON");
        }
    }
}

// Skips messages until one of type `kind` arrives.
pub async fn recv_type(ws: &mut Ws, kind: &str) -> Value {
    loop {
        let msg = recv(ws).await;
        if msg["type"] == kind {
            return msg;
        }
    }
}

// Creates a room as `name` and returns (socket, room code).
pub async fn create_room(name: &str) -> (Ws, String) {
    let mut ws = connect().await;
    send(&mut ws, "create_room", serde_json::json!({ "name": name })).await;
    let reply = recv_type(&mut ws, "room_created").await;
    let code = reply["data"]["room"]
        .as_str()
        .expect("room code")
        .to_string();
    (ws, code)
}
