use std::{net::SocketAddr, time::Duration};

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use futures_util::{SinkExt, StreamExt};
use huddle::{AppState, app, rooms::Coordinator};
use serde_json::{Value, json};
use tokio::{net::TcpStream, time::timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

fn router(coordinator: &Coordinator) -> axum::Router {
    let state = AppState {
        coordinator: coordinator.clone(),
    };
    app(state, CorsLayer::permissive())
}

async fn serve(coordinator: &Coordinator) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(coordinator);
    tokio::spawn(async move { axum::serve(listener, app).await });
    addr
}

async fn open(addr: SocketAddr) -> Socket {
    let (socket, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    socket
}

/// Next data frame as JSON, skipping control frames.
async fn recv(socket: &mut Socket) -> Value {
    loop {
        let msg = timeout(WAIT, socket.next())
            .await
            .expect("frame before timeout")
            .expect("socket still open")
            .unwrap();
        if msg.is_text() || msg.is_binary() {
            return serde_json::from_slice(&msg.into_data()).unwrap();
        }
    }
}

async fn send(socket: &mut Socket, value: Value) {
    socket.send(Message::text(value.to_string())).await.unwrap();
}

async fn wait_for_connections(coordinator: &Coordinator, expected: usize) {
    timeout(WAIT, async {
        while coordinator.stats().await.connections != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("connection count settles");
}

#[tokio::test]
async fn banner() {
    let coordinator = Coordinator::new();
    let response = router(&coordinator)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"Hello from Video Conference Demo App");
}

#[tokio::test]
async fn socket_survives_bad_frames_and_relays_chat() {
    let coordinator = Coordinator::new();
    let addr = serve(&coordinator).await;

    let mut a = open(addr).await;
    assert_eq!(recv(&mut a).await, json!({"event": "initial-messages", "data": []}));

    a.send(Message::text("not json")).await.unwrap();
    a.send(Message::binary(b"\xff".to_vec())).await.unwrap();
    send(&mut a, json!({"event": "join-room", "data": {"roomId": "r1"}})).await;
    send(&mut a, json!({"event": "send-message", "data": {"author": "A", "text": "hi"}})).await;

    let hi = json!({"event": "new-message", "data": {"id": 1, "author": "A", "text": "hi"}});
    assert_eq!(recv(&mut a).await, hi);
    assert!(coordinator.roster("r1").await.is_empty());

    let mut b = open(addr).await;
    assert_eq!(
        recv(&mut b).await,
        json!({"event": "initial-messages", "data": [{"id": 1, "author": "A", "text": "hi"}]})
    );

    send(&mut b, json!({"event": "join-room", "data": {"roomId": "r1", "peerId": "pB"}})).await;
    let all_users = recv(&mut b).await;
    assert_eq!(all_users["event"], "all-users");
    assert_eq!(all_users["data"][0]["peerId"], "pB");

    a.close(None).await.unwrap();
    wait_for_connections(&coordinator, 1).await;
    assert_eq!(coordinator.history().await.len(), 1);

    // a dropped TCP stream counts as a disconnect too
    drop(b);
    wait_for_connections(&coordinator, 0).await;
    assert!(coordinator.roster("r1").await.is_empty());
}
