use axum::{
    debug_handler,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{ClientEvent, Coordinator};

#[debug_handler(state = crate::AppState)]
pub async fn signal_ws(
    State(coordinator): State<Coordinator>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(async move |stream| run_connection(coordinator, stream).await)
}

async fn run_connection(coordinator: Coordinator, stream: WebSocket) {
    let (outbox, mut rx) = mpsc::unbounded_channel();
    let conn = coordinator.connect(outbox).await;
    let (mut sender, mut receiver) = stream.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let frame = match event.to_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    warn!(%conn, %err, "could not encode event");
                    continue;
                }
            };
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_coordinator = coordinator.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Close(_) => break,
                Message::Ping(_) | Message::Pong(_) => continue,
                Message::Text(_) | Message::Binary(_) => {}
            }

            match ClientEvent::from_frame(&msg.into_data()) {
                Ok(event) => recv_coordinator.handle(conn, event).await,
                Err(err) => warn!(%conn, %err, "dropping malformed frame"),
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    };

    debug!(%conn, "socket closed");
    coordinator.disconnect(conn).await;
}
