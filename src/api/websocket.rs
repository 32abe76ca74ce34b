use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tracing::{debug, error, info};

use crate::api::state::AppState;

/// WebSocket handler: every connection becomes one hub subscriber
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let mut subscription = match state.hub.register().await {
        Ok(sub) => sub,
        Err(e) => {
            error!(error = %e, "WebSocket rejected: hub unavailable");
            return;
        }
    };
    let subscriber = subscription.id();
    info!(subscriber = %subscriber, "WebSocket connected");

    let (mut sender, mut receiver) = socket.split();

    // Forward hub payloads until the hub evicts us or the client goes away
    let mut send_task = tokio::spawn(async move {
        while let Some(payload) = subscription.recv().await {
            if sender.send(Message::Text(payload.to_string())).await.is_err() {
                break;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    // Client messages are only watched for close
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Close(_) => break,
                other => debug!(subscriber = %subscriber, ?other, "ignoring client message"),
            }
        }
    });

    // Whichever side ends first takes the other down; dropping the subscription unregisters it
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!(subscriber = %subscriber, "WebSocket connection closed");
}
