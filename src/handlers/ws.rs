use crate::auth::{Claims, verify_token};
use crate::protocol::{ClientMessage, ConnectedUser, ServerMessage};
use crate::registry::{Client, Role};
use crate::state::AppState;
use axum::{
    extract::{
        Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    token: String,
}

/// WebSocket upgrade endpoint: `GET /ws?token=<jwt>`.
///
/// The token is checked before the registry is ever involved; a bad token
/// still upgrades, then closes immediately with a policy-violation frame so
/// browser clients see a reason instead of a failed handshake.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
) -> Response {
    match verify_token(&params.token, &state.config.jwt_secret) {
        Ok(claims) => ws.on_upgrade(move |socket| handle_socket(socket, state, claims)),
        Err(e) => {
            tracing::info!("Rejected WebSocket handshake: {}", e);
            ws.on_upgrade(reject_socket)
        }
    }
}

async fn reject_socket(mut socket: WebSocket) {
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: close_code::POLICY,
            reason: "Invalid authentication token".into(),
        })))
        .await;
}

async fn handle_socket(socket: WebSocket, state: AppState, claims: Claims) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let client = Arc::new(Client::new(Role::parse(&claims.role), tx));
    let client_id = client.id;

    // Writer task drains the outbound queue, so a broadcast pass never
    // waits on this socket's backpressure.
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_tx.send(msg).await.is_err() {
                break;
            }
        }
    });

    state.registry.connect(client.clone());

    state.registry.send_personal(
        &ServerMessage::ConnectionEstablished {
            message: format!("Connected as {}", client.role),
            user: ConnectedUser {
                id: claims.user_id,
                username: claims.username.clone(),
                role: claims.role.clone(),
            },
        },
        &client,
    );

    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Text(text)) => handle_client_message(&state, &client, &text),
            Ok(Message::Close(_)) => break,
            // Ping/pong frames are answered by the transport layer.
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("WebSocket error for user {}: {}", claims.username, e);
                break;
            }
        }
    }

    state.registry.disconnect(&client_id);
    send_task.abort();

    tracing::info!("User {} ({}) disconnected", claims.username, client.role);
}

fn handle_client_message(state: &AppState, client: &Arc<Client>, text: &str) {
    let parsed: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::debug!("Ignoring malformed message from {}: {}", client.id, e);
            return;
        }
    };

    match parsed {
        ClientMessage::SubscribeOrder { order_id } => {
            state.registry.subscribe_to_order(order_id, client);
            state.registry.send_personal(
                &ServerMessage::Subscribed {
                    order_id,
                    message: format!("Subscribed to order #{}", order_id),
                },
                client,
            );
        }
        ClientMessage::Ping { timestamp } => {
            state
                .registry
                .send_personal(&ServerMessage::Pong { timestamp }, client);
        }
        ClientMessage::Unknown => {}
    }
}
