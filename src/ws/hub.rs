//! WebSocket Hub implementation
//!
//! Tracks connected consoles and forwards notices to them

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::state::{AppState, Notice};

/// Global WebSocket hub instance
pub static HUB: std::sync::LazyLock<Hub> = std::sync::LazyLock::new(Hub::new);

/// WebSocket message types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    #[serde(rename = "notice")]
    Notice(serde_json::Value),
    /// The backend dropped the session; the console should go to the login page
    #[serde(rename = "sessionExpired")]
    SessionExpired,
    #[serde(rename = "ping")]
    Ping,
    #[serde(rename = "pong")]
    Pong,
}

impl From<Notice> for WsMessage {
    fn from(notice: Notice) -> Self {
        WsMessage::Notice(serde_json::to_value(notice).unwrap_or_default())
    }
}

/// WebSocket Hub
pub struct Hub {
    /// Connected clients by connection id
    clients: DashMap<Uuid, mpsc::UnboundedSender<WsMessage>>,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
        }
    }

    /// Register a new client
    pub fn register(&self, id: Uuid, tx: mpsc::UnboundedSender<WsMessage>) {
        self.clients.insert(id, tx);
        tracing::debug!("WebSocket client {} registered", id);
    }

    /// Unregister a client
    pub fn unregister(&self, id: Uuid) {
        self.clients.remove(&id);
        tracing::debug!("WebSocket client {} unregistered", id);
    }

    /// Send a message to every connected client, dropping dead ones
    pub fn broadcast(&self, msg: WsMessage) {
        self.clients.retain(|_, tx| tx.send(msg.clone()).is_ok());
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

/// WebSocket upgrade handler
pub async fn serve_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
    let id = Uuid::new_v4();

    HUB.register(id, tx.clone());

    let mut notice_rx = state.subscribe();

    let send_task = tokio::spawn(async move {
        loop {
            let message = tokio::select! {
                Some(msg) = rx.recv() => msg,
                received = notice_rx.recv() => match received {
                    Ok(notice) => WsMessage::from(notice),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("WebSocket client {} lagged, {} notices skipped", id, skipped);
                        continue;
                    }
                    Err(_) => break,
                },
                else => break,
            };
            let text = serde_json::to_string(&message).unwrap_or_default();
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    if let Ok(WsMessage::Ping) = serde_json::from_str::<WsMessage>(&text) {
                        let _ = tx.send(WsMessage::Pong);
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
    }

    HUB.unregister(id);
}
