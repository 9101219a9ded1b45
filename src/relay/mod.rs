use crate::config::Config;
use crate::game::types::PlayerId;
use crate::protocol::encode_identity;
use axum::{
    extract::ws::{Message, WebSocket},
    extract::{State, WebSocketUpgrade},
    http::Method,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, Serialize)]
struct OkResponse {
    ok: bool,
}

/// Fans every text frame out to all other connected clients.
///
/// The relay never looks inside payloads; it only hands out identities.
#[derive(Debug, Default)]
pub struct Relay {
    sessions: DashMap<PlayerId, UnboundedSender<String>>,
    current_id: AtomicU64,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next id, tells the connection about it, then starts
    /// delivering broadcasts to it.
    pub fn register(&self, sender: UnboundedSender<String>) -> PlayerId {
        let id = self.current_id.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = sender.send(encode_identity(id));
        self.sessions.insert(id, sender);
        tracing::info!(id, sessions = self.session_count(), "client connected");
        id
    }

    pub fn broadcast(&self, from: PlayerId, message: &str) {
        for entry in self.sessions.iter() {
            if *entry.key() == from {
                continue;
            }
            let _ = entry.value().send(message.to_owned());
        }
    }

    pub fn remove(&self, id: PlayerId) {
        self.sessions.remove(&id);
        tracing::info!(id, sessions = self.session_count(), "client disconnected");
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

pub async fn run_relay_mode(config: &Config) -> anyhow::Result<()> {
    let relay = Arc::new(Relay::new());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);
    let app: Router = Router::new()
        .route("/api/health", get(health))
        .route("/ws/", get(ws_handler))
        .layer(cors)
        .with_state(relay);

    let address = format!("0.0.0.0:{}", config.port);
    tracing::info!("relay listening on {address}");
    let listener = tokio::net::TcpListener::bind(&address).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn ws_handler(ws: WebSocketUpgrade, State(relay): State<Arc<Relay>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, relay))
}

async fn handle_socket(socket: WebSocket, relay: Arc<Relay>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let id = relay.register(tx);

    let send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = receiver.next().await {
        let Ok(message) = result else { break };
        match message {
            Message::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    relay.broadcast(id, text);
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    relay.remove(id);
    send_task.abort();
}

async fn health() -> impl IntoResponse {
    Json(OkResponse { ok: true })
}
