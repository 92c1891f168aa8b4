use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{sink::SinkExt, stream::StreamExt};
use log::{error, info, warn};
use tokio::sync::{mpsc, Mutex, RwLock};
use uuid::Uuid;
use wheel_shared::prize::{decrement_by_name, Prize};
use wheel_shared::rate_limit::RateLimitType;
use wheel_shared::validation::validate_prize_list;
use wheel_shared::{RelayMessage, WheelError};

pub const MAX_MESSAGE_BYTES: usize = 64 * 1024;

struct ClientHandle {
    tx: mpsc::UnboundedSender<String>,
    message_count: u32,
    window_start: Instant,
}

/// Prize list plus every connected display and admin page.
///
/// Locks are always taken prizes first, then clients, so broadcasts leave in
/// the order the list changed.
pub struct RelayState {
    prizes: RwLock<Vec<Prize>>,
    clients: Mutex<HashMap<Uuid, ClientHandle>>,
}

impl RelayState {
    pub fn new(prizes: Vec<Prize>) -> Self {
        Self {
            prizes: RwLock::new(prizes),
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub async fn prizes(&self) -> Vec<Prize> {
        self.prizes.read().await.clone()
    }

    pub async fn client_count(&self) -> usize {
        self.clients.lock().await.len()
    }

    /// Adds a client and sends it the current prize list.
    pub async fn register(&self, tx: mpsc::UnboundedSender<String>) -> Uuid {
        let id = Uuid::new_v4();
        let prizes = self.prizes.read().await;

        if let Ok(json) = serde_json::to_string(&RelayMessage::PrizesUpdate { prizes: prizes.clone() }) {
            if tx.send(json).is_err() {
                warn!("Client {} went away before the initial prize list", id);
            }
        }

        let mut clients = self.clients.lock().await;
        clients.insert(
            id,
            ClientHandle {
                tx,
                message_count: 0,
                window_start: Instant::now(),
            },
        );
        info!("Client {} connected ({} total)", id, clients.len());
        id
    }

    pub async fn unregister(&self, id: Uuid) {
        let mut clients = self.clients.lock().await;
        if clients.remove(&id).is_some() {
            info!("Client {} disconnected ({} left)", id, clients.len());
        }
    }

    async fn is_rate_limited(&self, id: Uuid, now: Instant) -> bool {
        let limit = RateLimitType::RelayMessages;
        let max_messages = limit.get_max_attempts();

        let mut clients = self.clients.lock().await;
        let Some(client) = clients.get_mut(&id) else {
            warn!("Rate limit check for unknown client {}", id);
            return true;
        };

        if now.saturating_duration_since(client.window_start) >= limit.get_window() {
            client.message_count = 1;
            client.window_start = now;
            return false;
        }

        client.message_count += 1;
        if client.message_count > max_messages {
            warn!(
                "Rate limit exceeded for client {}: {} messages this second (limit: {})",
                id, client.message_count, max_messages
            );
            // Bursts are tolerated up to twice the limit.
            return client.message_count > max_messages * 2;
        }
        false
    }

    pub async fn handle_text(&self, from: Uuid, text: &str) {
        self.handle_text_at(from, text, Instant::now()).await
    }

    async fn handle_text_at(&self, from: Uuid, text: &str, now: Instant) {
        if text.len() > MAX_MESSAGE_BYTES {
            warn!("Dropping {} byte message from client {}", text.len(), from);
            return;
        }
        if self.is_rate_limited(from, now).await {
            return;
        }

        let message = match serde_json::from_str::<RelayMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                warn!("Invalid message from client {}: {}", from, e);
                return;
            }
        };

        match message {
            RelayMessage::UpdatePrizes { prizes } => {
                if let Err(e) = self.replace_prizes(prizes).await {
                    warn!("Rejected prize update from client {}: {}", from, e);
                }
            }
            RelayMessage::SpinWheel => {
                info!("Spin requested by client {}", from);
                self.broadcast(&RelayMessage::SpinWheel, Some(from)).await;
            }
            RelayMessage::DecrementPrize { prize_name } => {
                self.decrement(&prize_name).await;
            }
            RelayMessage::PrizesUpdate { .. } => {
                warn!("Unexpected prizes_update from client {}", from);
            }
        }
    }

    /// Validates and installs a new prize list, then pushes it to everyone.
    pub async fn replace_prizes(&self, prizes: Vec<Prize>) -> Result<Vec<Prize>, WheelError> {
        validate_prize_list(&prizes)?;

        let mut current = self.prizes.write().await;
        *current = prizes;
        info!("Prize list replaced ({} prizes)", current.len());
        self.broadcast(&RelayMessage::PrizesUpdate { prizes: current.clone() }, None)
            .await;
        Ok(current.clone())
    }

    pub async fn decrement(&self, prize_name: &str) {
        let mut prizes = self.prizes.write().await;
        if !decrement_by_name(&mut prizes, prize_name) {
            warn!("Decrement requested for unknown prize {:?}", prize_name);
            return;
        }
        info!("Decremented {:?}", prize_name);
        self.broadcast(&RelayMessage::PrizesUpdate { prizes: prizes.clone() }, None)
            .await;
    }

    /// Sends `message` to every client but `except`. Clients whose channel
    /// is closed are dropped.
    pub async fn broadcast(&self, message: &RelayMessage, except: Option<Uuid>) {
        let json = match serde_json::to_string(message) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize relay message: {}", e);
                return;
            }
        };

        let mut clients = self.clients.lock().await;
        clients.retain(|id, client| {
            if Some(*id) == except {
                return true;
            }
            if client.tx.send(json.clone()).is_err() {
                warn!("Dropping client {}: channel closed", id);
                return false;
            }
            true
        });
    }
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<RelayState>>) -> impl IntoResponse {
    ws.max_message_size(MAX_MESSAGE_BYTES)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<RelayState>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let client_id = state.register(tx).await;

    // Forward messages to WebSocket
    let forward = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = sender.send(Message::Text(msg)).await {
                error!("WebSocket send error: {:?} - Connection will be closed", e);
                break;
            }
        }
        if let Err(e) = sender.close().await {
            warn!("Failed to close WebSocket connection gracefully: {:?}", e);
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => state.handle_text(client_id, &text).await,
            Ok(Message::Close(_)) => break,
            Ok(Message::Binary(_)) => warn!("Ignoring binary message from client {}", client_id),
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket receive error for client {}: {}", client_id, e);
                break;
            }
        }
    }

    // Dropping the handle closes the channel, which ends the forwarding task.
    state.unregister(client_id).await;
    if let Err(e) = forward.await {
        error!("Forwarding task for client {} panicked: {}", client_id, e);
    }
}
