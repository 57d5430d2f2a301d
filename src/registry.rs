//! Event fan-out registry for realtime order notifications.
//!
//! Tracks every live WebSocket session, its role group, and its per-order
//! subscriptions, and pushes event messages to the right subsets. A failed
//! delivery never aborts a broadcast pass; the dead client is removed from
//! all registry state after the pass completes.

use crate::protocol::ServerMessage;
use axum::extract::ws::{Message, Utf8Bytes};
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

pub type ClientId = Uuid;
pub type OrderId = i64;

/// Role classification for a connected client.
///
/// Unknown tags are kept as-is and get their own group bucket rather than
/// failing the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Customer,
    Other(String),
}

impl Role {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "admin" => Role::Admin,
            "customer" => Role::Customer,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Customer => "customer",
            Role::Other(tag) => tag,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The client's outbound channel closed; its writer task is gone.
#[derive(Debug, Error)]
#[error("client channel closed")]
pub struct SendFailure;

/// One live client session.
///
/// The socket task owns the receiving half of `tx` and drains it into the
/// WebSocket, so pushing a frame here never waits on the network.
pub struct Client {
    pub id: ClientId,
    pub role: Role,
    tx: mpsc::UnboundedSender<Message>,
}

impl Client {
    pub fn new(role: Role, tx: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            id: Uuid::now_v7(),
            role,
            tx,
        }
    }

    /// Serialize and queue a message for this client.
    pub fn send(&self, msg: &ServerMessage) -> Result<(), SendFailure> {
        let json = serde_json::to_string(msg).map_err(|e| {
            tracing::warn!("Failed to serialize outbound message: {}", e);
            SendFailure
        })?;
        self.send_frame(Message::Text(json.into()))
    }

    fn send_frame(&self, frame: Message) -> Result<(), SendFailure> {
        self.tx.send(frame).map_err(|_| SendFailure)
    }
}

/// Registry of connected clients, role groups, and order subscriptions.
///
/// Constructed once at startup and shared through `AppState`; every map is
/// a concurrent container, so connection tasks and event handlers can call
/// in from anywhere without an outer lock. Broadcast passes snapshot the
/// target membership first, so a disconnect racing a pass cannot invalidate
/// the iteration.
pub struct Registry {
    /// Every connected client. This table is the `all` group.
    clients: DashMap<ClientId, Arc<Client>>,
    /// Role tag → members of that group.
    roles: DashMap<Role, DashMap<ClientId, Arc<Client>>>,
    /// Order id → clients interested in that order's updates. Entries are
    /// created on first subscribe and dropped when the last member leaves.
    order_subscriptions: DashMap<OrderId, DashMap<ClientId, Arc<Client>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
            roles: DashMap::new(),
            order_subscriptions: DashMap::new(),
        }
    }

    /// Register an authenticated client in its role group and the `all`
    /// group.
    pub fn connect(&self, client: Arc<Client>) {
        self.roles
            .entry(client.role.clone())
            .or_default()
            .insert(client.id, client.clone());
        self.clients.insert(client.id, client.clone());
        tracing::info!(
            "New {} connection {}. Total: {}",
            client.role,
            client.id,
            self.clients.len()
        );
    }

    /// Remove a client from every group and every subscription set.
    ///
    /// Idempotent: disconnecting an absent client is a no-op.
    pub fn disconnect(&self, client_id: &ClientId) {
        let removed = self.clients.remove(client_id);

        for bucket in self.roles.iter() {
            bucket.value().remove(client_id);
        }
        self.roles.retain(|_, members| !members.is_empty());

        // Scrub order subscriptions; an emptied set is deleted outright.
        self.order_subscriptions.retain(|_, subscribers| {
            subscribers.remove(client_id);
            !subscribers.is_empty()
        });

        if let Some((_, client)) = removed {
            tracing::info!(
                "{} connection {} removed. Remaining: {}",
                client.role,
                client.id,
                self.clients.len()
            );
        }
    }

    /// Register interest in one order's updates.
    ///
    /// Deliberately decoupled from `connect`: the subscription only needs a
    /// live outbound channel, not prior group membership. Re-subscribing is
    /// a no-op beyond set membership.
    pub fn subscribe_to_order(&self, order_id: OrderId, client: &Arc<Client>) {
        self.order_subscriptions
            .entry(order_id)
            .or_default()
            .insert(client.id, client.clone());
        tracing::debug!("Client {} subscribed to order {}", client.id, order_id);
    }

    /// Deliver a message to exactly one client.
    ///
    /// A failure is logged and absorbed; unlike the broadcast paths it does
    /// not remove the client, since the socket task tears itself down when
    /// its channel peer goes away.
    pub fn send_personal(&self, message: &ServerMessage, client: &Client) {
        if client.send(message).is_err() {
            tracing::warn!("Error sending personal message to {}", client.id);
        }
    }

    /// Deliver a message to every member of one role group.
    pub fn broadcast_to_role(&self, message: &ServerMessage, role: &Role) {
        let recipients = self
            .roles
            .get(role)
            .map(|bucket| snapshot(&bucket))
            .unwrap_or_default();
        self.deliver(recipients, message, role.as_str());
    }

    /// Deliver an order update to its subscribers, then to every admin.
    ///
    /// An admin who is also subscribed receives the message twice; the
    /// console treats notifications as idempotent, so no deduplication.
    pub fn broadcast_order_update(&self, order_id: OrderId, message: &ServerMessage) {
        let subscribers = self
            .order_subscriptions
            .get(&order_id)
            .map(|set| snapshot(&set))
            .unwrap_or_default();
        self.deliver(subscribers, message, "order subscribers");

        self.broadcast_to_role(message, &Role::Admin);
    }

    /// Notify every admin of a newly created order.
    pub fn broadcast_new_order(&self, message: &ServerMessage) {
        self.broadcast_to_role(message, &Role::Admin);
    }

    /// Deliver a message to every connected client.
    pub fn broadcast_to_all(&self, message: &ServerMessage) {
        let recipients = snapshot(&self.clients);
        self.deliver(recipients, message, "all");
    }

    /// Number of connected clients.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Number of orders with at least one subscriber.
    pub fn subscription_count(&self) -> usize {
        self.order_subscriptions.len()
    }

    /// Send one pre-serialized message to each recipient, then remove every
    /// recipient whose channel was gone. Failures never interrupt the pass,
    /// and cleanup is always full removal (all groups plus subscriptions).
    fn deliver(&self, recipients: Vec<Arc<Client>>, message: &ServerMessage, target: &str) {
        if recipients.is_empty() {
            return;
        }

        let json = match serde_json::to_string(message) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize broadcast message: {}", e);
                return;
            }
        };
        let payload = Utf8Bytes::from(json);

        let mut failed = Vec::new();
        for client in recipients {
            if client.send_frame(Message::Text(payload.clone())).is_err() {
                tracing::warn!("Error broadcasting to {}: client {} is gone", target, client.id);
                failed.push(client.id);
            }
        }

        for client_id in failed {
            self.disconnect(&client_id);
        }
    }

    #[cfg(test)]
    fn in_role(&self, role: &Role, client_id: &ClientId) -> bool {
        self.roles
            .get(role)
            .is_some_and(|bucket| bucket.contains_key(client_id))
    }

    #[cfg(test)]
    fn is_connected(&self, client_id: &ClientId) -> bool {
        self.clients.contains_key(client_id)
    }

    #[cfg(test)]
    fn is_subscribed(&self, order_id: OrderId, client_id: &ClientId) -> bool {
        self.order_subscriptions
            .get(&order_id)
            .is_some_and(|set| set.contains_key(client_id))
    }

    #[cfg(test)]
    fn has_subscription_entry(&self, order_id: OrderId) -> bool {
        self.order_subscriptions.contains_key(&order_id)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

fn snapshot(members: &DashMap<ClientId, Arc<Client>>) -> Vec<Arc<Client>> {
    members.iter().map(|entry| entry.value().clone()).collect()
}
