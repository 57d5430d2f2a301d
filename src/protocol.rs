//! Wire protocol for the realtime WebSocket feed.
//!
//! All frames are JSON objects discriminated on a `type` field. Client and
//! server vocabularies are separate enums so the serializer can never emit
//! an inbound-only shape.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Client → Server Messages
// ============================================================================

/// Message sent from client to server.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to updates for one order.
    SubscribeOrder { order_id: i64 },
    /// Keepalive probe; the timestamp is echoed back verbatim.
    Ping {
        #[serde(default)]
        timestamp: Value,
    },
    /// Any frame with an unrecognized `type` tag. Silently ignored.
    #[serde(other)]
    Unknown,
}

// ============================================================================
// Server → Client Messages
// ============================================================================

/// Message sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Welcome frame, sent once right after the connection is registered.
    ConnectionEstablished {
        message: String,
        user: ConnectedUser,
    },
    /// Acknowledgement of a `subscribe_order` request.
    Subscribed { order_id: i64, message: String },
    /// Reply to `ping`, echoing the caller's timestamp unchanged.
    Pong { timestamp: Value },
    /// New order notification, fanned out to admins.
    NewOrder { order: OrderCreated },
    /// Status transition, fanned out to subscribers and admins.
    OrderStatusUpdated { order: OrderStatusChanged },
}

/// Identity block inside `connection_established`.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectedUser {
    pub id: i64,
    pub username: String,
    pub role: String,
}

/// Order summary attached to a `new_order` notification.
///
/// Produced by the order-management service and relayed as-is; the gateway
/// does not interpret the status vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreated {
    pub id: i64,
    pub order_number: String,
    pub customer_id: i64,
    pub table_number: Option<String>,
    pub total_amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Order fields attached to an `order_status_updated` notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusChanged {
    pub id: i64,
    pub order_number: String,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn parses_subscribe_order() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"subscribe_order","order_id":42}"#).unwrap();
        match msg {
            ClientMessage::SubscribeOrder { order_id } => assert_eq!(order_id, 42),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn parses_ping_with_any_timestamp() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"ping","timestamp":1234}"#).unwrap();
        match msg {
            ClientMessage::Ping { timestamp } => assert_eq!(timestamp, json!(1234)),
            other => panic!("unexpected message: {:?}", other),
        }

        // Timestamp is optional; a bare ping echoes null.
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        match msg {
            ClientMessage::Ping { timestamp } => assert_eq!(timestamp, Value::Null),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn unknown_type_maps_to_unknown() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"order_pizza","extra":true}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Unknown));
    }

    #[test]
    fn pong_echoes_timestamp_exactly() {
        let out = serde_json::to_value(ServerMessage::Pong {
            timestamp: json!(1234),
        })
        .unwrap();
        assert_eq!(out, json!({"type": "pong", "timestamp": 1234}));
    }

    #[test]
    fn subscribed_ack_shape() {
        let out = serde_json::to_value(ServerMessage::Subscribed {
            order_id: 42,
            message: "Subscribed to order #42".to_string(),
        })
        .unwrap();
        assert_eq!(
            out,
            json!({
                "type": "subscribed",
                "order_id": 42,
                "message": "Subscribed to order #42"
            })
        );
    }

    #[test]
    fn connection_established_shape() {
        let out = serde_json::to_value(ServerMessage::ConnectionEstablished {
            message: "Connected as admin".to_string(),
            user: ConnectedUser {
                id: 7,
                username: "alice".to_string(),
                role: "admin".to_string(),
            },
        })
        .unwrap();
        assert_eq!(
            out,
            json!({
                "type": "connection_established",
                "message": "Connected as admin",
                "user": {"id": 7, "username": "alice", "role": "admin"}
            })
        );
    }

    #[test]
    fn new_order_shape() {
        let created_at = Utc.with_ymd_and_hms(2026, 8, 23, 12, 30, 0).unwrap();
        let out = serde_json::to_value(ServerMessage::NewOrder {
            order: OrderCreated {
                id: 1,
                order_number: "ORD-0001".to_string(),
                customer_id: 9,
                table_number: Some("12".to_string()),
                total_amount: "42.50".parse().unwrap(),
                status: "pending".to_string(),
                created_at,
            },
        })
        .unwrap();
        assert_eq!(
            out,
            json!({
                "type": "new_order",
                "order": {
                    "id": 1,
                    "order_number": "ORD-0001",
                    "customer_id": 9,
                    "table_number": "12",
                    "total_amount": "42.50",
                    "status": "pending",
                    "created_at": "2026-08-23T12:30:00Z"
                }
            })
        );
    }

    #[test]
    fn order_status_updated_shape() {
        let updated_at = Utc.with_ymd_and_hms(2026, 8, 23, 12, 31, 0).unwrap();
        let out = serde_json::to_value(ServerMessage::OrderStatusUpdated {
            order: OrderStatusChanged {
                id: 42,
                order_number: "ORD-0042".to_string(),
                status: "preparing".to_string(),
                updated_at,
            },
        })
        .unwrap();
        assert_eq!(
            out,
            json!({
                "type": "order_status_updated",
                "order": {
                    "id": 42,
                    "order_number": "ORD-0042",
                    "status": "preparing",
                    "updated_at": "2026-08-23T12:31:00Z"
                }
            })
        );
    }
}
