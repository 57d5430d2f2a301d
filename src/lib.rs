//! Realtime notification gateway for the restaurant ordering backend.
//!
//! This service:
//! - Accepts authenticated WebSocket connections from customers and admins
//! - Tracks role groups and per-order subscriptions in a fan-out registry
//! - Receives order lifecycle events from the order-management service over
//!   internal HTTP and pushes them to the right subsets of connections
//!
//! A failed delivery is logged and converted into cleanup of the dead
//! connection; it never disturbs the other recipients of a broadcast.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod registry;
pub mod router;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use protocol::{ClientMessage, ServerMessage};
pub use registry::{Client, ClientId, OrderId, Registry, Role};
pub use router::create_router;
pub use state::AppState;
