//! Notice stream
//!
//! The console frontend keeps one WebSocket open on `/api/ws` and turns each
//! message into a toast.

pub mod hub;

pub use hub::{serve_ws, WsMessage, HUB};
