//! Factory console - admin console gateway for a garment factory backend
//!
//! This crate serves the console front end, keeps the operator session and
//! factory selection, builds the department tree with its drag-and-drop
//! reassignment rules, and forwards everything else to the backend API.

pub mod api;
pub mod assign;
pub mod config;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod store;
pub mod tree;
pub mod ws;

// Re-export commonly used types
pub use config::Config;
pub use state::AppState;
