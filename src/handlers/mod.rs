//! Request handlers module

pub mod auth;
pub mod config;
pub mod department;
pub mod factory;
pub mod personnel;
pub mod proxy;
