//! chat-server
//!
//! Multi-client async TCP server for presence and chat relay.

pub mod config;
pub mod types;
pub mod server;
pub mod auth;

// these are internal modules, not re-exported
mod client;
mod hub_task;
