//! Core Module - server configuration, state and lifecycle
//!
//! - [`Config`] - server configuration
//! - [`ServerState`] - shared service references
//! - [`Server`] - HTTP server

pub mod config;
pub mod server;
pub mod state;

pub use config::Config;
pub use server::Server;
pub use state::ServerState;
