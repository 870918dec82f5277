//! Settlers host: keeps games in a store and serves them over a JSON-lines
//! protocol.
//!
//! # Modules
//!
//! - [`config`]: Environment configuration
//! - [`store`]: Game sessions and the storage seam
//! - [`host`]: Game creation, views, action submission
//! - [`protocol`]: Client and server messages
//! - [`server`]: Request loop and dispatch

pub mod config;
pub mod host;
pub mod protocol;
pub mod server;
pub mod store;

pub use config::HostConfig;
pub use host::{GameHost, GameSummary, HostError, HostView, PublishedOptions};
pub use protocol::{ClientMessage, ServerMessage};
pub use store::{GameSession, GameStore, InMemoryGameStore};
