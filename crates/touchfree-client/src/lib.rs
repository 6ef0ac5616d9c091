//! Client-side protocol engine for the TouchFree tracking service
//!
//! This crate speaks the TouchFree WebSocket protocol: it performs the
//! version handshake, correlates requests with their responses, turns the
//! service's input action stream into events, and keeps an analytics session
//! alive with periodic heartbeats.
//!
//! ## Layers
//!
//! ```text
//! +-----------------+
//! | TouchFreeClient |  async handle, safe to use from any task
//! +--------+--------+
//!          | commands
//! +--------v-------------+     +---------------+
//! | ConnectionController | --> | MessageRouter | --> receivers (tick)
//! +--------+-------------+     +---------------+
//!          | frames                    |
//! +--------v--------+          callback registries, deferred events
//! | Transport       |
//! +-----------------+
//! ```
//!
//! [`ConnectionController`] is synchronous and owns all engine state.
//! [`TouchFreeClient`] spawns a driver task that owns the controller and
//! runs its tick, sweep, and heartbeat timers.
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use touchfree_client::{ClientEvent, Config, TouchFreeClient};
//!
//! # async fn example() -> Result<(), touchfree_client::ClientError> {
//! let client = TouchFreeClient::spawn(Config::default())?;
//! let mut events = client.subscribe();
//! client.connect()?;
//! client.wait_until_connected(Duration::from_secs(5)).await?;
//!
//! while let Ok(event) = events.recv().await {
//!     if let ClientEvent::InputAction(action) = event {
//!         println!("{:?} at {:?}", action.input_type, action.cursor_position);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod channel;
pub mod client;
pub mod connection;
pub mod error;
pub mod events;
pub mod handshake;
pub mod plugin;
pub mod protocol;
pub mod receiver;
pub mod registry;
pub mod router;
pub mod websocket;

#[cfg(test)]
mod testing;

pub use channel::{ChannelEvent, ChannelEventSender, Frame, MessageChannel, Transport};
pub use client::{ClientEventStream, TouchFreeClient};
pub use connection::ConnectionController;
pub use error::ClientError;
pub use events::ClientEvent;
pub use plugin::{InputActionPlugin, PluginChain};
pub use registry::Callback;
pub use websocket::WebSocketTransport;

pub use touchfree_config::{AnalyticsConfig, Config, ServiceConfig, TimingConfig};
