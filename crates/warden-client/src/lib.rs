//! # warden-client
//!
//! Adapter between the core's `PlatformClient` seam and the external,
//! browser-session-backed client library. The library runs as a Node
//! sidecar; this crate owns the sidecar's lifetime and speaks
//! line-delimited JSON over its stdio.

mod bridge;
mod chrome;
mod protocol;


pub use bridge::{BridgeClient, BridgeFactory};
pub use chrome::discover_chrome;
