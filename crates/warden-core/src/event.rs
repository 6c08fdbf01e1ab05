//! Lifecycle events — the platform client's callback notifications turned
//! into one typed queue with a single consumer.

use crate::message::PlatformMessage;

/// Events emitted by the platform client over its lifetime.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// A pairing QR payload was (re-)generated.
    Qr(String),
    /// Credentials accepted; session restore or fresh pairing succeeded.
    Authenticated,
    /// Fully connected and able to send/receive.
    Ready,
    /// Credentials rejected — the stored session is corrupt or revoked.
    AuthFailure(String),
    /// Connection lost, with the platform's reason string.
    Disconnected(String),
    /// A message appeared in the account (inbound or self-authored).
    MessageCreated(PlatformMessage),
}

/// A lifecycle event tagged with the generation of the client that emitted
/// it. Once a reconnect replaces the client, events from the previous
/// generation are stale and must be discarded.
#[derive(Debug, Clone)]
pub struct ClientEvent {
    pub generation: u64,
    pub event: LifecycleEvent,
}

impl ClientEvent {
    pub fn new(generation: u64, event: LifecycleEvent) -> Self {
        Self { generation, event }
    }
}
