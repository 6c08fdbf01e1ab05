use crate::{
    error::WardenError,
    event::ClientEvent,
    message::{Chat, PlatformMessage},
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// The platform client seam — the imperative surface the core needs from
/// the external, browser-session-backed client library.
///
/// Implementations own the wire protocol; the core never sees it. All
/// methods are fallible: the client may drop at any moment.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Begin the session bootstrap. Lifecycle progress arrives as events.
    async fn initialize(&self) -> Result<(), WardenError>;

    /// Tear the client down. Idempotent — safe on an already-dead handle.
    async fn destroy(&self) -> Result<(), WardenError>;

    /// Fetch chat metadata, including the participant list for groups.
    async fn get_chat(&self, chat_id: &str) -> Result<Chat, WardenError>;

    /// Resolve the message a given message quotes, if any.
    async fn get_quoted_message(
        &self,
        message_id: &str,
    ) -> Result<Option<PlatformMessage>, WardenError>;

    /// Profile photo URL for a contact, `None` when the contact has none.
    async fn profile_photo_url(&self, contact_id: &str) -> Result<Option<String>, WardenError>;

    /// Download media the platform addresses by URL.
    async fn fetch_media(&self, url: &str) -> Result<Vec<u8>, WardenError>;

    /// Send a message into a chat, mentioning the given participant IDs.
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        mentions: &[String],
    ) -> Result<(), WardenError>;

    /// Reply to a specific message.
    async fn reply(&self, message: &PlatformMessage, text: &str) -> Result<(), WardenError>;

    /// Reply with media bytes and a caption.
    async fn reply_media(
        &self,
        message: &PlatformMessage,
        media: &[u8],
        caption: &str,
    ) -> Result<(), WardenError>;
}

/// Builds platform clients. The lifecycle controller creates one client per
/// generation; each client reports events tagged with that generation.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn create(
        &self,
        generation: u64,
        events: mpsc::Sender<ClientEvent>,
    ) -> Result<Arc<dyn PlatformClient>, WardenError>;
}
