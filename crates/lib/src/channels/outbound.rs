//! Outbound send primitives the relay pipeline calls on its transport.

use crate::channels::inbound::ItemKind;
use async_trait::async_trait;

/// One part of a grouped send (album), in order.
#[derive(Debug, Clone)]
pub struct MediaPart {
    pub kind: ItemKind,
    pub payload_ref: String,
    pub caption: Option<String>,
}

/// Transport send failure.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("telegram request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("telegram api error: {0}")]
    Api(String),
}

/// Handle to a channel's outbound side (send to the owner, reply to a sender).
#[async_trait]
pub trait Outbound: Send + Sync {
    /// Send a text message to a chat.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), SendError>;

    /// Re-send a single media item to a chat by its payload ref.
    async fn send_media(
        &self,
        chat_id: i64,
        kind: ItemKind,
        payload_ref: &str,
        caption: Option<&str>,
    ) -> Result<(), SendError>;

    /// Send an ordered group of media items as one album.
    async fn send_media_group(&self, chat_id: i64, parts: &[MediaPart]) -> Result<(), SendError>;

    /// Reply to the original sender's chat.
    async fn reply(&self, chat_id: i64, text: &str) -> Result<(), SendError>;
}
