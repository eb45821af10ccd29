//! Inbound item from a channel: one message unit handed to the relay pipeline.

/// What kind of content an inbound item carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Text,
    Photo,
    Video,
    Voice,
    VideoNote,
}

impl ItemKind {
    /// Human-readable name for logs and notices.
    pub fn name(&self) -> &'static str {
        match self {
            ItemKind::Text => "text",
            ItemKind::Photo => "photo",
            ItemKind::Video => "video",
            ItemKind::Voice => "voice",
            ItemKind::VideoNote => "video note",
        }
    }
}

/// Who sent an item: display name plus the stable numeric Telegram id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderIdentity {
    pub display: String,
    pub id: i64,
}

/// One classified message unit. Immutable; owned by whichever pipeline stage
/// currently processes it.
#[derive(Debug, Clone)]
pub struct InboundItem {
    pub kind: ItemKind,
    /// Present iff the item is part of a multi-part album (Telegram media_group_id).
    pub batch_key: Option<String>,
    /// Content handle the transport can re-send: the text body for text items,
    /// a Telegram file_id otherwise.
    pub payload_ref: String,
    pub caption: Option<String>,
    pub sender: SenderIdentity,
    /// Chat id used to reply to the original sender.
    pub origin: i64,
}
