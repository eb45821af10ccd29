//! Item classifier: raw Telegram message -> classified inbound item.
//!
//! Pure function of the message shape. Extracts kind, album batch key,
//! payload ref, caption, sender, and origin; anything it does not recognize
//! is Unsupported and gets a user-visible rejection upstream.

use crate::channels::{InboundItem, ItemKind, SenderIdentity, TelegramMessage};

/// Bot commands handled before forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
}

/// Result of classifying one inbound Telegram message.
#[derive(Debug)]
pub enum Classified {
    /// A slash command; answered directly, never forwarded.
    Command(Command),
    /// A forwardable item (with or without a batch key).
    Item(InboundItem),
    /// Content kind the relay does not handle (stickers, documents, ...).
    Unsupported,
}

fn sender_of(msg: &TelegramMessage) -> SenderIdentity {
    match msg.from {
        Some(ref user) => {
            let display = user
                .username
                .as_ref()
                .map(|u| format!("@{}", u))
                .unwrap_or_else(|| user.first_name.clone());
            SenderIdentity {
                display,
                id: user.id,
            }
        }
        // Channel posts and the like carry no user; fall back to the chat id.
        None => SenderIdentity {
            display: "unknown".to_string(),
            id: msg.chat.id,
        },
    }
}

/// Classify one inbound message.
pub fn classify(msg: &TelegramMessage) -> Classified {
    if let Some(ref text) = msg.text {
        let trimmed = text.trim();
        match trimmed {
            "/start" => return Classified::Command(Command::Start),
            "/help" => return Classified::Command(Command::Help),
            _ => {}
        }
        return Classified::Item(InboundItem {
            kind: ItemKind::Text,
            batch_key: None,
            payload_ref: text.clone(),
            caption: None,
            sender: sender_of(msg),
            origin: msg.chat.id,
        });
    }

    let (kind, payload_ref) = if let Some(ref sizes) = msg.photo {
        // Renditions are ordered smallest to largest; forward the largest.
        match sizes.last() {
            Some(largest) => (ItemKind::Photo, largest.file_id.clone()),
            None => return Classified::Unsupported,
        }
    } else if let Some(ref video) = msg.video {
        (ItemKind::Video, video.file_id.clone())
    } else if let Some(ref voice) = msg.voice {
        (ItemKind::Voice, voice.file_id.clone())
    } else if let Some(ref note) = msg.video_note {
        (ItemKind::VideoNote, note.file_id.clone())
    } else {
        return Classified::Unsupported;
    };

    Classified::Item(InboundItem {
        kind,
        batch_key: msg.media_group_id.clone(),
        payload_ref,
        caption: msg.caption.clone(),
        sender: sender_of(msg),
        origin: msg.chat.id,
    })
}
