//! Communication channel (Telegram).
//!
//! Inbound updates are long-polled and handed to the relay pipeline; outbound
//! sends go through the [`Outbound`] trait so the pipeline can be tested
//! against a mock transport.

mod inbound;
mod outbound;
mod telegram;

pub use inbound::{InboundItem, ItemKind, SenderIdentity};
pub use outbound::{MediaPart, Outbound, SendError};
pub use telegram::{
    TelegramChannel, TelegramChat, TelegramFile, TelegramMessage, TelegramPhotoSize, TelegramUpdate,
    TelegramUser,
};
