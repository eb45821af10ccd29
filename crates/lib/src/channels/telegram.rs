//! Telegram channel: long-poll getUpdates and the send* Bot API calls.

use crate::channels::inbound::ItemKind;
use crate::channels::outbound::{MediaPart, Outbound, SendError};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const LONG_POLL_TIMEOUT: u64 = 30;
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct GetUpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<TelegramUpdate>,
}

/// Telegram update payload (getUpdates result item).
#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

/// Incoming Telegram message with the fields the relay cares about.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TelegramMessage {
    #[serde(default)]
    pub chat: TelegramChat,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    /// Set by Telegram on every part of one album.
    #[serde(default)]
    pub media_group_id: Option<String>,
    /// Photo renditions, smallest to largest.
    #[serde(default)]
    pub photo: Option<Vec<TelegramPhotoSize>>,
    #[serde(default)]
    pub video: Option<TelegramFile>,
    #[serde(default)]
    pub voice: Option<TelegramFile>,
    #[serde(default)]
    pub video_note: Option<TelegramFile>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TelegramChat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramPhotoSize {
    pub file_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramFile {
    pub file_id: String,
}

/// Telegram channel connector: long-polls for updates and sends via the Bot API.
pub struct TelegramChannel {
    token: Option<String>,
    running: AtomicBool,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token,
            running: AtomicBool::new(false),
            client: reqwest::Client::new(),
        }
    }

    fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the long-poll loop after the current poll returns.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn method_url(&self, method: &str) -> Result<String, SendError> {
        let token = self
            .token
            .as_ref()
            .ok_or_else(|| SendError::Api("telegram bot token not configured".to_string()))?;
        Ok(format!("{}/bot{}/{}", TELEGRAM_API_BASE, token, method))
    }

    /// Start the getUpdates long-poll loop and forward messages to the relay.
    /// Returns a handle to await on shutdown.
    pub fn start_inbound(
        self: Arc<Self>,
        inbound_tx: mpsc::Sender<TelegramMessage>,
    ) -> JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);
        log::info!("telegram channel: starting getUpdates long-poll loop");
        tokio::spawn(async move {
            run_get_updates_loop(self, inbound_tx).await;
        })
    }

    /// Call Telegram getUpdates (long poll). Returns (updates, next_offset).
    async fn get_updates(
        &self,
        offset: Option<i64>,
    ) -> Result<(Vec<TelegramUpdate>, Option<i64>), SendError> {
        let url = format!(
            "{}?timeout={}",
            self.method_url("getUpdates")?,
            LONG_POLL_TIMEOUT
        );
        let url = if let Some(off) = offset {
            format!("{}&offset={}", url, off)
        } else {
            url
        };
        let res = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(LONG_POLL_TIMEOUT + 10))
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(SendError::Api(format!("getUpdates failed: {} {}", status, body)));
        }
        let data: GetUpdatesResponse = res.json().await?;
        if !data.ok {
            return Err(SendError::Api("getUpdates returned ok: false".to_string()));
        }
        let next_offset = data
            .result
            .iter()
            .map(|u| u.update_id)
            .max()
            .map(|id| id + 1);
        Ok((data.result, next_offset))
    }

    /// POST a Bot API method with a JSON body; checks HTTP status.
    async fn post_method(&self, method: &str, body: serde_json::Value) -> Result<(), SendError> {
        let url = self.method_url(method)?;
        let res = self
            .client
            .post(&url)
            .timeout(SEND_TIMEOUT)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(SendError::Api(format!("{} failed: {} {}", method, status, body)));
        }
        Ok(())
    }
}

/// Bot API method and payload field for a single media send.
fn media_method(kind: ItemKind) -> Option<(&'static str, &'static str)> {
    match kind {
        ItemKind::Photo => Some(("sendPhoto", "photo")),
        ItemKind::Video => Some(("sendVideo", "video")),
        ItemKind::Voice => Some(("sendVoice", "voice")),
        ItemKind::VideoNote => Some(("sendVideoNote", "video_note")),
        ItemKind::Text => None,
    }
}

/// InputMedia type tag for one album part. Only photos and videos can share an album.
fn album_part_type(kind: ItemKind) -> Result<&'static str, SendError> {
    match kind {
        ItemKind::Photo => Ok("photo"),
        ItemKind::Video => Ok("video"),
        other => Err(SendError::Api(format!(
            "{} cannot be part of a media group",
            other.name()
        ))),
    }
}

#[async_trait]
impl Outbound for TelegramChannel {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), SendError> {
        let body = serde_json::json!({ "chat_id": chat_id, "text": text });
        self.post_method("sendMessage", body).await
    }

    async fn send_media(
        &self,
        chat_id: i64,
        kind: ItemKind,
        payload_ref: &str,
        caption: Option<&str>,
    ) -> Result<(), SendError> {
        let Some((method, field)) = media_method(kind) else {
            return self.send_text(chat_id, payload_ref).await;
        };
        let mut body = serde_json::json!({ "chat_id": chat_id, field: payload_ref });
        // sendVideoNote takes no caption parameter.
        if kind != ItemKind::VideoNote {
            if let Some(c) = caption {
                body["caption"] = serde_json::Value::String(c.to_string());
            }
        }
        self.post_method(method, body).await
    }

    async fn send_media_group(&self, chat_id: i64, parts: &[MediaPart]) -> Result<(), SendError> {
        let mut media = Vec::with_capacity(parts.len());
        for part in parts {
            let mut entry = serde_json::json!({
                "type": album_part_type(part.kind)?,
                "media": part.payload_ref,
            });
            if let Some(ref c) = part.caption {
                entry["caption"] = serde_json::Value::String(c.clone());
            }
            media.push(entry);
        }
        let body = serde_json::json!({ "chat_id": chat_id, "media": media });
        self.post_method("sendMediaGroup", body).await
    }

    async fn reply(&self, chat_id: i64, text: &str) -> Result<(), SendError> {
        self.send_text(chat_id, text).await
    }
}

async fn run_get_updates_loop(
    channel: Arc<TelegramChannel>,
    inbound_tx: mpsc::Sender<TelegramMessage>,
) {
    let mut offset: Option<i64> = None;
    while channel.running() {
        match channel.get_updates(offset).await {
            Ok((updates, next)) => {
                offset = next;
                for u in updates {
                    if let Some(msg) = u.message {
                        if inbound_tx.send(msg).await.is_err() {
                            log::debug!("telegram: inbound channel closed, stopping loop");
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                log::debug!("telegram getUpdates error: {}", e);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
    log::info!("telegram channel: getUpdates loop stopped");
}
