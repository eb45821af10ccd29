//! Forwarding pipeline: envelope + payload to the owner, acknowledgement to
//! the origin. A send failure is terminal for that item or batch (no retry)
//! and never touches state owned by other keys.

use crate::channels::{InboundItem, ItemKind, MediaPart, Outbound, SendError, SenderIdentity};
use crate::relay::batch::BatchState;
use std::sync::Arc;

const ACK_TEXT: &str = "✅ Delivered to the owner.";
const FAILURE_TEXT: &str = "⚠️ Could not deliver your message, please try again later.";

/// Relay failure taxonomy. Nothing here is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("unsupported content kind")]
    UnsupportedContentKind,
    #[error("transport send failed: {source}")]
    TransportSendFailure {
        #[source]
        source: SendError,
    },
}

impl From<SendError> for RelayError {
    fn from(source: SendError) -> Self {
        RelayError::TransportSendFailure { source }
    }
}

/// Sends finalized items and batches to the fixed owner chat.
#[derive(Clone)]
pub struct Forwarder {
    outbound: Arc<dyn Outbound>,
    admin_chat_id: i64,
}

/// Attribution line sent immediately before the forwarded payload.
fn envelope_text(sender: &SenderIdentity) -> String {
    format!("📨 Message from {} (id {})", sender.display, sender.id)
}

impl Forwarder {
    pub fn new(outbound: Arc<dyn Outbound>, admin_chat_id: i64) -> Self {
        Self {
            outbound,
            admin_chat_id,
        }
    }

    /// Forward one standalone item: envelope, payload, origin ack.
    pub async fn forward_single(&self, item: &InboundItem) -> Result<(), RelayError> {
        let result = self.send_single(item).await;
        self.settle(result, &item.sender, item.kind.name(), None, item.origin)
            .await
    }

    /// Forward one finalized batch as a single grouped send (or a single send
    /// when only one part accumulated), preserving arrival order.
    pub async fn forward_batch(&self, key: &str, state: &BatchState) -> Result<(), RelayError> {
        let result = self.send_batch(state).await;
        self.settle(result, &state.sender, "batch", Some(key), state.origin)
            .await
    }

    async fn send_single(&self, item: &InboundItem) -> Result<(), SendError> {
        self.outbound
            .send_text(self.admin_chat_id, &envelope_text(&item.sender))
            .await?;
        match item.kind {
            ItemKind::Text => {
                self.outbound
                    .send_text(self.admin_chat_id, &item.payload_ref)
                    .await
            }
            kind => {
                self.outbound
                    .send_media(
                        self.admin_chat_id,
                        kind,
                        &item.payload_ref,
                        item.caption.as_deref(),
                    )
                    .await
            }
        }
    }

    async fn send_batch(&self, state: &BatchState) -> Result<(), SendError> {
        self.outbound
            .send_text(self.admin_chat_id, &envelope_text(&state.sender))
            .await?;
        if let [only] = state.entries.as_slice() {
            return self
                .outbound
                .send_media(
                    self.admin_chat_id,
                    only.kind,
                    &only.payload_ref,
                    state.caption.as_deref(),
                )
                .await;
        }
        let parts: Vec<MediaPart> = state
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| MediaPart {
                kind: entry.kind,
                payload_ref: entry.payload_ref.clone(),
                // Telegram renders the first part's caption as the album caption.
                caption: if i == 0 { state.caption.clone() } else { None },
            })
            .collect();
        self.outbound
            .send_media_group(self.admin_chat_id, &parts)
            .await
    }

    /// Acknowledge the origin on success; log and notify the origin
    /// best-effort on failure.
    async fn settle(
        &self,
        result: Result<(), SendError>,
        sender: &SenderIdentity,
        what: &str,
        key: Option<&str>,
        origin: i64,
    ) -> Result<(), RelayError> {
        match result {
            Ok(()) => {
                if let Err(e) = self.outbound.reply(origin, ACK_TEXT).await {
                    log::debug!("acknowledging sender {} failed: {}", sender.id, e);
                }
                Ok(())
            }
            Err(e) => {
                match key {
                    Some(k) => log::warn!(
                        "forwarding {} from sender {} (key {}) failed: {}",
                        what,
                        sender.id,
                        k,
                        e
                    ),
                    None => log::warn!("forwarding {} from sender {} failed: {}", what, sender.id, e),
                }
                if let Err(notice_err) = self.outbound.reply(origin, FAILURE_TEXT).await {
                    log::debug!("failure notice to sender {} failed: {}", sender.id, notice_err);
                }
                Err(RelayError::TransportSendFailure { source: e })
            }
        }
    }
}
