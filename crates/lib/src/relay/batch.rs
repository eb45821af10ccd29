//! Batch buffer: in-flight album state keyed by batch key.
//!
//! The only shared mutable state in the relay. All mutation goes through this
//! store; once `take_and_clear` removes a state, nothing else can touch that
//! instance, so the forwarding side never races with further appends.

use crate::channels::{ItemKind, SenderIdentity};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One payload entry of an accumulating batch, in arrival order.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub kind: ItemKind,
    pub payload_ref: String,
}

/// Accumulated state for one batch key.
#[derive(Debug, Clone)]
pub struct BatchState {
    /// Entries in arrival order.
    pub entries: Vec<BatchEntry>,
    /// Sender of the first item seen for this key.
    pub sender: SenderIdentity,
    /// Origin chat of the first item seen for this key.
    pub origin: i64,
    /// Most recently seen non-empty caption (last write wins).
    pub caption: Option<String>,
}

/// In-memory store for in-flight batches (append-or-create, atomic take).
#[derive(Clone)]
pub struct BatchBuffer {
    inner: Arc<RwLock<HashMap<String, BatchState>>>,
}

impl Default for BatchBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchBuffer {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Append an entry to the key's state, creating it on first use.
    /// Returns true when this call created the state (the caller then arms a
    /// flush timer). Sender and origin stick to the first item's values; a
    /// non-empty caption overwrites any earlier one.
    pub async fn append_or_create(
        &self,
        key: &str,
        entry: BatchEntry,
        sender: SenderIdentity,
        origin: i64,
        caption: Option<String>,
    ) -> bool {
        let mut g = self.inner.write().await;
        match g.get_mut(key) {
            Some(state) => {
                state.entries.push(entry);
                if caption.as_deref().is_some_and(|c| !c.is_empty()) {
                    state.caption = caption;
                }
                false
            }
            None => {
                let caption = caption.filter(|c| !c.is_empty());
                g.insert(
                    key.to_string(),
                    BatchState {
                        entries: vec![entry],
                        sender,
                        origin,
                        caption,
                    },
                );
                true
            }
        }
    }

    /// Atomically remove and return the key's state. None when the key is
    /// absent (already taken or never existed) — a no-op for callers.
    pub async fn take_and_clear(&self, key: &str) -> Option<BatchState> {
        self.inner.write().await.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> SenderIdentity {
        SenderIdentity {
            display: "@ada".to_string(),
            id: 1,
        }
    }

    fn entry(payload: &str) -> BatchEntry {
        BatchEntry {
            kind: ItemKind::Photo,
            payload_ref: payload.to_string(),
        }
    }

    #[tokio::test]
    async fn first_append_creates_later_ones_do_not() {
        let buffer = BatchBuffer::new();
        assert!(buffer.append_or_create("g1", entry("a"), sender(), 10, None).await);
        assert!(!buffer.append_or_create("g1", entry("b"), sender(), 10, None).await);
        assert!(buffer.append_or_create("g2", entry("c"), sender(), 10, None).await);
    }

    #[tokio::test]
    async fn take_preserves_arrival_order() {
        let buffer = BatchBuffer::new();
        for p in ["a", "b", "c"] {
            buffer.append_or_create("g1", entry(p), sender(), 10, None).await;
        }
        let state = buffer.take_and_clear("g1").await.expect("state");
        let refs: Vec<&str> = state.entries.iter().map(|e| e.payload_ref.as_str()).collect();
        assert_eq!(refs, vec!["a", "b", "c"]);
        assert_eq!(state.origin, 10);
    }

    #[tokio::test]
    async fn take_on_absent_key_is_a_no_op() {
        let buffer = BatchBuffer::new();
        assert!(buffer.take_and_clear("missing").await.is_none());
        buffer.append_or_create("g1", entry("a"), sender(), 10, None).await;
        assert!(buffer.take_and_clear("g1").await.is_some());
        assert!(buffer.take_and_clear("g1").await.is_none());
    }

    #[tokio::test]
    async fn last_non_empty_caption_wins() {
        let buffer = BatchBuffer::new();
        buffer
            .append_or_create("g1", entry("a"), sender(), 10, Some("first".to_string()))
            .await;
        buffer
            .append_or_create("g1", entry("b"), sender(), 10, Some(String::new()))
            .await;
        buffer
            .append_or_create("g1", entry("c"), sender(), 10, Some("last".to_string()))
            .await;
        buffer.append_or_create("g1", entry("d"), sender(), 10, None).await;
        let state = buffer.take_and_clear("g1").await.expect("state");
        assert_eq!(state.caption.as_deref(), Some("last"));
    }

    #[tokio::test]
    async fn sender_and_origin_stick_to_first_item() {
        let buffer = BatchBuffer::new();
        buffer.append_or_create("g1", entry("a"), sender(), 10, None).await;
        let other = SenderIdentity {
            display: "@bob".to_string(),
            id: 2,
        };
        buffer.append_or_create("g1", entry("b"), other, 20, None).await;
        let state = buffer.take_and_clear("g1").await.expect("state");
        assert_eq!(state.sender.id, 1);
        assert_eq!(state.origin, 10);
    }
}
