//! Flush scheduler: one-shot delayed flush per batch key.
//!
//! At most one timer is outstanding per key; arming an already-armed key is a
//! no-op, so re-arrivals ride the existing timer. A fired timer forgets its
//! key *before* running the flush action: an append landing after that point
//! either still makes it into the take (and is flushed with the batch) or
//! finds the buffer empty and starts a fresh cycle with a fresh timer.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Per-key one-shot timers, held as awaitable task handles.
#[derive(Clone)]
pub struct FlushScheduler {
    timers: Arc<RwLock<HashMap<String, JoinHandle<()>>>>,
}

impl Default for FlushScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FlushScheduler {
    pub fn new() -> Self {
        Self {
            timers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Arm a one-shot timer for the key unless one is already outstanding.
    /// Returns true when a timer was armed by this call.
    pub async fn arm_once<F>(&self, key: &str, delay: Duration, on_fire: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut timers = self.timers.write().await;
        if timers.contains_key(key) {
            return false;
        }
        let owned_key = key.to_string();
        let timer_map = self.timers.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Forget the key before flushing so a late append re-arms cleanly.
            timer_map.write().await.remove(&owned_key);
            on_fire.await;
        });
        timers.insert(key.to_string(), handle);
        true
    }

    /// Await every outstanding flush. Used on shutdown so in-flight batches
    /// are delivered instead of abandoned.
    pub async fn drain(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut timers = self.timers.write().await;
            timers.drain().map(|(_, h)| h).collect()
        };
        for handle in handles {
            if let Err(e) = handle.await {
                log::debug!("flush task ended abnormally: {}", e);
            }
        }
    }
}
