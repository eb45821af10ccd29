//! Relay pipeline: classify inbound messages, forward standalone items
//! immediately, and accumulate album parts until their delayed flush.
//!
//! Per batch key the lifecycle is: absent -> accumulating (first item creates
//! state and arms one timer) -> flushing (timer fires, state taken) -> absent.
//! A late item for an already-flushed key simply starts a new cycle.

mod batch;
mod classify;
mod flush;
mod forward;

pub use batch::{BatchBuffer, BatchEntry, BatchState};
pub use classify::{classify, Classified, Command};
pub use flush::FlushScheduler;
pub use forward::{Forwarder, RelayError};

use crate::channels::{InboundItem, Outbound, TelegramChannel, TelegramMessage};
use crate::config::{self, Config};
use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

const GREETING_TEXT: &str = "👋 Hi! Send me a message and I'll forward it to the owner.";
const UNSUPPORTED_TEXT: &str =
    "❌ This content type is not supported. Send text, photos, videos, voice messages, or video notes.";

/// The relay pipeline: batch buffer, flush scheduler, and forwarder around
/// one outbound transport.
pub struct Relay {
    outbound: Arc<dyn Outbound>,
    buffer: BatchBuffer,
    scheduler: FlushScheduler,
    forwarder: Forwarder,
    flush_delay: Duration,
    /// Spawned network sends (fast path, replies); awaited by drain().
    forwards: Arc<RwLock<Vec<JoinHandle<()>>>>,
}

impl Relay {
    pub fn new(outbound: Arc<dyn Outbound>, admin_chat_id: i64, flush_delay: Duration) -> Self {
        Self {
            forwarder: Forwarder::new(outbound.clone(), admin_chat_id),
            outbound,
            buffer: BatchBuffer::new(),
            scheduler: FlushScheduler::new(),
            flush_delay,
            forwards: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Handle one inbound message. Classification and batch appends complete
    /// before this returns, so calling it in stream order appends album parts
    /// in stream order; the network sends are spawned and never block the
    /// caller's receive loop. Failures are logged and answered to the sender;
    /// nothing here is fatal.
    pub async fn handle_message(&self, msg: TelegramMessage) {
        let chat_id = msg.chat.id;
        match classify(&msg) {
            Classified::Command(Command::Start) | Classified::Command(Command::Help) => {
                let outbound = self.outbound.clone();
                self.spawn_send(async move {
                    if let Err(e) = outbound.reply(chat_id, GREETING_TEXT).await {
                        log::debug!("greeting reply to chat {} failed: {}", chat_id, e);
                    }
                })
                .await;
            }
            Classified::Unsupported => {
                log::info!("rejecting message in chat {}: {}", chat_id, RelayError::UnsupportedContentKind);
                let outbound = self.outbound.clone();
                self.spawn_send(async move {
                    if let Err(e) = outbound.reply(chat_id, UNSUPPORTED_TEXT).await {
                        log::debug!("rejection notice to chat {} failed: {}", chat_id, e);
                    }
                })
                .await;
            }
            Classified::Item(item) => match item.batch_key.clone() {
                Some(key) => self.accumulate(key, item).await,
                None => {
                    // Fast path: no batch key, forward immediately.
                    let forwarder = self.forwarder.clone();
                    self.spawn_send(async move {
                        let _ = forwarder.forward_single(&item).await;
                    })
                    .await;
                }
            },
        }
    }

    /// Spawn a network send off the receive loop, keeping the handle so
    /// drain() can await it. Finished handles are pruned on each spawn.
    async fn spawn_send<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.forwards.write().await;
        tasks.retain(|h| !h.is_finished());
        tasks.push(tokio::spawn(fut));
    }

    /// Append an album part to its batch and arm the flush timer on first use.
    async fn accumulate(&self, key: String, item: InboundItem) {
        let entry = BatchEntry {
            kind: item.kind,
            payload_ref: item.payload_ref,
        };
        let is_first = self
            .buffer
            .append_or_create(&key, entry, item.sender, item.origin, item.caption)
            .await;
        if !is_first {
            return;
        }
        log::debug!("batch {} accumulating, flush in {:?}", key, self.flush_delay);
        let buffer = self.buffer.clone();
        let forwarder = self.forwarder.clone();
        let flush_key = key.clone();
        self.scheduler
            .arm_once(&key, self.flush_delay, async move {
                let Some(state) = buffer.take_and_clear(&flush_key).await else {
                    log::debug!("batch {} already taken at flush time", flush_key);
                    return;
                };
                let _ = forwarder.forward_batch(&flush_key, &state).await;
            })
            .await;
    }

    /// Await all outstanding flush timers and spawned sends (shutdown).
    pub async fn drain(&self) {
        self.scheduler.drain().await;
        let handles: Vec<JoinHandle<()>> = self.forwards.write().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                log::debug!("forward task ended abnormally: {}", e);
            }
        }
    }
}

/// Run the relay against the real Telegram channel; blocks until shutdown
/// (Ctrl+C), then drains in-flight batches before returning.
/// `admin_override` (e.g. a CLI flag) outranks env and config.
pub async fn run(config: Config, admin_override: Option<i64>) -> Result<()> {
    let token = config::resolve_telegram_token(&config)
        .context("telegram bot token not configured (set channels.telegram.botToken or TELEGRAM_BOT_TOKEN)")?;
    let admin_chat_id = config::resolve_admin_chat_id(&config, admin_override)
        .context("owner chat id not configured (set relay.adminChatId or COURIER_ADMIN_CHAT_ID)")?;

    let telegram = Arc::new(TelegramChannel::new(Some(token)));
    let (inbound_tx, mut inbound_rx) = mpsc::channel::<TelegramMessage>(64);
    let poll_handle = telegram.clone().start_inbound(inbound_tx);

    let relay = Arc::new(Relay::new(
        telegram.clone(),
        admin_chat_id,
        Duration::from_secs(config.relay.flush_delay_secs),
    ));
    log::info!("relay started; forwarding to chat {}", admin_chat_id);

    loop {
        tokio::select! {
            maybe = inbound_rx.recv() => match maybe {
                Some(msg) => {
                    // Classification and batch appends run inline so album
                    // parts reach the buffer in stream order; the network
                    // sends are spawned off this loop inside handle_message.
                    relay.handle_message(msg).await;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                log::info!("shutdown signal received, draining in-flight batches");
                break;
            }
        }
    }

    telegram.stop();
    relay.drain().await;
    let _ = poll_handle.await;
    log::info!("relay stopped");
    Ok(())
}
