//! Runtime for executing chat sessions
//!
//! Every chat gets its own [`ChatRuntime`] task fed by a bounded queue, so
//! messages for one chat are handled strictly one at a time and in arrival
//! order while different chats proceed independently.

mod executor;
mod store;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::ChatRuntime;
pub use store::InMemorySessionStore;
pub use traits::*;

use crate::state_machine::{ChatId, Event};
use crate::telegram::TelegramClient;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Type alias for production runtime with concrete implementations
pub type ProductionManager = RuntimeManager<InMemorySessionStore, TelegramClient>;

const CHAT_QUEUE_CAPACITY: usize = 32;

/// Handle to interact with a running chat runtime
struct ChatHandle {
    event_tx: mpsc::Sender<Event>,
    task: JoinHandle<()>,
}

/// Outcome of one expiry pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired_sessions: Vec<ChatId>,
    pub retired_runtimes: usize,
}

/// Manager for all chat runtimes
pub struct RuntimeManager<S, T>
where
    S: SessionStore + 'static,
    T: Transport + 'static,
{
    store: Arc<S>,
    transport: Arc<T>,
    runtimes: RwLock<HashMap<ChatId, ChatHandle>>,
}

impl<S, T> RuntimeManager<S, T>
where
    S: SessionStore + 'static,
    T: Transport + 'static,
{
    pub fn new(store: Arc<S>, transport: Arc<T>) -> Self {
        Self {
            store,
            transport,
            runtimes: RwLock::new(HashMap::new()),
        }
    }

    /// Explicit start command: (re)initialize the chat's session
    pub async fn on_begin(&self, chat_id: ChatId) -> Result<(), String> {
        self.dispatch(chat_id, Event::Begin).await
    }

    /// Any other text message
    pub async fn on_message(&self, chat_id: ChatId, text: &str) -> Result<(), String> {
        self.dispatch(chat_id, Event::message(text.trim())).await
    }

    async fn dispatch(&self, chat_id: ChatId, event: Event) -> Result<(), String> {
        let event_tx = self.get_or_create(chat_id).await;
        event_tx
            .send(event)
            .await
            .map_err(|e| format!("Chat runtime for {chat_id} is gone: {e}"))
    }

    /// Get or create the runtime for a chat
    async fn get_or_create(&self, chat_id: ChatId) -> mpsc::Sender<Event> {
        // Check if already running
        {
            let runtimes = self.runtimes.read().await;
            if let Some(handle) = runtimes.get(&chat_id) {
                if !handle.event_tx.is_closed() {
                    return handle.event_tx.clone();
                }
            }
        }

        let mut runtimes = self.runtimes.write().await;
        // Another dispatcher may have won the race for the write lock
        if let Some(handle) = runtimes.get(&chat_id) {
            if !handle.event_tx.is_closed() {
                return handle.event_tx.clone();
            }
        }

        let (event_tx, event_rx) = mpsc::channel(CHAT_QUEUE_CAPACITY);
        let runtime = ChatRuntime::new(
            chat_id,
            self.store.clone(),
            self.transport.clone(),
            event_rx,
        );
        let task = tokio::spawn(runtime.run());

        tracing::debug!(chat_id = %chat_id, "Spawned chat runtime");
        runtimes.insert(
            chat_id,
            ChatHandle {
                event_tx: event_tx.clone(),
                task,
            },
        );
        event_tx
    }

    /// Number of live chat runtimes
    pub async fn runtime_count(&self) -> usize {
        self.runtimes.read().await.len()
    }

    /// Stop the runtimes of chats that have no session.
    ///
    /// The write lock is held until each retired runtime has drained its
    /// queue, so a new runtime for the same chat can never overlap an old one.
    pub async fn retire_idle_runtimes(&self) -> Result<usize, String> {
        let mut runtimes = self.runtimes.write().await;

        let chat_ids: Vec<ChatId> = runtimes.keys().copied().collect();
        let mut idle = Vec::new();
        for chat_id in chat_ids {
            if self.store.get(chat_id).await?.is_none() {
                idle.push(chat_id);
            }
        }

        for chat_id in &idle {
            if let Some(ChatHandle { event_tx, task }) = runtimes.remove(chat_id) {
                drop(event_tx);
                if let Err(e) = task.await {
                    tracing::error!(chat_id = %chat_id, error = %e, "Chat runtime task failed");
                }
            }
        }

        Ok(idle.len())
    }

    /// Drop sessions idle for longer than `ttl`, then retire unused runtimes
    pub async fn sweep(&self, ttl: Duration) -> Result<SweepReport, String> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| e.to_string())?;
        let expired_sessions = self.store.expire_idle(Utc::now() - ttl).await?;
        for chat_id in &expired_sessions {
            tracing::info!(chat_id = %chat_id, "Expired idle session");
        }

        let retired_runtimes = self.retire_idle_runtimes().await?;

        Ok(SweepReport {
            expired_sessions,
            retired_runtimes,
        })
    }

    /// Run [`Self::sweep`] every `interval` until `cancel` fires
    pub fn start_sweeper(
        self: &Arc<Self>,
        ttl: Duration,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        match manager.sweep(ttl).await {
                            Ok(report) => tracing::debug!(
                                expired = report.expired_sessions.len(),
                                retired = report.retired_runtimes,
                                "Session sweep finished"
                            ),
                            Err(e) => tracing::error!(error = %e, "Session sweep failed"),
                        }
                    }
                }
            }

            tracing::info!("Session sweeper stopped");
        })
    }
}
