//! Long-polling delivery loop

use super::{dispatch_update, TelegramClient, TelegramError, Update};
use crate::runtime::{RuntimeManager, SessionStore, Transport};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Source of inbound updates
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TelegramError>;
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TelegramError> {
        TelegramClient::get_updates(self, offset).await
    }
}

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}

/// Poll until `cancel` fires, dispatching every update in order
pub async fn run_polling<U, S, T>(
    source: Arc<U>,
    manager: Arc<RuntimeManager<S, T>>,
    cancel: CancellationToken,
) where
    U: UpdateSource + ?Sized,
    S: SessionStore + 'static,
    T: Transport + 'static,
{
    tracing::info!("Polling for updates");

    let mut offset: Option<i64> = None;
    let mut backoff = INITIAL_BACKOFF;

    loop {
        let result = tokio::select! {
            () = cancel.cancelled() => break,
            result = source.get_updates(offset) => result,
        };

        match result {
            Ok(updates) => {
                backoff = INITIAL_BACKOFF;
                for update in updates {
                    offset = Some(update.update_id + 1);
                    dispatch_update(manager.as_ref(), &update).await;
                }
            }
            Err(e) => {
                let delay = e.retry_after().map_or(backoff, |after| after.max(backoff));
                tracing::warn!(error = %e, delay_secs = delay.as_secs(), "getUpdates failed");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(delay) => {}
                }
                backoff = next_backoff(backoff);
            }
        }
    }

    tracing::info!("Polling stopped");
}
