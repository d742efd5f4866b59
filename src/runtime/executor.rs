//! Per-chat runtime executor

use super::traits::{SessionStore, Transport};
use crate::state_machine::{transition, ChatId, Effect, Event, Session, TransitionError};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Processes one chat's events strictly in arrival order
pub struct ChatRuntime<S, T>
where
    S: SessionStore + 'static,
    T: Transport + 'static,
{
    chat_id: ChatId,
    store: Arc<S>,
    transport: Arc<T>,
    event_rx: mpsc::Receiver<Event>,
}

impl<S, T> ChatRuntime<S, T>
where
    S: SessionStore + 'static,
    T: Transport + 'static,
{
    pub fn new(
        chat_id: ChatId,
        store: Arc<S>,
        transport: Arc<T>,
        event_rx: mpsc::Receiver<Event>,
    ) -> Self {
        Self {
            chat_id,
            store,
            transport,
            event_rx,
        }
    }

    pub async fn run(mut self) {
        tracing::debug!(chat_id = %self.chat_id, "Starting chat runtime");

        // One event at a time; the next is not received until this one settles
        while let Some(event) = self.event_rx.recv().await {
            if let Err(e) = self.process_event(event).await {
                tracing::error!(chat_id = %self.chat_id, error = %e, "Error handling event");
            }
        }

        tracing::debug!(chat_id = %self.chat_id, "Chat runtime stopped");
    }

    pub async fn process_event(&self, event: Event) -> Result<(), String> {
        let current = self.store.get(self.chat_id).await?;
        let stage = current.as_ref().map(|s| s.stage);

        let result = match transition(current.as_ref(), event) {
            Ok(r) => r,
            Err(TransitionError::MissingSession) => {
                tracing::debug!(chat_id = %self.chat_id, "Ignoring message without active session");
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(chat_id = %self.chat_id, error = %e, "Transition rejected");
                return Ok(());
            }
        };

        tracing::info!(
            chat_id = %self.chat_id,
            from = ?stage,
            to = ?result.session.as_ref().map(|s| s.stage),
            effects = result.effects.len(),
            "Transition"
        );

        for effect in result.effects {
            self.execute_effect(effect, result.session.as_ref()).await?;
        }

        Ok(())
    }

    /// Execute an effect. Delivery failures are logged and do not stop later
    /// effects, so a completed session is still removed.
    async fn execute_effect(
        &self,
        effect: Effect,
        session: Option<&Session>,
    ) -> Result<(), String> {
        match effect {
            Effect::PersistSession => match session {
                Some(session) => self.store.set(self.chat_id, session.clone()).await,
                None => {
                    tracing::warn!(chat_id = %self.chat_id, "PersistSession without a session");
                    Ok(())
                }
            },

            Effect::DeleteSession => self.store.delete(self.chat_id).await,

            Effect::SendPrompt { text, menu } => {
                if let Err(e) = self.transport.send_prompt(self.chat_id, text, &menu).await {
                    tracing::error!(chat_id = %self.chat_id, error = %e, "Failed to send prompt");
                }
                Ok(())
            }

            Effect::SendText { text } => {
                if let Err(e) = self.transport.send_text(self.chat_id, &text).await {
                    tracing::error!(chat_id = %self.chat_id, error = %e, "Failed to send text");
                }
                Ok(())
            }
        }
    }
}
