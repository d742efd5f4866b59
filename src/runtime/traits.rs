//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::state_machine::{ChatId, Session};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Storage for in-flight sessions, keyed by conversation
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Get the session for a conversation, if one is active
    async fn get(&self, chat_id: ChatId) -> Result<Option<Session>, String>;

    /// Insert or replace the session, refreshing its activity timestamp
    async fn set(&self, chat_id: ChatId, session: Session) -> Result<(), String>;

    /// Remove the session; removing an absent session is not an error
    async fn delete(&self, chat_id: ChatId) -> Result<(), String>;

    /// Remove every session last touched before `cutoff`, returning their ids
    async fn expire_idle(&self, cutoff: DateTime<Utc>) -> Result<Vec<ChatId>, String>;
}

/// Failure to deliver an outbound message
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outbound side of the messaging transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// Ask a question; `menu` labels are rendered as quick replies
    async fn send_prompt(
        &self,
        chat_id: ChatId,
        text: &str,
        menu: &[&str],
    ) -> Result<(), TransportError>;

    /// Plain text with no menu
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), TransportError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn get(&self, chat_id: ChatId) -> Result<Option<Session>, String> {
        (**self).get(chat_id).await
    }

    async fn set(&self, chat_id: ChatId, session: Session) -> Result<(), String> {
        (**self).set(chat_id, session).await
    }

    async fn delete(&self, chat_id: ChatId) -> Result<(), String> {
        (**self).delete(chat_id).await
    }

    async fn expire_idle(&self, cutoff: DateTime<Utc>) -> Result<Vec<ChatId>, String> {
        (**self).expire_idle(cutoff).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send_prompt(
        &self,
        chat_id: ChatId,
        text: &str,
        menu: &[&str],
    ) -> Result<(), TransportError> {
        (**self).send_prompt(chat_id, text, menu).await
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), TransportError> {
        (**self).send_text(chat_id, text).await
    }
}
