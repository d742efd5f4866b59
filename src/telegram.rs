//! Telegram Bot API adapter
//!
//! Outbound messages go through [`TelegramClient`], which implements
//! [`Transport`](crate::runtime::Transport). Inbound updates arrive either by
//! long polling ([`polling`]) or through the webhook endpoint in `api`, and
//! both paths feed [`dispatch_update`].

mod client;
pub mod polling;
pub mod types;

pub use client::{TelegramClient, TelegramError};
pub use types::Update;

use crate::runtime::{RuntimeManager, SessionStore, Transport};
use crate::state_machine::ChatId;

const START_COMMAND: &str = "/start";

/// What an inbound update means to the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Begin(ChatId),
    Message { chat_id: ChatId, text: String },
    Ignore,
}

/// `/start`, optionally addressed as `/start@botname`, as the first token
fn is_start_command(text: &str) -> bool {
    text.split_whitespace().next().is_some_and(|token| {
        token == START_COMMAND
            || token
                .strip_prefix(START_COMMAND)
                .is_some_and(|rest| rest.starts_with('@'))
    })
}

pub fn route_update(update: &Update) -> Inbound {
    let Some(message) = &update.message else {
        return Inbound::Ignore;
    };
    let Some(text) = message.text.as_deref() else {
        return Inbound::Ignore;
    };

    let chat_id = ChatId(message.chat.id);
    let text = text.trim();
    if is_start_command(text) {
        Inbound::Begin(chat_id)
    } else if text.is_empty() {
        Inbound::Ignore
    } else {
        Inbound::Message {
            chat_id,
            text: text.to_string(),
        }
    }
}

/// Route one update into the runtime manager
pub async fn dispatch_update<S, T>(manager: &RuntimeManager<S, T>, update: &Update)
where
    S: SessionStore + 'static,
    T: Transport + 'static,
{
    let result = match route_update(update) {
        Inbound::Begin(chat_id) => manager.on_begin(chat_id).await,
        Inbound::Message { chat_id, text } => manager.on_message(chat_id, &text).await,
        Inbound::Ignore => {
            tracing::debug!(update_id = update.update_id, "Ignoring update without text");
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::error!(
            update_id = update.update_id,
            message_id = update.message.as_ref().map(|m| m.message_id),
            error = %e,
            "Failed to dispatch update"
        );
    }
}
