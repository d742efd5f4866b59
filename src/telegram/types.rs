//! Telegram Bot API wire types
//!
//! Only the fields the bot reads or writes are modelled; unknown fields are
//! ignored on decode.

use serde::{Deserialize, Serialize};

/// Envelope around every Bot API response
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i32>,
    pub parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseParameters {
    /// Seconds to wait before retrying after a flood-control error
    pub retry_after: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

/// Custom keyboard shown in place of the text input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub one_time_keyboard: bool,
}

impl ReplyKeyboardMarkup {
    /// Lay out menu labels as keyboard rows; `None` for an empty menu.
    ///
    /// Two options get a row each, three share a single row, longer menus
    /// are split into rows of two.
    pub fn for_menu(menu: &[&str]) -> Option<Self> {
        let per_row = match menu.len() {
            0 => return None,
            1 | 2 => 1,
            3 => 3,
            _ => 2,
        };
        let keyboard = menu
            .chunks(per_row)
            .map(|row| {
                row.iter()
                    .map(|label| KeyboardButton {
                        text: (*label).to_string(),
                    })
                    .collect()
            })
            .collect();
        Some(Self {
            keyboard,
            one_time_keyboard: true,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
pub struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct SetWebhookRequest<'a> {
    pub url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_token: Option<&'a str>,
    pub allowed_updates: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct DeleteWebhookRequest {
    pub drop_pending_updates: bool,
}
