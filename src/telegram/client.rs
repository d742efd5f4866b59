//! Telegram Bot API client

use super::types::{
    ApiResponse, DeleteWebhookRequest, GetUpdatesRequest, Message, ReplyKeyboardMarkup,
    SendMessageRequest, SetWebhookRequest, Update,
};
use crate::runtime::{Transport, TransportError};
use crate::state_machine::ChatId;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Headroom on top of the long-poll timeout before the HTTP request gives up
const REQUEST_SLACK: Duration = Duration::from_secs(10);

const ALLOWED_UPDATES: &[&str] = &["message"];

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Request failed: {0}")]
    Http(String),

    #[error("Telegram API error {code}: {description}")]
    Api {
        code: i32,
        description: String,
        retry_after: Option<Duration>,
    },

    #[error("Failed to decode response (HTTP {status}): {message}")]
    Decode { status: u16, message: String },
}

impl TelegramError {
    /// Server-requested delay before the next call, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            TelegramError::Api { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    // reqwest errors carry the request URL, which embeds the bot token
    fn http(e: reqwest::Error) -> Self {
        let e = e.without_url();
        if e.is_timeout() {
            TelegramError::Http(format!("timeout: {e}"))
        } else if e.is_connect() {
            TelegramError::Http(format!("connection failed: {e}"))
        } else {
            TelegramError::Http(e.to_string())
        }
    }
}

impl From<TelegramError> for TransportError {
    fn from(e: TelegramError) -> Self {
        TransportError::new(e.to_string())
    }
}

/// Thin Bot API client; one instance is shared by every chat runtime
pub struct TelegramClient {
    client: Client,
    base_url: String,
    poll_timeout: Duration,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str, poll_timeout: Duration) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(poll_timeout + REQUEST_SLACK)
            .build()
            .map_err(TelegramError::http)?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{token}", api_url.trim_end_matches('/')),
            poll_timeout,
        })
    }

    async fn call<B, R>(&self, method: &str, body: &B) -> Result<R, TelegramError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(TelegramError::http)?;

        let status = response.status();
        let body = response.text().await.map_err(TelegramError::http)?;

        // Error responses use the same envelope, so decode before checking status
        let envelope: ApiResponse<R> =
            serde_json::from_str(&body).map_err(|e| TelegramError::Decode {
                status: status.as_u16(),
                message: e.to_string(),
            })?;

        if !envelope.ok {
            return Err(TelegramError::Api {
                code: envelope.error_code.unwrap_or_else(|| i32::from(status.as_u16())),
                description: envelope.description.unwrap_or_default(),
                retry_after: envelope
                    .parameters
                    .and_then(|p| p.retry_after)
                    .map(Duration::from_secs),
            });
        }

        envelope.result.ok_or_else(|| TelegramError::Decode {
            status: status.as_u16(),
            message: format!("{method} returned ok without a result"),
        })
    }

    pub async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_markup: Option<ReplyKeyboardMarkup>,
    ) -> Result<(), TelegramError> {
        let request = SendMessageRequest {
            chat_id: chat_id.0,
            text,
            reply_markup,
        };
        let _sent: Message = self.call("sendMessage", &request).await?;
        Ok(())
    }

    /// Long-poll for updates newer than `offset`
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TelegramError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: self.poll_timeout.as_secs(),
            allowed_updates: ALLOWED_UPDATES.to_vec(),
        };
        self.call("getUpdates", &request).await
    }

    pub async fn set_webhook(&self, url: &str, secret: Option<&str>) -> Result<(), TelegramError> {
        let request = SetWebhookRequest {
            url,
            secret_token: secret,
            allowed_updates: ALLOWED_UPDATES.to_vec(),
        };
        let _: bool = self.call("setWebhook", &request).await?;
        tracing::info!(url = %url, "Registered Telegram webhook");
        Ok(())
    }

    /// Required before long polling; Telegram rejects `getUpdates` while a webhook is set
    pub async fn delete_webhook(&self) -> Result<(), TelegramError> {
        let request = DeleteWebhookRequest {
            drop_pending_updates: false,
        };
        let _: bool = self.call("deleteWebhook", &request).await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send_prompt(
        &self,
        chat_id: ChatId,
        text: &str,
        menu: &[&str],
    ) -> Result<(), TransportError> {
        self.send_message(chat_id, text, ReplyKeyboardMarkup::for_menu(menu))
            .await
            .map_err(TransportError::from)
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), TransportError> {
        self.send_message(chat_id, text, None)
            .await
            .map_err(TransportError::from)
    }
}
