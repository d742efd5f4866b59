//! HTTP request handlers

use super::types::{ErrorResponse, HealthResponse, WebhookResponse};
use super::AppState;
use crate::runtime::{SessionStore, Transport};
use crate::telegram::{dispatch_update, Update};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Create the API router
pub fn create_router<S, T>(state: AppState<S, T>) -> Router
where
    S: SessionStore + 'static,
    T: Transport + 'static,
{
    Router::new()
        .route("/telegram/webhook", post(telegram_webhook::<S, T>))
        .route("/health", get(health::<S, T>))
        .with_state(state)
}

// ============================================================
// Webhook
// ============================================================

async fn telegram_webhook<S, T>(
    State(state): State<AppState<S, T>>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> Result<Json<WebhookResponse>, AppError>
where
    S: SessionStore + 'static,
    T: Transport + 'static,
{
    if let Some(expected) = state.webhook_secret.as_deref() {
        let provided = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if provided != Some(expected) {
            tracing::warn!(update_id = update.update_id, "Rejected webhook call with bad secret");
            return Err(AppError::Unauthorized("Invalid secret token".to_string()));
        }
    }

    // Only enqueues; replies are sent by the chat runtime
    dispatch_update(state.runtime.as_ref(), &update).await;
    Ok(Json(WebhookResponse { ok: true }))
}

// ============================================================
// Health
// ============================================================

async fn health<S, T>(State(state): State<AppState<S, T>>) -> Json<HealthResponse>
where
    S: SessionStore + 'static,
    T: Transport + 'static,
{
    Json(HealthResponse {
        status: "ok",
        active_chats: state.runtime.runtime_count().await,
    })
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    Unauthorized(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
