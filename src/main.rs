//! Nutribot - conversational calorie, water and step calculator
//!
//! A Telegram bot that walks each chat through a short questionnaire and
//! replies with daily norms, or serves a recipe for a chosen meal.

mod api;
mod config;
mod norms;
mod prompts;
mod recipes;
mod runtime;
mod state_machine;
mod telegram;

use api::{create_router, AppState};
use config::{BotConfig, DeliveryMode};
use runtime::{InMemorySessionStore, ProductionManager};
use std::net::SocketAddr;
use std::sync::Arc;
use telegram::{polling::run_polling, TelegramClient};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nutribot=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = BotConfig::from_env()?;

    let client = Arc::new(TelegramClient::new(
        &config.api_url,
        &config.token,
        config.poll_timeout,
    )?);
    let store = Arc::new(InMemorySessionStore::new());
    let manager: Arc<ProductionManager> = Arc::new(ProductionManager::new(store, client.clone()));

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                return;
            }
            tracing::info!("Shutdown requested");
            cancel.cancel();
        }
    });

    let sweeper = match config.session_ttl {
        Some(ttl) => {
            tracing::info!(
                ttl_secs = ttl.as_secs(),
                interval_secs = config.sweep_interval.as_secs(),
                "Session expiry enabled"
            );
            Some(manager.start_sweeper(ttl, config.sweep_interval, cancel.clone()))
        }
        None => None,
    };

    match config.mode {
        DeliveryMode::Polling => {
            client.delete_webhook().await?;
            run_polling(client, manager, cancel.clone()).await;
        }
        DeliveryMode::Webhook => {
            match config.webhook_url.as_deref() {
                Some(url) => {
                    client
                        .set_webhook(url, config.webhook_secret.as_deref())
                        .await?;
                }
                None => tracing::warn!(
                    "NUTRIBOT_WEBHOOK_URL not set; expecting the webhook to be registered already"
                ),
            }

            let state = AppState::new(manager, config.webhook_secret.as_deref());
            let app = create_router(state).layer(TraceLayer::new_for_http());

            let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
            tracing::info!("Nutribot webhook server listening on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            let shutdown = cancel.clone();
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await?;
        }
    }

    cancel.cancel();
    if let Some(sweeper) = sweeper {
        sweeper.await?;
    }

    Ok(())
}
