//! HTTP surface for webhook delivery

mod handlers;
mod types;

pub use handlers::create_router;

use crate::runtime::{RuntimeManager, SessionStore, Transport};
use std::sync::Arc;

/// Application state shared across handlers
pub struct AppState<S, T>
where
    S: SessionStore + 'static,
    T: Transport + 'static,
{
    pub runtime: Arc<RuntimeManager<S, T>>,
    /// Expected `X-Telegram-Bot-Api-Secret-Token`; unchecked when `None`
    pub webhook_secret: Option<Arc<str>>,
}

impl<S, T> AppState<S, T>
where
    S: SessionStore + 'static,
    T: Transport + 'static,
{
    pub fn new(runtime: Arc<RuntimeManager<S, T>>, webhook_secret: Option<&str>) -> Self {
        Self {
            runtime,
            webhook_secret: webhook_secret.map(Arc::from),
        }
    }
}

// Derive would demand `S: Clone + T: Clone`
impl<S, T> Clone for AppState<S, T>
where
    S: SessionStore + 'static,
    T: Transport + 'static,
{
    fn clone(&self) -> Self {
        Self {
            runtime: self.runtime.clone(),
            webhook_secret: self.webhook_secret.clone(),
        }
    }
}
