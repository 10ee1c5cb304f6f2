//! Route definitions for the Vyapar Assistant

use axum::{routing::get, routing::post, Router};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Messaging webhook (authenticated by secret token header)
        .route("/webhook/telegram", post(handlers::handle_telegram_webhook))
}
