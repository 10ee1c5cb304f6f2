//! Vyapar Assistant - Backend library
//!
//! A conversational automation layer for small business operations:
//! inventory, purchases, sales, customers, finance and service jobs driven
//! by natural-language chat and voice messages in Hindi and English, with a
//! remote tabular store as the system of record.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;

use external::{SpeechClient, TelegramClient};
use services::TransactionOrchestrator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub orchestrator: TransactionOrchestrator,
    pub telegram: TelegramClient,
    pub speech: SpeechClient,
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Vyapar Assistant API v1.0"
}
