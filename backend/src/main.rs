//! Vyapar Assistant - Backend Server
//!
//! Conversational business automation for small operators: chat and voice
//! messages drive inventory, purchases, sales, CRM, invoices and service
//! jobs against a remote tabular store.

use std::{net::SocketAddr, sync::Arc};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vyapar_backend::external::{ClassifierClient, RendererClient, SpeechClient, TelegramClient};
use vyapar_backend::services::TransactionOrchestrator;
use vyapar_backend::store::{ensure_collections, SheetsClient, StoreHandle};
use vyapar_backend::{create_app, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vyapar_server=debug,vyapar_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Vyapar Assistant Server");
    tracing::info!("Environment: {}", config.environment);

    // Connect the remote store and make sure every collection exists
    let store: StoreHandle = Arc::new(SheetsClient::new(&config.store)?);
    tracing::info!("Preparing store collections...");
    ensure_collections(store.as_ref()).await?;
    tracing::info!("Store ready");

    // External collaborators
    let classifier = ClassifierClient::new(&config.classifier)?;
    let renderer = RendererClient::from_config(&config.renderer)?;
    let telegram = TelegramClient::new(&config.telegram)?;
    let speech = SpeechClient::new(&config.speech)?;

    let orchestrator = TransactionOrchestrator::new(store, classifier, renderer);

    // Create application state
    let state = AppState {
        config: Arc::new(config.clone()),
        orchestrator,
        telegram,
        speech,
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
