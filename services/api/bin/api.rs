//! Main Entrypoint for the HIPAA Shield Advisor API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Selecting the hosted-model client and the initial access credential.
//! 3. Constructing the Axum router and applying middleware.
//! 4. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use shield_advisor_api::{
    config::{Config, Provider},
    router::create_router,
    session::spawn_idle_sweeper,
    state::AppState,
};
use shield_advisor_core::{
    gemini::GeminiClient,
    llm_client::{Credential, LLMClient, OpenAICompatibleClient},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        return;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize the Model Client ---
    let credential = Arc::new(Credential::new(config.api_key.clone()));
    if !credential.is_selected() {
        warn!("No access credential configured; sessions will start in reconnect-required state.");
    }

    let llm_client: Arc<dyn LLMClient> = match &config.provider {
        Provider::Gemini => {
            info!("Using Gemini provider.");
            Arc::new(GeminiClient::new(
                config.api_base.clone(),
                config.chat_model.clone(),
                config.temperature,
                credential.clone(),
            ))
        }
        Provider::OpenAI => {
            info!("Using OpenAI provider.");
            Arc::new(OpenAICompatibleClient::new(
                config.api_base.clone(),
                config.chat_model.clone(),
                config.temperature,
                credential.clone(),
            ))
        }
    };

    let app_state = Arc::new(AppState::new(config.clone(), llm_client, credential));
    let sweeper = spawn_idle_sweeper(app_state.sessions.clone(), config.session_idle_ttl);

    // --- 4. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 5. Start Server ---
    info!(
        provider = ?config.provider,
        model = %config.chat_model,
        bind_address = %config.bind_address,
        session_idle_ttl_secs = config.session_idle_ttl.as_secs(),
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.abort();
    info!("Server has shut down.");
    Ok(())
}
