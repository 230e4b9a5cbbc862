//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{GroqChatAdapter, WikipediaAdapter, WikipediaSettings},
    config::{Config, ConfigError},
    error::ApiError,
    web::{cors_layer, rest::ApiDoc, router, state::AppState},
};
use axum::{http::HeaderValue, Router};
use std::sync::Arc;
use study_helper_core::retry::RetryPolicy;
use study_helper_core::study::StudyService;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    let encyclopedia = Arc::new(WikipediaAdapter::new(WikipediaSettings {
        rest_base: config.wikipedia_rest_base.clone(),
        action_api: config.wikipedia_action_api.clone(),
        user_agent: config.user_agent.clone(),
        lookup_timeout: config.lookup_timeout,
        search_timeout: config.search_timeout,
    })?);
    let chat = Arc::new(GroqChatAdapter::new(
        config.generation_api_base.clone(),
        config.generation_model.clone(),
    ));
    if config.groq_api_key.is_none() {
        info!("GROQ_API_KEY not set; generation requires a per-session key");
    }

    // --- 3. Build the Shared AppState ---
    let study = StudyService::new(encyclopedia, chat)
        .with_retry_policy(RetryPolicy::new(config.lookup_max_attempts, config.retry_delay))
        .with_default_api_key(config.groq_api_key.clone());
    let app_state = Arc::new(AppState::new(config.clone(), study));

    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string())
    })?;

    // --- 4. Create the Web Router ---
    let app = Router::new()
        .merge(router(app_state).layer(cors_layer(origin)))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
