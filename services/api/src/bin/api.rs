//! services/api/src/bin/api.rs

use api_lib::{
    adapters::PgStore,
    config::Config,
    error::ApiError,
    web::{self, rest::ApiDoc, state::AppState},
};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use lehrjournal_core::MemoryStore;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
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

    // --- 2. Pick the Store & Run Migrations ---
    let app_state = match &config.database_url {
        Some(url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
            let store = Arc::new(PgStore::new(db_pool));
            info!("Running database migrations...");
            store.run_migrations().await?;
            info!("Database migrations complete.");
            AppState::new(store, config.clone())
        }
        None => {
            warn!("DATABASE_URL is not set; keeping all data in memory");
            AppState::new(Arc::new(MemoryStore::new()), config.clone())
        }
    };

    // --- 3. Seed the First Admin ---
    if let Some(admin) = &config.bootstrap_admin {
        match app_state
            .provisioner()
            .bootstrap_admin(&admin.email, &admin.password)
            .await?
        {
            Some(uid) => info!(%uid, "Created bootstrap admin"),
            None => info!("An admin exists; skipping bootstrap"),
        }
    }
    let app_state = Arc::new(app_state);

    // --- 4. Create the Web Router ---
    let origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let api_router = web::router(app_state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
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
