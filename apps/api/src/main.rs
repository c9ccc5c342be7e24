use std::error::Error;

use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use reviewer_api::api::{build_router, AppState};
use reviewer_api::config::{Config, StoreBackend};
use reviewer_api::infrastructure::memory::InMemoryStore;
use reviewer_api::infrastructure::repositories::run_migrations;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let state = match config.store_backend {
        StoreBackend::Postgres => {
            if config.database_url_defaulted {
                tracing::warn!("DATABASE_URL not set, using default");
            }

            // Connect to database
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .acquire_timeout(config.db_acquire_timeout)
                .connect(&config.database_url)
                .await?;

            run_migrations(&pool).await?;
            tracing::info!("Database connected and migrated");

            AppState::postgres(pool, config.rng_seed)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, state is lost on exit");
            AppState::in_memory(InMemoryStore::new(), config.rng_seed)
        }
    };

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
