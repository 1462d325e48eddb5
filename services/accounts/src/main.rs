use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use accounts::{
    AppState, Settings, StoreBackend, create_router,
    store::{MemoryPlayerStore, PgPlayerStore, PlayerStore, postgres::run_migrations},
};
use common::database::{DatabaseConfig, health_check, init_pool};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting account service");

    let settings = Settings::from_env()?;
    let listener = TcpListener::bind(&settings.bind_address).await?;

    match settings.store {
        StoreBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = init_pool(&db_config).await?;

            if health_check(&pool).await? {
                info!("Database connection successful");
            } else {
                anyhow::bail!("Failed to connect to database");
            }

            run_migrations(&pool).await?;

            let state = AppState::new(PgPlayerStore::new(pool), &settings);
            serve(listener, state).await
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory player store; accounts are lost on restart");

            let state = AppState::new(MemoryPlayerStore::new(), &settings);
            serve(listener, state).await
        }
    }
}

async fn serve<S: PlayerStore>(listener: TcpListener, state: AppState<S>) -> Result<()> {
    info!(
        "Account service listening on {} (store: {}, max devices: {})",
        listener.local_addr()?,
        state.store.backend(),
        state.policy.max_devices
    );

    let app = create_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Account service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
