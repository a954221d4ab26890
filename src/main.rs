use std::sync::Arc;

use identity_service::{
    build_router,
    config::AuthConfig,
    db::MongoDb,
    observability::init_tracing,
    services::{MongoIdentityStore, ServiceError, SmtpMailer},
    AppState,
};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    dotenvy::dotenv().ok();

    // Load configuration - fail fast if invalid
    let config = AuthConfig::from_env()?;

    init_tracing(&config.log_level);

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting identity service"
    );

    tracing::info!("Initializing database connection");
    let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database).await?;
    db.initialize_indexes().await?;
    tracing::info!("Database initialized successfully");

    let store = Arc::new(MongoIdentityStore::new(db));
    tracing::info!("Identity store initialized");

    let mailer = Arc::new(SmtpMailer::new(&config.smtp)?);
    tracing::info!("Mail transport initialized");

    let state = AppState::new(config.clone(), store, mailer)?;
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ServiceError::Config(format!("failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServiceError::Internal(e.into()))?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
