//! Notification service entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tradehub_api::{AppState, router as api_router};
use tradehub_common::Config;
use tradehub_core::services::{
    DbRecipientDirectory, build_email_transport, build_push_transport, build_sms_transport,
};
use tradehub_core::{
    DeliveryCoordinator, DeliveryTransports, NotificationFactory, NotificationQueryService,
};
use tradehub_db::repositories::{NotificationRepository, RecipientRepository};
use tradehub_queue::{NotificationJobExecutor, SchedulerConfig, run_scheduler};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
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
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tradehub=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting notification service...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database and run migrations
    let db = tradehub_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    tradehub_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let notification_repo = NotificationRepository::new(Arc::clone(&db));
    let recipient_repo = RecipientRepository::new(Arc::clone(&db));

    // Initialize the recipient directory and channel transports
    let directory = Arc::new(DbRecipientDirectory::new(recipient_repo));
    let transports = DeliveryTransports {
        email: build_email_transport(&config.email)?,
        sms: build_sms_transport(&config.sms),
        push: build_push_transport(&config.push),
    };
    info!(
        email = transports.email.is_some(),
        sms = transports.sms.is_some(),
        push = transports.push.is_some(),
        "Channel transports initialized"
    );

    // Initialize services
    let coordinator = Arc::new(DeliveryCoordinator::new(
        notification_repo.clone(),
        directory.clone(),
        transports,
        &config,
    ));
    let factory = NotificationFactory::new(
        notification_repo.clone(),
        directory,
        config.delivery.max_attempts,
    );
    let query = NotificationQueryService::new(notification_repo.clone());

    // Start the background sweeps
    let executor = Arc::new(NotificationJobExecutor::new(
        notification_repo,
        Arc::clone(&coordinator),
        &config.scheduler,
    ));
    run_scheduler(SchedulerConfig::from(&config.scheduler), executor).await;
    info!("Background sweeps started");

    // Build router
    let state = AppState::new(factory, coordinator, query);
    let app = Router::new()
        .route("/health", get(tradehub_api::endpoints::health))
        .nest("/api", api_router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
