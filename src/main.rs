use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use classhub::config::Config;
use classhub::AppState;

#[derive(Parser, Debug)]
#[command(name = "classhub")]
#[command(author, version, about = "A small school-platform backend", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "classhub.toml")]
    config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;

    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting classhub v{}", env!("CARGO_PKG_VERSION"));

    std::fs::create_dir_all(&config.server.data_dir)?;

    let db = classhub::db::init(&config.server.data_dir).await?;

    // Seed the configured admin account, if any
    if let (Some(email), Some(password)) = (
        config.auth.admin_email.as_deref(),
        config.auth.admin_password.as_deref(),
    ) {
        classhub::api::auth::ensure_admin_user(&db, email, password).await?;
    }

    let state = Arc::new(AppState::new(config.clone(), db));

    let api_router = classhub::api::create_router(state);

    // Serve the React bundle with an SPA fallback
    let static_dir = PathBuf::from("static/dist");
    let index_file = static_dir.join("index.html");
    let serve_static = ServeDir::new(&static_dir).not_found_service(ServeFile::new(&index_file));

    let app = axum::Router::new()
        .merge(api_router)
        .fallback_service(serve_static);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
