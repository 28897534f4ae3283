//! Web server entry point: load configuration, wire the identity provider,
//! Graph client and session store into the router, and serve.

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use graph_mail_oauth::server::{AppConfig, MemorySessionStore, app_routes};
use graph_mail_oauth::{AuthClient, GraphClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before the subscriber so RUST_LOG set there is honoured.
    let dotenv = dotenvy::dotenv();
    init_tracing();

    // A missing .env file is fine; the variables may come from the environment.
    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => {
            tracing::error!(error = %e, "Failed to read .env file");
            return Err(e).context("failed to read .env file");
        }
    }

    let config = AppConfig::from_env().context("invalid configuration")?;

    let provider = AuthClient::new(config.oauth().clone());
    let mail = GraphClient::with_base_url(config.graph_base_url().clone());
    let store = match config.session_ttl() {
        Some(ttl) => MemorySessionStore::with_idle_timeout(config.max_sessions(), ttl),
        None => MemorySessionStore::new(config.max_sessions()),
    };

    let addr = config.listen_addr();
    tracing::debug!(oauth = ?config.oauth(), "Loaded configuration");

    let app = app_routes(config, provider, mail, store);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Server is running on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
