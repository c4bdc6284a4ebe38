//! Punchcard CMS Kernel
//!
//! HTTP server for content type routes and record storage.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use punchcard_kernel::{AppState, Config, build_router, session};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting Punchcard kernel");

    let config = Config::from_env().context("failed to load configuration")?;
    info!(port = config.port, base = %config.content.base, "Configuration loaded");

    let state = AppState::new(&config)
        .await
        .context("failed to initialize application state")?;

    info!(
        content_types = state.content_types().len(),
        store = state.store().backend(),
        "Content types and record tables ready"
    );

    let same_site = session::parse_same_site(&config.cookie_same_site);
    let app = match &config.redis_url {
        Some(redis_url) => {
            let layer = session::create_session_layer(redis_url, same_site, config.cookie_secure)
                .await
                .context("failed to create session layer")?;
            info!("Sessions stored in Redis");
            build_router(state, layer)
        }
        None => {
            info!("REDIS_URL not set; sessions kept in memory");
            build_router(
                state,
                session::create_memory_session_layer(same_site, config.cookie_secure),
            )
        }
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, "Server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
