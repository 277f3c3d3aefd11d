//! docforge-server: binds the REST/WebSocket surface and serves it.

use anyhow::Context;
use docforge_core::Config;
use docforge_server::{router, AppState};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install global tracing subscriber")?;

    let config = Config::from_env().context("failed to load configuration")?;
    let bind_addr = format!("{}:{}", config.api_host, config.api_port);
    let cors_origins = config.cors_origins.clone();

    let state = AppState::new(config).context("failed to initialize application state")?;

    let cors = if cors_origins.is_empty() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<_> = cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    };

    let app = router(state).layer(cors);

    info!(addr = %bind_addr, "starting docforge server");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    axum::serve(listener, app)
        .await
        .context("server terminated unexpectedly")?;

    Ok(())
}
