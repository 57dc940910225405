use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::net::TcpListener;

use zets_landing::config::LandingConfig;
use zets_landing::jobs::session_sweeper;
use zets_landing::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,zets_landing=debug,tower_http=info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let config = LandingConfig::from_env().context("Invalid landing configuration")?;

    let _sentry = match config.sentry_dsn.as_deref().map(str::parse::<sentry::types::Dsn>) {
        Some(Ok(dsn)) => Some(sentry::init(sentry::ClientOptions {
            dsn: Some(dsn),
            release: sentry::release_name!(),
            ..Default::default()
        })),
        Some(Err(e)) => {
            tracing::warn!("Ignoring invalid SENTRY_DSN: {}", e);
            None
        }
        None => None,
    };

    let state = Arc::new(AppState::from_config(&config));
    let app = build_router(state.clone(), &config.static_dir, &config.frontend_url);

    let sweeper_state = state.clone();
    let ttl = config.session_idle_ttl;
    tokio::spawn(async move {
        session_sweeper::start_sweeper(sweeper_state, ttl).await;
    });

    tracing::info!("Starting server on port {}", config.port);
    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    axum::serve(listener, app.into_make_service())
        .await
        .context("Server error")?;
    Ok(())
}
