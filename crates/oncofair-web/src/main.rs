//! OncoFair web server
//!
//! Run with: cargo run -p oncofair-web --bin oncofair

use oncofair_config::Config;
use oncofair_web::{router::build_router, state::AppState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("oncofair=debug,info")),
        )
        .init();

    info!("Starting OncoFair...");

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            warn!("{e:#}; using built-in defaults");
            Config::default()
        }
    };

    let state = AppState::from_config(&config)?;
    let app = build_router(state);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
