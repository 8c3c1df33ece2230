// Pageforest server bootstrap: config, state, router, listener.

use axum::extract::DefaultBodyLimit;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::info;

use pageforest::api;
use pageforest::app_state::AppState;
use pageforest::config::Config;

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize application state; a store that cannot be opened is fatal
    let state = AppState::new(&config)?;
    info!("database file: {}", config.database.file);

    let app = api::router(state).layer(
        ServiceBuilder::new()
            .layer(CorsLayer::permissive())
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
    );

    let addr = config.server_address();
    info!("listening on http://{}/graphql", addr);
    info!("seed user: admin / admin");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
