use std::sync::Arc;

use sinkedin_shared::clients::db::create_pool;

use sinkedin_api::config::AppConfig;
use sinkedin_api::{routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sinkedin_shared::middleware::init_tracing("sinkedin-api");

    let config = AppConfig::load()?;

    let db = create_pool(&config.database_url, &config.pool_settings())?;
    let metrics = sinkedin_shared::middleware::init_metrics()?;

    let state = Arc::new(AppState::new(db, config, Some(metrics)));
    let addr = format!("0.0.0.0:{}", state.config.port);
    let app = routes::router(state);

    tracing::info!(addr = %addr, "sinkedin-api starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
