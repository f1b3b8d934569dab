use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use sinkedin_shared::clients::db::DbPool;

pub mod config;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;

use config::AppConfig;
use services::compose::ComposeEngine;
use services::toggle::ToggleEngine;
use store::PgStore;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub toggles: ToggleEngine<PgStore>,
    pub composer: ComposeEngine<PgStore>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(db: DbPool, config: AppConfig, metrics: Option<PrometheusHandle>) -> Self {
        let store = Arc::new(PgStore::new(db.clone()));
        Self {
            db,
            config,
            toggles: ToggleEngine::new(store.clone()),
            composer: ComposeEngine::new(store),
            metrics,
        }
    }
}
