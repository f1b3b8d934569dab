use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};

use crate::errors::{AppError, AppResult};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<PgConnection>>;

/// Connection pool lifecycle knobs.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_idle: u32,
    pub max_lifetime: Duration,
    pub connection_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 100,
            min_idle: 10,
            max_lifetime: Duration::from_secs(3600),
            connection_timeout: Duration::from_secs(30),
        }
    }
}

pub fn create_pool(database_url: &str, settings: &PoolSettings) -> anyhow::Result<DbPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(settings.max_connections)
        .min_idle(Some(settings.min_idle.min(settings.max_connections)))
        .max_lifetime(Some(settings.max_lifetime))
        .connection_timeout(settings.connection_timeout)
        .test_on_check_out(true)
        .build(manager)?;

    tracing::info!(
        max_connections = settings.max_connections,
        min_idle = settings.min_idle,
        "database connection pool created"
    );
    Ok(pool)
}

pub fn checkout(pool: &DbPool) -> AppResult<DbConn> {
    pool.get().map_err(|e| AppError::internal(format!("db pool error: {e}")))
}

/// Runs synchronous diesel work on the blocking thread pool.
pub async fn run_blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("blocking task failed: {e}")))?
}
