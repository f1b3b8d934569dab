use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use diesel::connection::SimpleConnection;

use sinkedin_shared::clients::db::{checkout, run_blocking};
use sinkedin_shared::types::api::{HealthCheck, HealthResponse, HealthStatus};

use crate::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let db = state.db.clone();
    let check = run_blocking(move || {
        let mut conn = checkout(&db)?;
        conn.batch_execute("SELECT 1")?;
        Ok(())
    })
    .await;

    let response = HealthResponse::healthy("sinkedin-api", env!("CARGO_PKG_VERSION"))
        .with_checks(vec![HealthCheck::from_result("postgres", check)]);
    let status = match response.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };
    (status, Json(response))
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}
