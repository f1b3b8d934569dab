use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use sinkedin_shared::clients::db::{checkout, run_blocking};
use sinkedin_shared::errors::AppResult;
use sinkedin_shared::types::ApiResponse;

use crate::models::User;
use crate::services::reads;
use crate::AppState;

/// GET /api/users/:username
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> AppResult<Json<ApiResponse<User>>> {
    let db = state.db.clone();
    let user = run_blocking(move || {
        let mut conn = checkout(&db)?;
        reads::find_user_by_username(&mut conn, &username)
    })
    .await?;

    Ok(Json(ApiResponse::ok(user)))
}
