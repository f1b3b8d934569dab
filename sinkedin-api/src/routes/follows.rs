use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use sinkedin_shared::clients::db::{checkout, run_blocking};
use sinkedin_shared::errors::AppResult;
use sinkedin_shared::types::auth::AuthUser;
use sinkedin_shared::types::{ApiResponse, PaginationParams};

use crate::models::User;
use crate::services::reads;
use crate::services::toggle::ToggleOutcome;
use crate::AppState;

/// POST /api/follow/:username - follow, or unfollow if already following
pub async fn toggle_follow(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> AppResult<(StatusCode, Json<ApiResponse<ToggleOutcome>>)> {
    let toggles = state.toggles.clone();
    let outcome = run_blocking(move || toggles.toggle_follow(user.id, &username)).await?;

    Ok(match outcome {
        ToggleOutcome::Created => (StatusCode::CREATED, Json(ApiResponse::ok_with_message(outcome, "following"))),
        ToggleOutcome::Removed => (StatusCode::OK, Json(ApiResponse::ok_with_message(outcome, "unfollowed"))),
    })
}

/// GET /api/follow/followers/:username
pub async fn list_followers(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Vec<User>>>> {
    let db = state.db.clone();
    let users = run_blocking(move || {
        let mut conn = checkout(&db)?;
        reads::list_followers(&mut conn, &username, &page)
    })
    .await?;

    Ok(Json(ApiResponse::ok(users)))
}

/// GET /api/follow/following/:username
pub async fn list_following(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Vec<User>>>> {
    let db = state.db.clone();
    let users = run_blocking(move || {
        let mut conn = checkout(&db)?;
        reads::list_following(&mut conn, &username, &page)
    })
    .await?;

    Ok(Json(ApiResponse::ok(users)))
}
