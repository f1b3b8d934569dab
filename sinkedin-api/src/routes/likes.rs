use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use sinkedin_shared::clients::db::{checkout, run_blocking};
use sinkedin_shared::errors::{AppError, AppResult};
use sinkedin_shared::types::auth::AuthUser;
use sinkedin_shared::types::{ApiResponse, PaginationParams};

use crate::models::{LikeKind, LikeTarget, LikeView};
use crate::services::reads;
use crate::services::toggle::ToggleOutcome;
use crate::AppState;

/// Both path segments are checked before any store work.
fn parse_target(kind: &str, id: &str) -> AppResult<LikeTarget> {
    let kind: LikeKind = kind.parse()?;
    let id = id
        .parse::<i32>()
        .map_err(|_| AppError::bad_request(format!("invalid {kind} id: {id}")))?;
    Ok(LikeTarget::new(kind, id))
}

/// POST /api/likes/:type/:id - like, or unlike if already liked
pub async fn toggle_like(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
) -> AppResult<(StatusCode, Json<ApiResponse<ToggleOutcome>>)> {
    let target = parse_target(&kind, &id)?;

    let toggles = state.toggles.clone();
    let outcome = run_blocking(move || toggles.toggle_like(user.id, target)).await?;

    Ok(match outcome {
        ToggleOutcome::Created => (StatusCode::CREATED, Json(ApiResponse::ok_with_message(outcome, "liked"))),
        ToggleOutcome::Removed => (StatusCode::OK, Json(ApiResponse::ok_with_message(outcome, "unliked"))),
    })
}

/// GET /api/likes/:type/:id - newest first
pub async fn list_likers(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Vec<LikeView>>>> {
    let target = parse_target(&kind, &id)?;

    let db = state.db.clone();
    let likers = run_blocking(move || {
        let mut conn = checkout(&db)?;
        reads::list_likers(&mut conn, target, &page)
    })
    .await?;

    Ok(Json(ApiResponse::ok(likers)))
}
