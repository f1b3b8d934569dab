use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;

use sinkedin_shared::clients::db::{checkout, run_blocking};
use sinkedin_shared::errors::AppResult;
use sinkedin_shared::types::{ApiResponse, PaginationParams};

use crate::models::{Hashtag, PostView};
use crate::services::reads;
use crate::AppState;

/// GET /api/hashtags/trending
pub async fn trending(State(state): State<Arc<AppState>>) -> AppResult<Json<ApiResponse<Vec<Hashtag>>>> {
    let db = state.db.clone();
    let tags = run_blocking(move || {
        let mut conn = checkout(&db)?;
        reads::trending_hashtags(&mut conn)
    })
    .await?;

    Ok(Json(ApiResponse::ok(tags)))
}

/// GET /api/hashtags/:name/posts
pub async fn hashtag_posts(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Vec<PostView>>>> {
    let db = state.db.clone();
    let posts = run_blocking(move || {
        let mut conn = checkout(&db)?;
        reads::hashtag_posts(&mut conn, &name, &page)
    })
    .await?;

    Ok(Json(ApiResponse::ok(posts)))
}
