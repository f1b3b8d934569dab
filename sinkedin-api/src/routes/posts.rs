use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use validator::Validate;

use sinkedin_shared::clients::db::{checkout, run_blocking};
use sinkedin_shared::errors::{AppError, AppResult, ErrorCode};
use sinkedin_shared::types::auth::AuthUser;
use sinkedin_shared::types::{ApiResponse, Paginated, PaginationParams};

use crate::models::{validate_hashtag_names, Post, PostView, UpdatePost};
use crate::schema::posts;
use crate::services::compose::PostDraft;
use crate::services::reads;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 5000, message = "content must be 1 to 5000 characters"))]
    pub content: String,
    #[serde(rename = "imageURL", default)]
    #[validate(
        url(message = "imageURL must be a valid URL"),
        length(max = 255, message = "imageURL must be at most 255 characters")
    )]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    #[validate(custom = "validate_hashtag_names")]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub is_quote: bool,
    #[validate(length(max = 500, message = "quoteLines must be at most 500 characters"))]
    pub quote_lines: Option<String>,
}

/// POST /api/posts
pub async fn create_post(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(mut req): Json<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<PostView>>)> {
    req.image_url = req.image_url.filter(|url| !url.is_empty());
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;

    let draft = PostDraft {
        author_id: user.id,
        content: req.content,
        image_url: req.image_url,
        is_quote: req.is_quote,
        quote_lines: req.quote_lines,
        tags: req.tags,
        hashtags: req.hashtags,
    };

    let composer = state.composer.clone();
    let db = state.db.clone();
    let view = run_blocking(move || {
        let post = composer.create_post(draft)?;
        // committed; a concurrent edit may already be visible here
        let mut conn = checkout(&db)?;
        reads::load_post_view(&mut conn, post.id)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(view))))
}

/// GET /api/posts - newest first
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<PostView>>>> {
    let db = state.db.clone();
    let posts = run_blocking(move || {
        let mut conn = checkout(&db)?;
        reads::list_posts(&mut conn, &page)
    })
    .await?;

    Ok(Json(ApiResponse::ok(posts)))
}

/// GET /api/posts/:id
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i32>,
) -> AppResult<Json<ApiResponse<PostView>>> {
    let db = state.db.clone();
    let view = run_blocking(move || {
        let mut conn = checkout(&db)?;
        reads::load_post_view(&mut conn, post_id)
    })
    .await?;

    Ok(Json(ApiResponse::ok(view)))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 5000, message = "content must be 1 to 5000 characters"))]
    pub content: Option<String>,
    pub is_quote: Option<bool>,
    #[validate(length(max = 500, message = "quoteLines must be at most 500 characters"))]
    pub quote_lines: Option<String>,
}

/// PUT /api/posts/:id - owner only. Tags, hashtags and derived flags stay as created.
pub async fn update_post(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i32>,
    Json(req): Json<UpdatePostRequest>,
) -> AppResult<Json<ApiResponse<Post>>> {
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;

    let changes = UpdatePost {
        content: req.content,
        is_quote: req.is_quote,
        quote_lines: req.quote_lines,
    };

    let db = state.db.clone();
    let updated = run_blocking(move || {
        let mut conn = checkout(&db)?;
        let post = reads::find_post(&mut conn, post_id)?;
        if post.user_id != user.id {
            return Err(AppError::new(ErrorCode::NotOwner, "only the author can edit this post"));
        }

        let updated = diesel::update(
            posts::table
                .filter(posts::id.eq(post_id))
                .filter(posts::deleted_at.is_null()),
        )
        .set((&changes, posts::updated_at.eq(Utc::now())))
        .get_result::<Post>(&mut conn)?;
        Ok(updated)
    })
    .await?;

    Ok(Json(ApiResponse::ok(updated)))
}

/// DELETE /api/posts/:id - owner only
pub async fn delete_post(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i32>,
) -> AppResult<StatusCode> {
    let composer = state.composer.clone();
    run_blocking(move || composer.delete_post(user.id, post_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}
