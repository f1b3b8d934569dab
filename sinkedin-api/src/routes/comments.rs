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
use sinkedin_shared::types::{ApiResponse, PaginationParams};

use crate::models::{
    validate_hashtag_names, Comment, CommentParent, CommentThreadView, CommentType, CommentView,
    UpdateComment,
};
use crate::schema::comments;
use crate::services::compose::CommentDraft;
use crate::services::reads;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub post_id: Option<i32>,
    pub parent_id: Option<i32>,
    #[validate(length(min = 1, max = 500, message = "content must be 1 to 500 characters"))]
    pub content: String,
    #[serde(rename = "type", default = "default_comment_type")]
    pub comment_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    #[validate(custom = "validate_hashtag_names")]
    pub hashtags: Vec<String>,
}

fn default_comment_type() -> String {
    CommentType::Normal.as_str().to_string()
}

/// POST /api/comments
pub async fn create_comment(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CommentView>>)> {
    let parent = CommentParent::from_refs(req.post_id, req.parent_id)?;
    let comment_type: CommentType = req.comment_type.parse()?;
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;

    let draft = CommentDraft {
        author_id: user.id,
        content: req.content,
        comment_type,
        parent,
        tags: req.tags,
        hashtags: req.hashtags,
    };

    let composer = state.composer.clone();
    let db = state.db.clone();
    let view = run_blocking(move || {
        let comment = composer.create_comment(draft)?;
        let mut conn = checkout(&db)?;
        reads::load_comment_view(&mut conn, comment.id)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(view))))
}

/// GET /api/comments/post/:post_id - top-level comments, newest first
pub async fn list_post_comments(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i32>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Vec<CommentView>>>> {
    let db = state.db.clone();
    let comments = run_blocking(move || {
        let mut conn = checkout(&db)?;
        reads::list_post_comments(&mut conn, post_id, &page)
    })
    .await?;

    Ok(Json(ApiResponse::ok(comments)))
}

/// GET /api/comments/:id - the comment with its ancestor chain
pub async fn get_comment(
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<i32>,
) -> AppResult<Json<ApiResponse<CommentThreadView>>> {
    let db = state.db.clone();
    let thread = run_blocking(move || {
        let mut conn = checkout(&db)?;
        reads::load_comment_thread(&mut conn, comment_id)
    })
    .await?;

    Ok(Json(ApiResponse::ok(thread)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 500, message = "content must be 1 to 500 characters"))]
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub comment_type: Option<String>,
}

/// PUT /api/comments/:id - owner only
pub async fn update_comment(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<i32>,
    Json(req): Json<UpdateCommentRequest>,
) -> AppResult<Json<ApiResponse<Comment>>> {
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;
    let comment_type = req
        .comment_type
        .as_deref()
        .map(str::parse::<CommentType>)
        .transpose()?;

    let changes = UpdateComment {
        content: req.content,
        comment_type: comment_type.map(|t| t.as_str().to_string()),
    };

    let db = state.db.clone();
    let updated = run_blocking(move || {
        let mut conn = checkout(&db)?;
        let comment = reads::find_comment(&mut conn, comment_id)?
            .ok_or_else(|| AppError::new(ErrorCode::CommentNotFound, "comment not found"))?;
        if comment.user_id != user.id {
            return Err(AppError::new(ErrorCode::NotOwner, "only the author can edit this comment"));
        }

        let updated = diesel::update(
            comments::table
                .filter(comments::id.eq(comment_id))
                .filter(comments::deleted_at.is_null()),
        )
        .set((&changes, comments::updated_at.eq(Utc::now())))
        .get_result::<Comment>(&mut conn)?;
        Ok(updated)
    })
    .await?;

    Ok(Json(ApiResponse::ok(updated)))
}

/// DELETE /api/comments/:id - owner only; the parent's commentCount drops by one
pub async fn delete_comment(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<i32>,
) -> AppResult<StatusCode> {
    let composer = state.composer.clone();
    run_blocking(move || composer.delete_comment(user.id, comment_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}
