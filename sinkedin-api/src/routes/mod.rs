pub mod comments;
pub mod follows;
pub mod hashtags;
pub mod health;
pub mod likes;
pub mod posts;
pub mod users;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use sinkedin_shared::middleware::metrics_middleware;

use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/users/:username", get(users::get_user))
        .route("/posts", post(posts::create_post).get(posts::list_posts))
        .route(
            "/posts/:id",
            get(posts::get_post).put(posts::update_post).delete(posts::delete_post),
        )
        .route("/comments", post(comments::create_comment))
        .route("/comments/post/:post_id", get(comments::list_post_comments))
        .route(
            "/comments/:id",
            get(comments::get_comment)
                .put(comments::update_comment)
                .delete(comments::delete_comment),
        )
        .route("/likes/:kind/:id", post(likes::toggle_like).get(likes::list_likers))
        .route("/follow/followers/:username", get(follows::list_followers))
        .route("/follow/following/:username", get(follows::list_following))
        .route("/follow/:username", post(follows::toggle_follow))
        .route("/hashtags/trending", get(hashtags::trending))
        .route("/hashtags/:name/posts", get(hashtags::hashtag_posts));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .nest("/api", api)
        .layer(axum::middleware::from_fn(metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use diesel::pg::PgConnection;
    use diesel::r2d2::{ConnectionManager, Pool};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use tower::ServiceExt;

    use sinkedin_shared::types::auth::Claims;

    use crate::config::AppConfig;

    // Never connects: every request here is rejected before a checkout.
    fn app() -> Router {
        let manager = ConnectionManager::<PgConnection>::new("postgres://nobody@127.0.0.1:1/none");
        let db = Pool::builder()
            .connection_timeout(Duration::from_millis(50))
            .build_unchecked(manager);
        router(Arc::new(AppState::new(db, AppConfig::default(), None)))
    }

    fn bearer(user_id: i32) -> String {
        let secret = std::env::var("JWT_SECRET")
            .unwrap_or_else(|_| "development-secret-change-in-production".to_string());
        let token = encode(
            &Header::default(),
            &Claims::new(user_id, 3600),
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();
        format!("Bearer {token}")
    }

    fn json_post(uri: &str, body: serde_json::Value, auth: Option<String>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn error_code(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        body["error"]["code"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn comment_with_both_parents_is_rejected() {
        let req = json_post(
            "/api/comments",
            serde_json::json!({"postId": 1, "parentId": 2, "content": "hi", "type": "normal"}),
            Some(bearer(1)),
        );
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(response).await, "E2007");
    }

    #[tokio::test]
    async fn comment_without_parent_is_rejected() {
        let req = json_post(
            "/api/comments",
            serde_json::json!({"content": "hi", "type": "normal"}),
            Some(bearer(1)),
        );
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(response).await, "E2007");
    }

    #[tokio::test]
    async fn unknown_comment_type_is_rejected() {
        let req = json_post(
            "/api/comments",
            serde_json::json!({"postId": 1, "content": "hi", "type": "video"}),
            Some(bearer(1)),
        );
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(response).await, "E2008");
    }

    #[tokio::test]
    async fn unknown_like_type_is_rejected() {
        let req = json_post("/api/likes/share/1", serde_json::json!({}), Some(bearer(1)));
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(response).await, "E2006");
    }

    #[tokio::test]
    async fn non_numeric_like_id_is_rejected() {
        let req = json_post("/api/likes/post/abc", serde_json::json!({}), Some(bearer(1)));
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(response).await, "E0008");
    }

    #[tokio::test]
    async fn empty_post_content_fails_validation() {
        let req = json_post(
            "/api/posts",
            serde_json::json!({"content": "", "tags": [], "hashtags": []}),
            Some(bearer(1)),
        );
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(response).await, "E0002");
    }

    #[tokio::test]
    async fn malformed_image_url_fails_validation() {
        let req = json_post(
            "/api/posts",
            serde_json::json!({"content": "hello", "imageURL": "not a url"}),
            Some(bearer(1)),
        );
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(response).await, "E0002");
    }

    #[tokio::test]
    async fn comment_longer_than_its_column_fails_validation() {
        let req = json_post(
            "/api/comments",
            serde_json::json!({"postId": 1, "content": "c".repeat(501), "type": "normal"}),
            Some(bearer(1)),
        );
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(response).await, "E0002");
    }

    #[tokio::test]
    async fn comment_at_column_width_passes_validation() {
        let req = json_post(
            "/api/comments",
            serde_json::json!({"postId": 1, "content": "c".repeat(500), "type": "normal"}),
            Some(bearer(1)),
        );
        // reaches the store, which cannot connect here
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn image_url_longer_than_its_column_fails_validation() {
        let url = format!("https://img.example.com/{}.png", "a".repeat(240));
        let req = json_post(
            "/api/posts",
            serde_json::json!({"content": "hello", "imageURL": url}),
            Some(bearer(1)),
        );
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(response).await, "E0002");
    }

    #[tokio::test]
    async fn quote_lines_longer_than_its_column_fails_validation() {
        let req = json_post(
            "/api/posts",
            serde_json::json!({"content": "hello", "isQuote": true, "quoteLines": "q".repeat(501)}),
            Some(bearer(1)),
        );
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(response).await, "E0002");
    }

    #[tokio::test]
    async fn blank_hashtag_fails_validation() {
        let req = json_post(
            "/api/posts",
            serde_json::json!({"content": "hello", "hashtags": ["rust", "  "]}),
            Some(bearer(1)),
        );
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(response).await, "E0002");
    }

    #[tokio::test]
    async fn overlong_comment_hashtag_fails_validation() {
        let req = json_post(
            "/api/comments",
            serde_json::json!({"postId": 1, "content": "hi", "type": "normal", "hashtags": ["h".repeat(51)]}),
            Some(bearer(1)),
        );
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(response).await, "E0002");
    }

    #[tokio::test]
    async fn writes_require_a_bearer_token() {
        let req = json_post("/api/follow/bob", serde_json::json!({}), None);
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(response).await, "E0004");
    }

    #[tokio::test]
    async fn metrics_without_recorder_is_not_found() {
        let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
