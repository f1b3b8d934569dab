use std::sync::Arc;

use metrics::counter;

use sinkedin_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Comment, CommentParent, CommentType, NewComment, NewPost, Post};
use crate::services::counters;
use crate::store::{Store, StoreTx};

#[derive(Debug, Clone)]
pub struct PostDraft {
    pub author_id: i32,
    pub content: String,
    pub image_url: Option<String>,
    pub is_quote: bool,
    pub quote_lines: Option<String>,
    pub tags: Vec<String>,
    pub hashtags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CommentDraft {
    pub author_id: i32,
    pub content: String,
    pub comment_type: CommentType,
    pub parent: CommentParent,
    pub tags: Vec<String>,
    pub hashtags: Vec<String>,
}

/// Transactional multi-row creation and removal of posts and comments.
pub struct ComposeEngine<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for ComposeEngine<S> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone() }
    }
}

impl<S: Store> ComposeEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Duplicate hashtag names in one request each bump the counter, while
    /// the join row is written once.
    pub fn create_post(&self, draft: PostDraft) -> AppResult<Post> {
        let image_url = draft.image_url.filter(|url| !url.is_empty());
        let new_post = NewPost {
            user_id: draft.author_id,
            content: draft.content,
            has_image: image_url.is_some(),
            has_tag: !draft.tags.is_empty(),
            has_hashtag: !draft.hashtags.is_empty(),
            image_url,
            is_quote: draft.is_quote,
            quote_lines: draft.quote_lines.filter(|lines| !lines.is_empty()),
        };

        let post = self.store.transaction(|tx| {
            let post = tx.insert_post(&new_post)?;

            for name in &draft.hashtags {
                let hashtag_id = tx.upsert_hashtag(name, true)?;
                tx.link_post_hashtag(post.id, hashtag_id)?;
            }

            for username in &draft.tags {
                let user_id = resolve_tag(tx, username)?;
                tx.link_post_tag(post.id, user_id)?;
            }

            Ok(post)
        })?;

        counter!("composite_creates_total", "entity" => "post").increment(1);
        tracing::info!(
            post_id = post.id,
            user_id = post.user_id,
            tags = draft.tags.len(),
            hashtags = draft.hashtags.len(),
            "post created"
        );
        Ok(post)
    }

    pub fn create_comment(&self, draft: CommentDraft) -> AppResult<Comment> {
        let parent = draft.parent;
        let new_comment = NewComment {
            user_id: draft.author_id,
            post_id: parent.post_id(),
            parent_comment_id: parent.parent_comment_id(),
            comment_type: draft.comment_type.as_str().to_string(),
            content: draft.content,
            contains_tag: !draft.tags.is_empty(),
            contains_hashtag: !draft.hashtags.is_empty(),
        };

        let comment = self.store.transaction(|tx| {
            let parent_exists = match parent {
                CommentParent::Post(id) => tx.find_post(id)?.is_some(),
                CommentParent::Comment(id) => tx.find_comment(id)?.is_some(),
            };
            if !parent_exists {
                return Err(counters::parent_not_found(parent));
            }

            let comment = tx.insert_comment(&new_comment)?;

            // Hashtag counters track posts; comment hashtags only link.
            for name in &draft.hashtags {
                let hashtag_id = tx.upsert_hashtag(name, false)?;
                tx.link_comment_hashtag(comment.id, hashtag_id)?;
            }

            for username in &draft.tags {
                let user_id = resolve_tag(tx, username)?;
                tx.link_comment_tag(comment.id, user_id)?;
            }

            counters::apply_reply_added(tx, parent)?;
            Ok(comment)
        })?;

        counter!("composite_creates_total", "entity" => "comment").increment(1);
        tracing::info!(
            comment_id = comment.id,
            user_id = comment.user_id,
            ?parent,
            "comment created"
        );
        Ok(comment)
    }

    /// Tombstones the post. Counters of other posts and comments are left
    /// alone.
    pub fn delete_post(&self, owner_id: i32, post_id: i32) -> AppResult<()> {
        self.store.transaction(|tx| {
            let post = tx
                .find_post(post_id)?
                .ok_or_else(|| AppError::new(ErrorCode::PostNotFound, "post not found"))?;
            if post.user_id != owner_id {
                return Err(AppError::new(ErrorCode::NotOwner, "not authorized"));
            }
            counters::expect_removed(tx.tombstone_post(post_id)?)
        })?;

        tracing::info!(post_id, user_id = owner_id, "post deleted");
        Ok(())
    }

    /// Tombstones the comment and takes one off its parent's reply count.
    pub fn delete_comment(&self, owner_id: i32, comment_id: i32) -> AppResult<()> {
        self.store.transaction(|tx| {
            let comment = tx
                .find_comment(comment_id)?
                .ok_or_else(|| AppError::new(ErrorCode::CommentNotFound, "comment not found"))?;
            if comment.user_id != owner_id {
                return Err(AppError::new(ErrorCode::NotOwner, "not authorized"));
            }
            let parent = comment
                .parent()
                .ok_or_else(|| AppError::internal(format!("comment {comment_id} has no single parent")))?;

            counters::expect_removed(tx.tombstone_comment(comment_id)?)?;
            counters::apply_reply_removed(tx, parent)
        })?;

        tracing::info!(comment_id, user_id = owner_id, "comment deleted");
        Ok(())
    }
}

/// Any unresolvable username fails the whole creation.
fn resolve_tag(tx: &mut dyn StoreTx, username: &str) -> AppResult<i32> {
    tx.user_id_by_username(username)?.ok_or_else(|| {
        AppError::with_details(
            ErrorCode::UnknownTaggedUser,
            "invalid tagged user",
            serde_json::json!({ "username": username }),
        )
    })
}
