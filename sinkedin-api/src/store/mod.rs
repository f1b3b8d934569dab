//! Transactional storage seam for the engagement engines.
//!
//! Engines never touch diesel directly: they run a closure against a
//! [`StoreTx`] inside [`Store::transaction`], and the whole closure commits or
//! rolls back as one unit. Every lookup on this trait ignores tombstoned rows.

use sinkedin_shared::errors::AppResult;

use crate::models::{Comment, CommentParent, LikeTarget, NewComment, NewPost, Post};

#[cfg(test)]
pub mod memory;
pub mod pg;

pub use pg::PgStore;

pub trait Store: Send + Sync + 'static {
    /// Runs `f` in a single transaction. An `Err` from `f` rolls back every
    /// statement it issued.
    fn transaction<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut dyn StoreTx) -> AppResult<T>;
}

/// Statements available inside a transaction.
///
/// `adjust_*` and `tombstone_*` methods return the number of active rows
/// they touched so callers can tell a vanished or already-removed row from a
/// successful update. Tombstoning only ever touches rows that are still active.
pub trait StoreTx {
    // users
    fn user_id_by_username(&mut self, username: &str) -> AppResult<Option<i32>>;
    fn adjust_follow_counts(&mut self, follower_id: i32, following_id: i32, delta: i32) -> AppResult<usize>;

    // likes
    fn like_target_exists(&mut self, target: LikeTarget) -> AppResult<bool>;
    fn find_active_like(&mut self, user_id: i32, target: LikeTarget) -> AppResult<Option<i32>>;
    /// Fails with a unique violation when an active like already holds the key.
    fn insert_like(&mut self, user_id: i32, target: LikeTarget) -> AppResult<i32>;
    fn tombstone_like(&mut self, like_id: i32) -> AppResult<usize>;
    fn adjust_like_count(&mut self, target: LikeTarget, delta: i32) -> AppResult<usize>;

    // follows
    fn find_active_follow(&mut self, follower_id: i32, following_id: i32) -> AppResult<Option<i32>>;
    /// Fails with a unique violation when an active follow already holds the key.
    fn insert_follow(&mut self, follower_id: i32, following_id: i32) -> AppResult<i32>;
    fn tombstone_follow(&mut self, follow_id: i32) -> AppResult<usize>;

    // posts and comments
    fn find_post(&mut self, post_id: i32) -> AppResult<Option<Post>>;
    fn find_comment(&mut self, comment_id: i32) -> AppResult<Option<Comment>>;
    fn insert_post(&mut self, post: &NewPost) -> AppResult<Post>;
    fn insert_comment(&mut self, comment: &NewComment) -> AppResult<Comment>;
    fn tombstone_post(&mut self, post_id: i32) -> AppResult<usize>;
    fn tombstone_comment(&mut self, comment_id: i32) -> AppResult<usize>;
    fn adjust_comment_count(&mut self, parent: CommentParent, delta: i32) -> AppResult<usize>;

    // hashtags and join rows
    /// Finds or creates the hashtag by name, bumping its all-time counter
    /// when `bump` is set. Returns the hashtag id.
    fn upsert_hashtag(&mut self, name: &str, bump: bool) -> AppResult<i32>;
    fn link_post_hashtag(&mut self, post_id: i32, hashtag_id: i32) -> AppResult<()>;
    fn link_post_tag(&mut self, post_id: i32, user_id: i32) -> AppResult<()>;
    fn link_comment_hashtag(&mut self, comment_id: i32, hashtag_id: i32) -> AppResult<()>;
    fn link_comment_tag(&mut self, comment_id: i32, user_id: i32) -> AppResult<()>;
}
