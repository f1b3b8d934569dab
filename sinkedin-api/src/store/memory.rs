//! In-memory [`Store`] used by the engine tests.
//!
//! Each transaction runs against a cloned snapshot that replaces the live
//! state only when the closure returns `Ok`, so a failed step leaves nothing
//! behind. Active-row uniqueness on likes and follows mirrors the partial
//! unique indexes of the SQL schema.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{NaiveDate, Utc};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use sinkedin_shared::errors::{AppError, AppResult};

use crate::models::{
    Comment, CommentParent, Follow, Hashtag, Like, LikeTarget, NewComment, NewPost, Post, User,
};

use super::{Store, StoreTx};

#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub users: Vec<User>,
    pub posts: Vec<Post>,
    pub comments: Vec<Comment>,
    pub hashtags: Vec<Hashtag>,
    pub likes: Vec<Like>,
    pub follows: Vec<Follow>,
    pub post_hashtags: HashSet<(i32, i32)>,
    pub post_tags: HashSet<(i32, i32)>,
    pub comment_tags: HashSet<(i32, i32)>,
    pub comment_hashtags: HashSet<(i32, i32)>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn user(&self, id: i32) -> &User {
        self.users.iter().find(|u| u.id == id).expect("user exists")
    }

    pub fn post(&self, id: i32) -> &Post {
        self.posts.iter().find(|p| p.id == id).expect("post exists")
    }

    pub fn comment(&self, id: i32) -> &Comment {
        self.comments.iter().find(|c| c.id == id).expect("comment exists")
    }

    pub fn hashtag(&self, name: &str) -> Option<&Hashtag> {
        self.hashtags.iter().find(|h| h.name == name)
    }

    pub fn active_likes(&self, target: LikeTarget) -> usize {
        self.likes
            .iter()
            .filter(|l| l.deleted_at.is_none())
            .filter(|l| l.parent_id == target.id() && l.like_type == target.kind().to_string())
            .count()
    }

    pub fn active_follows(&self, follower_id: i32, following_id: i32) -> usize {
        self.follows
            .iter()
            .filter(|f| f.deleted_at.is_none())
            .filter(|f| f.follower_id == follower_id && f.following_id == following_id)
            .count()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    stale_like_reads: AtomicBool,
    stale_removal_reads: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `find_active_like` miss existing rows, the way a transaction
    /// that checked before a concurrent insert committed would.
    pub fn simulate_stale_like_reads(&self, stale: bool) {
        self.stale_like_reads.store(stale, Ordering::SeqCst);
    }

    /// Makes `find_active_like` and `find_active_follow` return the newest
    /// matching row even when it is already tombstoned, the way a transaction
    /// that read before a concurrent removal committed would.
    pub fn simulate_stale_removal_reads(&self, stale: bool) {
        self.stale_removal_reads.store(stale, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Tables {
        self.tables.lock().expect("store lock").clone()
    }

    pub fn add_user(&self, username: &str) -> i32 {
        self.add_user_with_counts(username, 0, 0)
    }

    pub fn add_user_with_counts(&self, username: &str, followers: i32, following: i32) -> i32 {
        let mut tables = self.tables.lock().expect("store lock");
        let id = tables.next_id();
        let now = Utc::now();
        tables.users.push(User {
            id,
            name: username.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            phone_number: None,
            password: String::new(),
            bio: None,
            followers_count: followers,
            following_count: following,
            dob: NaiveDate::from_ymd_opt(1990, 1, 1),
            photo_url: None,
            banner_url: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        });
        id
    }
}

fn unique_violation(constraint: &str) -> AppError {
    AppError::Database(DieselError::DatabaseError(
        DatabaseErrorKind::UniqueViolation,
        Box::new(format!("duplicate key value violates unique constraint \"{constraint}\"")),
    ))
}

impl Store for MemoryStore {
    fn transaction<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut dyn StoreTx) -> AppResult<T>,
    {
        let mut live = self
            .tables
            .lock()
            .map_err(|_| AppError::internal("store lock poisoned"))?;
        let mut draft = live.clone();
        let mut tx = MemoryTx {
            tables: &mut draft,
            stale_like_reads: self.stale_like_reads.load(Ordering::SeqCst),
            stale_removal_reads: self.stale_removal_reads.load(Ordering::SeqCst),
        };
        let out = f(&mut tx)?;
        *live = draft;
        Ok(out)
    }
}

struct MemoryTx<'a> {
    tables: &'a mut Tables,
    stale_like_reads: bool,
    stale_removal_reads: bool,
}

impl StoreTx for MemoryTx<'_> {
    fn user_id_by_username(&mut self, username: &str) -> AppResult<Option<i32>> {
        Ok(self
            .tables
            .users
            .iter()
            .find(|u| u.username == username && u.deleted_at.is_none())
            .map(|u| u.id))
    }

    fn adjust_follow_counts(&mut self, follower_id: i32, following_id: i32, delta: i32) -> AppResult<usize> {
        let mut touched = 0;
        for user in self.tables.users.iter_mut().filter(|u| u.deleted_at.is_none()) {
            if user.id == follower_id {
                user.following_count += delta;
                touched += 1;
            }
            if user.id == following_id {
                user.followers_count += delta;
                touched += 1;
            }
        }
        Ok(touched)
    }

    fn like_target_exists(&mut self, target: LikeTarget) -> AppResult<bool> {
        Ok(match target {
            LikeTarget::Post(id) => self.find_post(id)?.is_some(),
            LikeTarget::Comment(id) => self.find_comment(id)?.is_some(),
        })
    }

    fn find_active_like(&mut self, user_id: i32, target: LikeTarget) -> AppResult<Option<i32>> {
        if self.stale_like_reads {
            return Ok(None);
        }
        let kind = target.kind().to_string();
        let include_tombstoned = self.stale_removal_reads;
        Ok(self
            .tables
            .likes
            .iter()
            .rev()
            .find(|l| {
                (include_tombstoned || l.deleted_at.is_none())
                    && l.user_id == user_id
                    && l.parent_id == target.id()
                    && l.like_type == kind
            })
            .map(|l| l.id))
    }

    fn insert_like(&mut self, user_id: i32, target: LikeTarget) -> AppResult<i32> {
        let kind = target.kind().to_string();
        let taken = self.tables.likes.iter().any(|l| {
            l.deleted_at.is_none() && l.user_id == user_id && l.parent_id == target.id() && l.like_type == kind
        });
        if taken {
            return Err(unique_violation("likes_active_key"));
        }
        let id = self.tables.next_id();
        self.tables.likes.push(Like {
            id,
            user_id,
            parent_id: target.id(),
            like_type: kind,
            created_at: Utc::now(),
            deleted_at: None,
        });
        Ok(id)
    }

    fn tombstone_like(&mut self, like_id: i32) -> AppResult<usize> {
        let mut touched = 0;
        for like in self.tables.likes.iter_mut().filter(|l| l.id == like_id && l.deleted_at.is_none()) {
            like.deleted_at = Some(Utc::now());
            touched += 1;
        }
        Ok(touched)
    }

    fn adjust_like_count(&mut self, target: LikeTarget, delta: i32) -> AppResult<usize> {
        let mut touched = 0;
        match target {
            LikeTarget::Post(id) => {
                for post in self.tables.posts.iter_mut().filter(|p| p.id == id && p.deleted_at.is_none()) {
                    post.like_count += delta;
                    touched += 1;
                }
            }
            LikeTarget::Comment(id) => {
                for comment in self.tables.comments.iter_mut().filter(|c| c.id == id && c.deleted_at.is_none()) {
                    comment.like_count += delta;
                    touched += 1;
                }
            }
        }
        Ok(touched)
    }

    fn find_active_follow(&mut self, follower_id: i32, following_id: i32) -> AppResult<Option<i32>> {
        let include_tombstoned = self.stale_removal_reads;
        Ok(self
            .tables
            .follows
            .iter()
            .rev()
            .find(|f| {
                (include_tombstoned || f.deleted_at.is_none())
                    && f.follower_id == follower_id
                    && f.following_id == following_id
            })
            .map(|f| f.id))
    }

    fn insert_follow(&mut self, follower_id: i32, following_id: i32) -> AppResult<i32> {
        if self.tables.active_follows(follower_id, following_id) > 0 {
            return Err(unique_violation("follows_active_key"));
        }
        let id = self.tables.next_id();
        self.tables.follows.push(Follow {
            id,
            follower_id,
            following_id,
            created_at: Utc::now(),
            deleted_at: None,
        });
        Ok(id)
    }

    fn tombstone_follow(&mut self, follow_id: i32) -> AppResult<usize> {
        let mut touched = 0;
        for follow in self.tables.follows.iter_mut().filter(|f| f.id == follow_id && f.deleted_at.is_none()) {
            follow.deleted_at = Some(Utc::now());
            touched += 1;
        }
        Ok(touched)
    }

    fn find_post(&mut self, post_id: i32) -> AppResult<Option<Post>> {
        Ok(self
            .tables
            .posts
            .iter()
            .find(|p| p.id == post_id && p.deleted_at.is_none())
            .cloned())
    }

    fn find_comment(&mut self, comment_id: i32) -> AppResult<Option<Comment>> {
        Ok(self
            .tables
            .comments
            .iter()
            .find(|c| c.id == comment_id && c.deleted_at.is_none())
            .cloned())
    }

    fn insert_post(&mut self, post: &NewPost) -> AppResult<Post> {
        let id = self.tables.next_id();
        let now = Utc::now();
        let row = Post {
            id,
            user_id: post.user_id,
            content: post.content.clone(),
            has_image: post.has_image,
            has_tag: post.has_tag,
            has_hashtag: post.has_hashtag,
            image_url: post.image_url.clone(),
            like_count: 0,
            comment_count: 0,
            is_quote: post.is_quote,
            quote_lines: post.quote_lines.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.tables.posts.push(row.clone());
        Ok(row)
    }

    fn insert_comment(&mut self, comment: &NewComment) -> AppResult<Comment> {
        let id = self.tables.next_id();
        let now = Utc::now();
        let row = Comment {
            id,
            user_id: comment.user_id,
            post_id: comment.post_id,
            parent_comment_id: comment.parent_comment_id,
            comment_type: comment.comment_type.clone(),
            content: comment.content.clone(),
            contains_tag: comment.contains_tag,
            contains_hashtag: comment.contains_hashtag,
            like_count: 0,
            comment_count: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.tables.comments.push(row.clone());
        Ok(row)
    }

    fn tombstone_post(&mut self, post_id: i32) -> AppResult<usize> {
        let mut touched = 0;
        for post in self.tables.posts.iter_mut().filter(|p| p.id == post_id && p.deleted_at.is_none()) {
            post.deleted_at = Some(Utc::now());
            touched += 1;
        }
        Ok(touched)
    }

    fn tombstone_comment(&mut self, comment_id: i32) -> AppResult<usize> {
        let mut touched = 0;
        for comment in self.tables.comments.iter_mut().filter(|c| c.id == comment_id && c.deleted_at.is_none()) {
            comment.deleted_at = Some(Utc::now());
            touched += 1;
        }
        Ok(touched)
    }

    fn adjust_comment_count(&mut self, parent: CommentParent, delta: i32) -> AppResult<usize> {
        let mut touched = 0;
        match parent {
            CommentParent::Post(id) => {
                for post in self.tables.posts.iter_mut().filter(|p| p.id == id && p.deleted_at.is_none()) {
                    post.comment_count += delta;
                    touched += 1;
                }
            }
            CommentParent::Comment(id) => {
                for comment in self.tables.comments.iter_mut().filter(|c| c.id == id && c.deleted_at.is_none()) {
                    comment.comment_count += delta;
                    touched += 1;
                }
            }
        }
        Ok(touched)
    }

    fn upsert_hashtag(&mut self, name: &str, bump: bool) -> AppResult<i32> {
        let step = i32::from(bump);
        if let Some(tag) = self.tables.hashtags.iter_mut().find(|h| h.name == name) {
            tag.counter += step;
            tag.deleted_at = None;
            tag.updated_at = Utc::now();
            return Ok(tag.id);
        }
        let id = self.tables.next_id();
        let now = Utc::now();
        self.tables.hashtags.push(Hashtag {
            id,
            name: name.to_string(),
            counter: step,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        });
        Ok(id)
    }

    fn link_post_hashtag(&mut self, post_id: i32, hashtag_id: i32) -> AppResult<()> {
        self.tables.post_hashtags.insert((post_id, hashtag_id));
        Ok(())
    }

    fn link_post_tag(&mut self, post_id: i32, user_id: i32) -> AppResult<()> {
        self.tables.post_tags.insert((post_id, user_id));
        Ok(())
    }

    fn link_comment_hashtag(&mut self, comment_id: i32, hashtag_id: i32) -> AppResult<()> {
        self.tables.comment_hashtags.insert((comment_id, hashtag_id));
        Ok(())
    }

    fn link_comment_tag(&mut self, comment_id: i32, user_id: i32) -> AppResult<()> {
        self.tables.comment_tags.insert((comment_id, user_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_transaction_leaves_no_rows() {
        let store = MemoryStore::new();
        let alice = store.add_user("alice");

        let result: AppResult<()> = store.transaction(|tx| {
            tx.insert_post(&NewPost {
                user_id: alice,
                content: "draft".into(),
                has_image: false,
                has_tag: false,
                has_hashtag: false,
                image_url: None,
                is_quote: false,
                quote_lines: None,
            })?;
            Err(AppError::internal("boom"))
        });

        assert!(result.is_err());
        assert!(store.snapshot().posts.is_empty());
    }

    #[test]
    fn second_active_like_on_same_key_violates_uniqueness() {
        let store = MemoryStore::new();
        let alice = store.add_user("alice");

        let result = store.transaction(|tx| {
            tx.insert_like(alice, LikeTarget::Post(99))?;
            tx.insert_like(alice, LikeTarget::Post(99))
        });

        let err = result.unwrap_err();
        assert!(matches!(&err, AppError::Database(e) if sinkedin_shared::errors::is_unique_violation(e)));
        assert!(store.snapshot().likes.is_empty());
    }

    #[test]
    fn tombstoned_like_does_not_block_a_new_one() {
        let store = MemoryStore::new();
        let alice = store.add_user("alice");

        store
            .transaction(|tx| {
                let id = tx.insert_like(alice, LikeTarget::Comment(5))?;
                tx.tombstone_like(id)?;
                tx.insert_like(alice, LikeTarget::Comment(5))
            })
            .unwrap();

        assert_eq!(store.snapshot().likes.len(), 2);
        assert_eq!(store.snapshot().active_likes(LikeTarget::Comment(5)), 1);
    }
}
