use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;

use sinkedin_shared::clients::db::{checkout, DbPool};
use sinkedin_shared::errors::{AppError, AppResult};

use crate::models::{
    Comment, CommentParent, LikeTarget, NewComment, NewCommentHashtag, NewCommentTag, NewFollow,
    NewHashtag, NewLike, NewPost, NewPostHashtag, NewPostTag, Post,
};
use crate::schema::{
    comment_hashtags, comment_tags, comments, follows, hashtags, likes, post_hashtags, post_tags,
    posts, users,
};

use super::{Store, StoreTx};

/// Postgres-backed store. Owns a handle to the pool it was built with.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl Store for PgStore {
    fn transaction<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut dyn StoreTx) -> AppResult<T>,
    {
        let mut pooled = checkout(&self.pool)?;
        let conn: &mut PgConnection = &mut pooled;
        conn.transaction::<T, AppError, _>(|conn| {
            let mut tx = PgTx { conn };
            f(&mut tx)
        })
    }
}

struct PgTx<'c> {
    conn: &'c mut PgConnection,
}

const NO_TOMBSTONE: Option<DateTime<Utc>> = None;

impl StoreTx for PgTx<'_> {
    fn user_id_by_username(&mut self, username: &str) -> AppResult<Option<i32>> {
        let id = users::table
            .filter(users::username.eq(username))
            .filter(users::deleted_at.is_null())
            .select(users::id)
            .first::<i32>(self.conn)
            .optional()?;
        Ok(id)
    }

    fn adjust_follow_counts(&mut self, follower_id: i32, following_id: i32, delta: i32) -> AppResult<usize> {
        let following = diesel::update(
            users::table
                .filter(users::id.eq(follower_id))
                .filter(users::deleted_at.is_null()),
        )
        .set(users::following_count.eq(users::following_count + delta))
        .execute(self.conn)?;

        let followers = diesel::update(
            users::table
                .filter(users::id.eq(following_id))
                .filter(users::deleted_at.is_null()),
        )
        .set(users::followers_count.eq(users::followers_count + delta))
        .execute(self.conn)?;

        Ok(following + followers)
    }

    fn like_target_exists(&mut self, target: LikeTarget) -> AppResult<bool> {
        let count: i64 = match target {
            LikeTarget::Post(id) => posts::table
                .filter(posts::id.eq(id))
                .filter(posts::deleted_at.is_null())
                .count()
                .get_result(self.conn)?,
            LikeTarget::Comment(id) => comments::table
                .filter(comments::id.eq(id))
                .filter(comments::deleted_at.is_null())
                .count()
                .get_result(self.conn)?,
        };
        Ok(count > 0)
    }

    fn find_active_like(&mut self, user_id: i32, target: LikeTarget) -> AppResult<Option<i32>> {
        let id = likes::table
            .filter(likes::user_id.eq(user_id))
            .filter(likes::parent_id.eq(target.id()))
            .filter(likes::like_type.eq(target.kind().to_string()))
            .filter(likes::deleted_at.is_null())
            .select(likes::id)
            .first::<i32>(self.conn)
            .optional()?;
        Ok(id)
    }

    fn insert_like(&mut self, user_id: i32, target: LikeTarget) -> AppResult<i32> {
        let new_like = NewLike {
            user_id,
            parent_id: target.id(),
            like_type: target.kind().to_string(),
        };
        let id = diesel::insert_into(likes::table)
            .values(&new_like)
            .returning(likes::id)
            .get_result::<i32>(self.conn)?;
        Ok(id)
    }

    fn tombstone_like(&mut self, like_id: i32) -> AppResult<usize> {
        let touched = diesel::update(
            likes::table
                .filter(likes::id.eq(like_id))
                .filter(likes::deleted_at.is_null()),
        )
        .set(likes::deleted_at.eq(Some(Utc::now())))
        .execute(self.conn)?;
        Ok(touched)
    }

    fn adjust_like_count(&mut self, target: LikeTarget, delta: i32) -> AppResult<usize> {
        let touched = match target {
            LikeTarget::Post(id) => diesel::update(
                posts::table
                    .filter(posts::id.eq(id))
                    .filter(posts::deleted_at.is_null()),
            )
            .set(posts::like_count.eq(posts::like_count + delta))
            .execute(self.conn)?,
            LikeTarget::Comment(id) => diesel::update(
                comments::table
                    .filter(comments::id.eq(id))
                    .filter(comments::deleted_at.is_null()),
            )
            .set(comments::like_count.eq(comments::like_count + delta))
            .execute(self.conn)?,
        };
        Ok(touched)
    }

    fn find_active_follow(&mut self, follower_id: i32, following_id: i32) -> AppResult<Option<i32>> {
        let id = follows::table
            .filter(follows::follower_id.eq(follower_id))
            .filter(follows::following_id.eq(following_id))
            .filter(follows::deleted_at.is_null())
            .select(follows::id)
            .first::<i32>(self.conn)
            .optional()?;
        Ok(id)
    }

    fn insert_follow(&mut self, follower_id: i32, following_id: i32) -> AppResult<i32> {
        let id = diesel::insert_into(follows::table)
            .values(&NewFollow { follower_id, following_id })
            .returning(follows::id)
            .get_result::<i32>(self.conn)?;
        Ok(id)
    }

    fn tombstone_follow(&mut self, follow_id: i32) -> AppResult<usize> {
        let touched = diesel::update(
            follows::table
                .filter(follows::id.eq(follow_id))
                .filter(follows::deleted_at.is_null()),
        )
        .set(follows::deleted_at.eq(Some(Utc::now())))
        .execute(self.conn)?;
        Ok(touched)
    }

    fn find_post(&mut self, post_id: i32) -> AppResult<Option<Post>> {
        let post = posts::table
            .filter(posts::id.eq(post_id))
            .filter(posts::deleted_at.is_null())
            .first::<Post>(self.conn)
            .optional()?;
        Ok(post)
    }

    fn find_comment(&mut self, comment_id: i32) -> AppResult<Option<Comment>> {
        let comment = comments::table
            .filter(comments::id.eq(comment_id))
            .filter(comments::deleted_at.is_null())
            .first::<Comment>(self.conn)
            .optional()?;
        Ok(comment)
    }

    fn insert_post(&mut self, post: &NewPost) -> AppResult<Post> {
        let post = diesel::insert_into(posts::table)
            .values(post)
            .get_result::<Post>(self.conn)?;
        Ok(post)
    }

    fn insert_comment(&mut self, comment: &NewComment) -> AppResult<Comment> {
        let comment = diesel::insert_into(comments::table)
            .values(comment)
            .get_result::<Comment>(self.conn)?;
        Ok(comment)
    }

    fn tombstone_post(&mut self, post_id: i32) -> AppResult<usize> {
        let touched = diesel::update(
            posts::table
                .filter(posts::id.eq(post_id))
                .filter(posts::deleted_at.is_null()),
        )
        .set(posts::deleted_at.eq(Some(Utc::now())))
        .execute(self.conn)?;
        Ok(touched)
    }

    fn tombstone_comment(&mut self, comment_id: i32) -> AppResult<usize> {
        let touched = diesel::update(
            comments::table
                .filter(comments::id.eq(comment_id))
                .filter(comments::deleted_at.is_null()),
        )
        .set(comments::deleted_at.eq(Some(Utc::now())))
        .execute(self.conn)?;
        Ok(touched)
    }

    fn adjust_comment_count(&mut self, parent: CommentParent, delta: i32) -> AppResult<usize> {
        let touched = match parent {
            CommentParent::Post(id) => diesel::update(
                posts::table
                    .filter(posts::id.eq(id))
                    .filter(posts::deleted_at.is_null()),
            )
            .set(posts::comment_count.eq(posts::comment_count + delta))
            .execute(self.conn)?,
            CommentParent::Comment(id) => diesel::update(
                comments::table
                    .filter(comments::id.eq(id))
                    .filter(comments::deleted_at.is_null()),
            )
            .set(comments::comment_count.eq(comments::comment_count + delta))
            .execute(self.conn)?,
        };
        Ok(touched)
    }

    fn upsert_hashtag(&mut self, name: &str, bump: bool) -> AppResult<i32> {
        let step = i32::from(bump);
        // Single statement, so two requests creating the same name cannot race.
        let id = diesel::insert_into(hashtags::table)
            .values(&NewHashtag { name, counter: step })
            .on_conflict(hashtags::name)
            .do_update()
            .set((
                hashtags::counter.eq(hashtags::counter + step),
                hashtags::deleted_at.eq(NO_TOMBSTONE),
                hashtags::updated_at.eq(Utc::now()),
            ))
            .returning(hashtags::id)
            .get_result::<i32>(self.conn)?;
        Ok(id)
    }

    fn link_post_hashtag(&mut self, post_id: i32, hashtag_id: i32) -> AppResult<()> {
        diesel::insert_into(post_hashtags::table)
            .values(&NewPostHashtag { post_id, hashtag_id })
            .on_conflict_do_nothing()
            .execute(self.conn)?;
        Ok(())
    }

    fn link_post_tag(&mut self, post_id: i32, user_id: i32) -> AppResult<()> {
        diesel::insert_into(post_tags::table)
            .values(&NewPostTag { post_id, user_id })
            .on_conflict_do_nothing()
            .execute(self.conn)?;
        Ok(())
    }

    fn link_comment_hashtag(&mut self, comment_id: i32, hashtag_id: i32) -> AppResult<()> {
        diesel::insert_into(comment_hashtags::table)
            .values(&NewCommentHashtag { comment_id, hashtag_id })
            .on_conflict_do_nothing()
            .execute(self.conn)?;
        Ok(())
    }

    fn link_comment_tag(&mut self, comment_id: i32, user_id: i32) -> AppResult<()> {
        diesel::insert_into(comment_tags::table)
            .values(&NewCommentTag { comment_id, user_id })
            .on_conflict_do_nothing()
            .execute(self.conn)?;
        Ok(())
    }
}
