//! Read-side queries. These never go through the engines and never take
//! part in their transactions; tombstoned rows are filtered everywhere.

use std::collections::{HashMap, HashSet};

use diesel::pg::PgConnection;
use diesel::prelude::*;

use sinkedin_shared::errors::{AppError, AppResult, ErrorCode};
use sinkedin_shared::types::{Paginated, PaginationParams};

use crate::models::{
    Comment, CommentThreadView, CommentView, Hashtag, Like, LikeTarget, LikeView, Post, PostView,
    User,
};
use crate::schema::{
    comment_hashtags, comment_tags, comments, follows, hashtags, likes, post_hashtags, post_tags,
    posts, users,
};

pub const TRENDING_LIMIT: i64 = 10;

// --- users ---

pub fn find_user_by_username(conn: &mut PgConnection, username: &str) -> AppResult<User> {
    users::table
        .filter(users::username.eq(username))
        .filter(users::deleted_at.is_null())
        .first::<User>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))
}

pub fn list_followers(conn: &mut PgConnection, username: &str, page: &PaginationParams) -> AppResult<Vec<User>> {
    let user = find_user_by_username(conn, username)?;
    let (offset, limit) = page.window();

    let followers = follows::table
        .inner_join(users::table.on(users::id.eq(follows::follower_id)))
        .filter(follows::following_id.eq(user.id))
        .filter(follows::deleted_at.is_null())
        .filter(users::deleted_at.is_null())
        .order(follows::created_at.desc())
        .offset(offset)
        .limit(limit)
        .select(users::all_columns)
        .load::<User>(conn)?;
    Ok(followers)
}

pub fn list_following(conn: &mut PgConnection, username: &str, page: &PaginationParams) -> AppResult<Vec<User>> {
    let user = find_user_by_username(conn, username)?;
    let (offset, limit) = page.window();

    let following = follows::table
        .inner_join(users::table.on(users::id.eq(follows::following_id)))
        .filter(follows::follower_id.eq(user.id))
        .filter(follows::deleted_at.is_null())
        .filter(users::deleted_at.is_null())
        .order(follows::created_at.desc())
        .offset(offset)
        .limit(limit)
        .select(users::all_columns)
        .load::<User>(conn)?;
    Ok(following)
}

// --- likes ---

pub fn list_likers(conn: &mut PgConnection, target: LikeTarget, page: &PaginationParams) -> AppResult<Vec<LikeView>> {
    let (offset, limit) = page.window();

    let rows = likes::table
        .inner_join(users::table)
        .filter(likes::parent_id.eq(target.id()))
        .filter(likes::like_type.eq(target.kind().to_string()))
        .filter(likes::deleted_at.is_null())
        .filter(users::deleted_at.is_null())
        .order(likes::created_at.desc())
        .offset(offset)
        .limit(limit)
        .select((likes::all_columns, users::all_columns))
        .load::<(Like, User)>(conn)?;

    Ok(rows
        .into_iter()
        .map(|(like, user)| LikeView {
            id: like.id,
            user_id: like.user_id,
            parent_id: like.parent_id,
            like_type: like.like_type,
            created_at: like.created_at,
            user,
        })
        .collect())
}

// --- hashtags ---

/// All-time top hashtags, computed on read.
pub fn trending_hashtags(conn: &mut PgConnection) -> AppResult<Vec<Hashtag>> {
    let trending = hashtags::table
        .filter(hashtags::deleted_at.is_null())
        .order((hashtags::counter.desc(), hashtags::id.asc()))
        .limit(TRENDING_LIMIT)
        .load::<Hashtag>(conn)?;
    Ok(trending)
}

pub fn hashtag_posts(conn: &mut PgConnection, name: &str, page: &PaginationParams) -> AppResult<Vec<PostView>> {
    let hashtag = hashtags::table
        .filter(hashtags::name.eq(name))
        .filter(hashtags::deleted_at.is_null())
        .first::<Hashtag>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::HashtagNotFound, "hashtag not found"))?;
    let (offset, limit) = page.window();

    let tagged = posts::table
        .inner_join(post_hashtags::table)
        .filter(post_hashtags::hashtag_id.eq(hashtag.id))
        .filter(posts::deleted_at.is_null())
        .order(posts::created_at.desc())
        .offset(offset)
        .limit(limit)
        .select(posts::all_columns)
        .load::<Post>(conn)?;

    with_post_associations(conn, tagged)
}

// --- posts ---

pub fn list_posts(conn: &mut PgConnection, page: &PaginationParams) -> AppResult<Paginated<PostView>> {
    let (offset, limit) = page.window();

    let total: i64 = posts::table
        .filter(posts::deleted_at.is_null())
        .count()
        .get_result(conn)?;

    let rows = posts::table
        .filter(posts::deleted_at.is_null())
        .order(posts::created_at.desc())
        .offset(offset)
        .limit(limit)
        .load::<Post>(conn)?;

    let items = with_post_associations(conn, rows)?;
    Ok(Paginated::new(items, total.max(0) as u64, page))
}

pub fn find_post(conn: &mut PgConnection, post_id: i32) -> AppResult<Post> {
    posts::table
        .filter(posts::id.eq(post_id))
        .filter(posts::deleted_at.is_null())
        .first::<Post>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::PostNotFound, "post not found"))
}

pub fn load_post_view(conn: &mut PgConnection, post_id: i32) -> AppResult<PostView> {
    let post = find_post(conn, post_id)?;
    with_post_associations(conn, vec![post])?
        .pop()
        .ok_or_else(|| AppError::new(ErrorCode::PostNotFound, "post author not found"))
}

/// Attaches author, tagged users and hashtags, preserving the input order.
pub fn with_post_associations(conn: &mut PgConnection, rows: Vec<Post>) -> AppResult<Vec<PostView>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = rows.iter().map(|p| p.id).collect();
    let author_ids: Vec<i32> = rows.iter().map(|p| p.user_id).collect();

    let authors = load_users_by_id(conn, &author_ids)?;

    let tag_rows = post_tags::table
        .inner_join(users::table)
        .filter(post_tags::post_id.eq_any(&ids))
        .filter(users::deleted_at.is_null())
        .select((post_tags::post_id, users::all_columns))
        .load::<(i32, User)>(conn)?;

    let hashtag_rows = post_hashtags::table
        .inner_join(hashtags::table)
        .filter(post_hashtags::post_id.eq_any(&ids))
        .filter(hashtags::deleted_at.is_null())
        .select((post_hashtags::post_id, hashtags::all_columns))
        .load::<(i32, Hashtag)>(conn)?;

    let mut tags = group_by_owner(tag_rows);
    let mut tagged_hashtags = group_by_owner(hashtag_rows);

    Ok(rows
        .into_iter()
        .filter_map(|post| {
            let user = authors.get(&post.user_id)?.clone();
            Some(PostView {
                tags: tags.remove(&post.id).unwrap_or_default(),
                hashtags: tagged_hashtags.remove(&post.id).unwrap_or_default(),
                user,
                post,
            })
        })
        .collect())
}

// --- comments ---

pub fn list_post_comments(conn: &mut PgConnection, post_id: i32, page: &PaginationParams) -> AppResult<Vec<CommentView>> {
    let (offset, limit) = page.window();

    let rows = comments::table
        .filter(comments::post_id.eq(post_id))
        .filter(comments::parent_comment_id.is_null())
        .filter(comments::deleted_at.is_null())
        .order(comments::created_at.desc())
        .offset(offset)
        .limit(limit)
        .load::<Comment>(conn)?;

    with_comment_associations(conn, rows)
}

pub fn find_comment(conn: &mut PgConnection, comment_id: i32) -> AppResult<Option<Comment>> {
    let comment = comments::table
        .filter(comments::id.eq(comment_id))
        .filter(comments::deleted_at.is_null())
        .first::<Comment>(conn)
        .optional()?;
    Ok(comment)
}

pub fn load_comment_view(conn: &mut PgConnection, comment_id: i32) -> AppResult<CommentView> {
    let comment = find_comment(conn, comment_id)?
        .ok_or_else(|| AppError::new(ErrorCode::CommentNotFound, "comment not found"))?;
    with_comment_associations(conn, vec![comment])?
        .pop()
        .ok_or_else(|| AppError::new(ErrorCode::CommentNotFound, "comment author not found"))
}

pub fn load_comment_thread(conn: &mut PgConnection, comment_id: i32) -> AppResult<CommentThreadView> {
    let view = load_comment_view(conn, comment_id)?;
    let (ancestors, root_post_id) = walk_ancestors(
        &view.comment,
        conn,
        |conn, id| find_comment(conn, id),
        |conn, id| post_is_active(conn, id),
    )?;
    Ok(CommentThreadView {
        comment: view,
        ancestors,
        root_post_id,
    })
}

/// Walks parent links one hop at a time, nearest parent first. Returns the
/// chain and the post the thread hangs off, or `None` when a tombstoned
/// ancestor cuts the chain or the post itself is tombstoned.
pub fn walk_ancestors<C, F, P>(
    start: &Comment,
    ctx: &mut C,
    mut fetch: F,
    mut post_active: P,
) -> AppResult<(Vec<Comment>, Option<i32>)>
where
    C: ?Sized,
    F: FnMut(&mut C, i32) -> AppResult<Option<Comment>>,
    P: FnMut(&mut C, i32) -> AppResult<bool>,
{
    let mut ancestors = Vec::new();
    let mut seen = HashSet::from([start.id]);
    let mut root_post_id = start.post_id;
    let mut next = start.parent_comment_id;

    while let Some(id) = next {
        if !seen.insert(id) {
            return Err(AppError::internal(format!("comment thread loops back to {id}")));
        }
        match fetch(ctx, id)? {
            Some(parent) => {
                root_post_id = parent.post_id;
                next = parent.parent_comment_id;
                ancestors.push(parent);
            }
            None => {
                root_post_id = None;
                next = None;
            }
        }
    }

    if let Some(post_id) = root_post_id {
        if !post_active(ctx, post_id)? {
            root_post_id = None;
        }
    }

    Ok((ancestors, root_post_id))
}

fn post_is_active(conn: &mut PgConnection, post_id: i32) -> AppResult<bool> {
    let count: i64 = posts::table
        .filter(posts::id.eq(post_id))
        .filter(posts::deleted_at.is_null())
        .count()
        .get_result(conn)?;
    Ok(count > 0)
}

pub fn with_comment_associations(conn: &mut PgConnection, rows: Vec<Comment>) -> AppResult<Vec<CommentView>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = rows.iter().map(|c| c.id).collect();
    let author_ids: Vec<i32> = rows.iter().map(|c| c.user_id).collect();

    let authors = load_users_by_id(conn, &author_ids)?;

    let tag_rows = comment_tags::table
        .inner_join(users::table)
        .filter(comment_tags::comment_id.eq_any(&ids))
        .filter(users::deleted_at.is_null())
        .select((comment_tags::comment_id, users::all_columns))
        .load::<(i32, User)>(conn)?;

    let hashtag_rows = comment_hashtags::table
        .inner_join(hashtags::table)
        .filter(comment_hashtags::comment_id.eq_any(&ids))
        .filter(hashtags::deleted_at.is_null())
        .select((comment_hashtags::comment_id, hashtags::all_columns))
        .load::<(i32, Hashtag)>(conn)?;

    let mut tags = group_by_owner(tag_rows);
    let mut tagged_hashtags = group_by_owner(hashtag_rows);

    Ok(rows
        .into_iter()
        .filter_map(|comment| {
            let user = authors.get(&comment.user_id)?.clone();
            Some(CommentView {
                tags: tags.remove(&comment.id).unwrap_or_default(),
                hashtags: tagged_hashtags.remove(&comment.id).unwrap_or_default(),
                user,
                comment,
            })
        })
        .collect())
}

fn load_users_by_id(conn: &mut PgConnection, ids: &[i32]) -> AppResult<HashMap<i32, User>> {
    let users = users::table
        .filter(users::id.eq_any(ids))
        .load::<User>(conn)?;
    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}

fn group_by_owner<T>(rows: Vec<(i32, T)>) -> HashMap<i32, Vec<T>> {
    let mut grouped: HashMap<i32, Vec<T>> = HashMap::new();
    for (owner, item) in rows {
        grouped.entry(owner).or_default().push(item);
    }
    grouped
}
