use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use validator::ValidationError;

use sinkedin_shared::errors::{AppError, AppResult, ErrorCode};

use crate::schema::{
    comment_hashtags, comment_tags, comments, follows, hashtags, likes, post_hashtags, post_tags,
    posts, users,
};

// --- User ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone, PartialEq)]
#[diesel(table_name = users)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone_number: Option<String>,
    #[serde(skip_serializing)]
    pub password: String,
    pub bio: Option<String>,
    pub followers_count: i32,
    pub following_count: i32,
    pub dob: Option<NaiveDate>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(rename = "bannerURL")]
    pub banner_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

// --- Post ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone, PartialEq)]
#[diesel(table_name = posts)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i32,
    pub user_id: i32,
    pub content: String,
    pub has_image: bool,
    pub has_tag: bool,
    pub has_hashtag: bool,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    pub like_count: i32,
    pub comment_count: i32,
    pub is_quote: bool,
    pub quote_lines: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Derived flags are fixed here, once, and never recomputed.
#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = posts)]
pub struct NewPost {
    pub user_id: i32,
    pub content: String,
    pub has_image: bool,
    pub has_tag: bool,
    pub has_hashtag: bool,
    pub image_url: Option<String>,
    pub is_quote: bool,
    pub quote_lines: Option<String>,
}

/// Owner edits. Associations and derived flags are not editable.
#[derive(Debug, AsChangeset, Default)]
#[diesel(table_name = posts)]
pub struct UpdatePost {
    pub content: Option<String>,
    pub is_quote: Option<bool>,
    pub quote_lines: Option<String>,
}

// --- Comment ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone, PartialEq)]
#[diesel(table_name = comments)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i32,
    pub user_id: i32,
    pub post_id: Option<i32>,
    pub parent_comment_id: Option<i32>,
    #[serde(rename = "type")]
    pub comment_type: String,
    pub content: String,
    pub contains_tag: bool,
    pub contains_hashtag: bool,
    pub like_count: i32,
    pub comment_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Comment {
    pub fn parent(&self) -> Option<CommentParent> {
        match (self.post_id, self.parent_comment_id) {
            (Some(post_id), None) => Some(CommentParent::Post(post_id)),
            (None, Some(comment_id)) => Some(CommentParent::Comment(comment_id)),
            _ => None,
        }
    }
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = comments)]
pub struct NewComment {
    pub user_id: i32,
    pub post_id: Option<i32>,
    pub parent_comment_id: Option<i32>,
    pub comment_type: String,
    pub content: String,
    pub contains_tag: bool,
    pub contains_hashtag: bool,
}

#[derive(Debug, AsChangeset, Default)]
#[diesel(table_name = comments)]
pub struct UpdateComment {
    pub content: Option<String>,
    pub comment_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentType {
    Normal,
    Gif,
}

impl CommentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentType::Normal => "normal",
            CommentType::Gif => "gif",
        }
    }
}

impl std::str::FromStr for CommentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(CommentType::Normal),
            "gif" => Ok(CommentType::Gif),
            _ => Err(AppError::new(
                ErrorCode::InvalidCommentType,
                format!("unknown comment type: {s}"),
            )),
        }
    }
}

/// What a comment hangs off: a post (top-level) or another comment (reply).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentParent {
    Post(i32),
    Comment(i32),
}

impl CommentParent {
    /// Exactly one of the two references must be present.
    pub fn from_refs(post_id: Option<i32>, parent_comment_id: Option<i32>) -> AppResult<Self> {
        match (post_id, parent_comment_id) {
            (Some(post_id), None) => Ok(CommentParent::Post(post_id)),
            (None, Some(comment_id)) => Ok(CommentParent::Comment(comment_id)),
            (None, None) => Err(AppError::new(
                ErrorCode::InvalidCommentParent,
                "either postId or parentId is required",
            )),
            (Some(_), Some(_)) => Err(AppError::new(
                ErrorCode::InvalidCommentParent,
                "postId and parentId are mutually exclusive",
            )),
        }
    }

    pub fn post_id(&self) -> Option<i32> {
        match self {
            CommentParent::Post(id) => Some(*id),
            CommentParent::Comment(_) => None,
        }
    }

    pub fn parent_comment_id(&self) -> Option<i32> {
        match self {
            CommentParent::Post(_) => None,
            CommentParent::Comment(id) => Some(*id),
        }
    }
}

// --- Hashtag ---

pub const MAX_HASHTAG_LEN: usize = 50;

/// Field rule for the `hashtags` list on create requests: no blank names and
/// nothing wider than the `hashtags.name` column.
pub fn validate_hashtag_names(names: &[String]) -> Result<(), ValidationError> {
    for name in names {
        if name.trim().is_empty() {
            let mut err = ValidationError::new("blank_hashtag");
            err.message = Some("hashtag names must not be blank".into());
            return Err(err);
        }
        if name.chars().count() > MAX_HASHTAG_LEN {
            let mut err = ValidationError::new("hashtag_too_long");
            err.message = Some(format!("hashtag names must be at most {MAX_HASHTAG_LEN} characters").into());
            return Err(err);
        }
    }
    Ok(())
}

#[derive(Debug, Queryable, Identifiable, Serialize, Clone, PartialEq)]
#[diesel(table_name = hashtags)]
#[serde(rename_all = "camelCase")]
pub struct Hashtag {
    pub id: i32,
    pub name: String,
    pub counter: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = hashtags)]
pub struct NewHashtag<'a> {
    pub name: &'a str,
    pub counter: i32,
}

// --- Like ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone, PartialEq)]
#[diesel(table_name = likes)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: i32,
    pub user_id: i32,
    pub parent_id: i32,
    #[serde(rename = "type")]
    pub like_type: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = likes)]
pub struct NewLike {
    pub user_id: i32,
    pub parent_id: i32,
    pub like_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeKind {
    Post,
    Comment,
}

impl std::fmt::Display for LikeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LikeKind::Post => write!(f, "post"),
            LikeKind::Comment => write!(f, "comment"),
        }
    }
}

impl std::str::FromStr for LikeKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(LikeKind::Post),
            "comment" => Ok(LikeKind::Comment),
            _ => Err(AppError::new(ErrorCode::InvalidLikeType, "invalid like type")),
        }
    }
}

/// The liked entity. Only the store adapter flattens this into the untyped
/// `(parent_id, like_type)` storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikeTarget {
    Post(i32),
    Comment(i32),
}

impl LikeTarget {
    pub fn new(kind: LikeKind, id: i32) -> Self {
        match kind {
            LikeKind::Post => LikeTarget::Post(id),
            LikeKind::Comment => LikeTarget::Comment(id),
        }
    }

    pub fn kind(&self) -> LikeKind {
        match self {
            LikeTarget::Post(_) => LikeKind::Post,
            LikeTarget::Comment(_) => LikeKind::Comment,
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            LikeTarget::Post(id) | LikeTarget::Comment(id) => *id,
        }
    }
}

// --- Follow ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone, PartialEq)]
#[diesel(table_name = follows)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub id: i32,
    pub follower_id: i32,
    pub following_id: i32,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = follows)]
pub struct NewFollow {
    pub follower_id: i32,
    pub following_id: i32,
}

// --- Join rows ---

#[derive(Debug, Insertable)]
#[diesel(table_name = post_hashtags)]
pub struct NewPostHashtag {
    pub post_id: i32,
    pub hashtag_id: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = post_tags)]
pub struct NewPostTag {
    pub post_id: i32,
    pub user_id: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comment_tags)]
pub struct NewCommentTag {
    pub comment_id: i32,
    pub user_id: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comment_hashtags)]
pub struct NewCommentHashtag {
    pub comment_id: i32,
    pub hashtag_id: i32,
}

// --- Response views ---

#[derive(Debug, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub user: User,
    pub tags: Vec<User>,
    pub hashtags: Vec<Hashtag>,
}

#[derive(Debug, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: User,
    pub tags: Vec<User>,
    pub hashtags: Vec<Hashtag>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadView {
    #[serde(flatten)]
    pub comment: CommentView,
    /// Nearest parent first.
    pub ancestors: Vec<Comment>,
    pub root_post_id: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeView {
    pub id: i32,
    pub user_id: i32,
    pub parent_id: i32,
    #[serde(rename = "type")]
    pub like_type: String,
    pub created_at: DateTime<Utc>,
    pub user: User,
}
