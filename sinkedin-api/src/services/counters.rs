//! Denormalized counter maintenance.
//!
//! Every row that creates or removes a relation moves exactly the counters
//! owned by the two endpoints of that relation, by exactly one, inside the
//! caller's transaction. Nothing here recomputes a counter from a scan.

use sinkedin_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{CommentParent, LikeTarget};
use crate::store::StoreTx;

pub const INCREMENT: i32 = 1;
pub const DECREMENT: i32 = -1;

/// `likeCount` on the liked post or comment.
pub fn apply_like(tx: &mut dyn StoreTx, target: LikeTarget, delta: i32) -> AppResult<()> {
    if tx.adjust_like_count(target, delta)? != 1 {
        return Err(match target {
            LikeTarget::Post(_) => AppError::new(ErrorCode::PostNotFound, "post not found"),
            LikeTarget::Comment(_) => AppError::new(ErrorCode::CommentNotFound, "comment not found"),
        });
    }
    Ok(())
}

/// `followingCount` on the follower and `followersCount` on the followed user.
pub fn apply_follow(tx: &mut dyn StoreTx, follower_id: i32, following_id: i32, delta: i32) -> AppResult<()> {
    if tx.adjust_follow_counts(follower_id, following_id, delta)? != 2 {
        return Err(AppError::new(ErrorCode::UserNotFound, "user not found"));
    }
    Ok(())
}

/// `commentCount` on a new reply's parent. The parent must still be active.
pub fn apply_reply_added(tx: &mut dyn StoreTx, parent: CommentParent) -> AppResult<()> {
    if tx.adjust_comment_count(parent, INCREMENT)? != 1 {
        return Err(parent_not_found(parent));
    }
    Ok(())
}

/// `commentCount` on a removed reply's parent. A tombstoned parent has no
/// live counter left to correct, so zero touched rows is accepted.
pub fn apply_reply_removed(tx: &mut dyn StoreTx, parent: CommentParent) -> AppResult<()> {
    let touched = tx.adjust_comment_count(parent, DECREMENT)?;
    if touched == 0 {
        tracing::debug!(?parent, "reply removed under a tombstoned parent");
    }
    Ok(())
}

/// A removal must tombstone exactly one active row. Zero means a concurrent
/// removal committed first, and the caller's counter step must not run.
pub fn expect_removed(touched: usize) -> AppResult<()> {
    if touched != 1 {
        return Err(AppError::new(
            ErrorCode::TransactionConflict,
            "concurrent update, please retry",
        ));
    }
    Ok(())
}

pub fn parent_not_found(parent: CommentParent) -> AppError {
    match parent {
        CommentParent::Post(_) => AppError::new(ErrorCode::PostNotFound, "post not found"),
        CommentParent::Comment(_) => AppError::new(ErrorCode::CommentNotFound, "parent comment not found"),
    }
}
