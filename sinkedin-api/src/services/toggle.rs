use std::sync::Arc;

use metrics::counter;
use serde::Serialize;

use sinkedin_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::LikeTarget;
use crate::services::counters::{self, DECREMENT, INCREMENT};
use crate::store::{Store, StoreTx};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleOutcome {
    Created,
    Removed,
}

impl ToggleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleOutcome::Created => "created",
            ToggleOutcome::Removed => "removed",
        }
    }
}

/// Create-or-remove by unique key, with the paired counter adjustment, as
/// one transaction. A concurrent duplicate create loses on the store's
/// unique index and the whole toggle rolls back.
pub struct ToggleEngine<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for ToggleEngine<S> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone() }
    }
}

impl<S: Store> ToggleEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn toggle_like(&self, user_id: i32, target: LikeTarget) -> AppResult<ToggleOutcome> {
        let outcome = self.store.transaction(|tx| {
            if !tx.like_target_exists(target)? {
                return Err(match target {
                    LikeTarget::Post(_) => AppError::new(ErrorCode::PostNotFound, "post not found"),
                    LikeTarget::Comment(_) => AppError::new(ErrorCode::CommentNotFound, "comment not found"),
                });
            }

            match tx.find_active_like(user_id, target)? {
                None => place_like(tx, user_id, target),
                Some(like_id) => retract_like(tx, like_id, target),
            }
        });

        record("like", &outcome);
        let outcome = outcome?;
        tracing::info!(
            user_id,
            kind = %target.kind(),
            parent_id = target.id(),
            outcome = outcome.as_str(),
            "like toggled"
        );
        Ok(outcome)
    }

    /// Resolves `username` and rejects self-follows before the toggle
    /// transaction opens.
    pub fn toggle_follow(&self, follower_id: i32, username: &str) -> AppResult<ToggleOutcome> {
        let following_id = self
            .store
            .transaction(|tx| tx.user_id_by_username(username))?
            .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

        if following_id == follower_id {
            return Err(AppError::new(ErrorCode::CannotFollowSelf, "cannot follow yourself"));
        }

        let outcome = self.store.transaction(|tx| {
            match tx.find_active_follow(follower_id, following_id)? {
                None => place_follow(tx, follower_id, following_id),
                Some(follow_id) => retract_follow(tx, follow_id, follower_id, following_id),
            }
        });

        record("follow", &outcome);
        let outcome = outcome?;
        tracing::info!(
            follower_id,
            following_id,
            outcome = outcome.as_str(),
            "follow toggled"
        );
        Ok(outcome)
    }
}

/// Create arm of a like toggle. A concurrent create of the same key fails
/// on the active-like unique index.
pub fn place_like(tx: &mut dyn StoreTx, user_id: i32, target: LikeTarget) -> AppResult<ToggleOutcome> {
    tx.insert_like(user_id, target)?;
    counters::apply_like(tx, target, INCREMENT)?;
    Ok(ToggleOutcome::Created)
}

/// Remove arm of a like toggle. A concurrent removal of the same row leaves
/// nothing to tombstone and fails before the counter moves.
pub fn retract_like(tx: &mut dyn StoreTx, like_id: i32, target: LikeTarget) -> AppResult<ToggleOutcome> {
    counters::expect_removed(tx.tombstone_like(like_id)?)?;
    counters::apply_like(tx, target, DECREMENT)?;
    Ok(ToggleOutcome::Removed)
}

pub fn place_follow(tx: &mut dyn StoreTx, follower_id: i32, following_id: i32) -> AppResult<ToggleOutcome> {
    tx.insert_follow(follower_id, following_id)?;
    counters::apply_follow(tx, follower_id, following_id, INCREMENT)?;
    Ok(ToggleOutcome::Created)
}

pub fn retract_follow(
    tx: &mut dyn StoreTx,
    follow_id: i32,
    follower_id: i32,
    following_id: i32,
) -> AppResult<ToggleOutcome> {
    counters::expect_removed(tx.tombstone_follow(follow_id)?)?;
    counters::apply_follow(tx, follower_id, following_id, DECREMENT)?;
    Ok(ToggleOutcome::Removed)
}

fn record(kind: &'static str, outcome: &AppResult<ToggleOutcome>) {
    let label = match outcome {
        Ok(o) => o.as_str(),
        Err(_) => "failed",
    };
    counter!("engagement_toggles_total", "kind" => kind, "outcome" => label).increment(1);
}
