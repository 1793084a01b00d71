//! Following service.

use std::sync::Arc;

use chrono::Utc;
use pingoo_common::{AppError, AppResult, IdGenerator};
use pingoo_db::{
    entities::following,
    repositories::{FollowingRepository, UserRepository},
};
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::Serialize;
use tracing::debug;

use crate::services::notification::{NotificationEvent, NotificationService};

/// Outcome of a follow toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowResult {
    Followed,
    Unfollowed,
}

impl FollowResult {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Followed => "followed",
            Self::Unfollowed => "unfollowed",
        }
    }
}

/// Following service for business logic.
#[derive(Clone)]
pub struct FollowingService {
    db: Arc<DatabaseConnection>,
    following_repo: FollowingRepository,
    user_repo: UserRepository,
    notification_service: NotificationService,
    id_gen: IdGenerator,
}

impl FollowingService {
    /// Create a new following service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        following_repo: FollowingRepository,
        user_repo: UserRepository,
        notification_service: NotificationService,
    ) -> Self {
        Self {
            db,
            following_repo,
            user_repo,
            notification_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// Toggle the follow edge from `follower_id` to `followee_id`.
    ///
    /// Only the transition to following notifies the followee.
    pub async fn follow(&self, follower_id: &str, followee_id: &str) -> AppResult<FollowResult> {
        if follower_id == followee_id {
            return Err(AppError::SelfFollow);
        }

        self.user_repo.get_by_id(followee_id).await?;

        let txn = self.db.begin().await?;

        if self
            .following_repo
            .delete_pair(&txn, follower_id, followee_id)
            .await?
            > 0
        {
            txn.commit().await?;
            debug!(follower_id = %follower_id, followee_id = %followee_id, "Unfollowed");
            return Ok(FollowResult::Unfollowed);
        }

        let edge = following::ActiveModel {
            id: Set(self.id_gen.generate()),
            follower_id: Set(follower_id.to_string()),
            followee_id: Set(followee_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        if self.following_repo.insert_if_absent(&txn, edge).await? {
            self.notification_service
                .fanout(&txn, NotificationEvent::follow(followee_id, follower_id))
                .await?;
            txn.commit().await?;
            debug!(follower_id = %follower_id, followee_id = %followee_id, "Followed");
            return Ok(FollowResult::Followed);
        }

        // A concurrent follow inserted the edge first; this toggle removes it.
        self.following_repo
            .delete_pair(&txn, follower_id, followee_id)
            .await?;
        txn.commit().await?;
        debug!(follower_id = %follower_id, followee_id = %followee_id, "Unfollowed after concurrent follow");

        Ok(FollowResult::Unfollowed)
    }

    /// Check if a user is following another user.
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        self.following_repo
            .is_following(follower_id, followee_id)
            .await
    }

    /// Users following `user_id`, newest edge first.
    pub async fn followers(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<following::Model>> {
        self.user_repo.get_by_id(user_id).await?;
        self.following_repo
            .find_followers(user_id, limit, until_id)
            .await
    }

    /// Users `user_id` follows, newest edge first.
    pub async fn following(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<following::Model>> {
        self.user_repo.get_by_id(user_id).await?;
        self.following_repo
            .find_following(user_id, limit, until_id)
            .await
    }

    /// Count followers of a user.
    pub async fn count_followers(&self, user_id: &str) -> AppResult<u64> {
        self.following_repo.count_followers(user_id).await
    }

    /// Count users a user follows.
    pub async fn count_following(&self, user_id: &str) -> AppResult<u64> {
        self.following_repo.count_following(user_id).await
    }
}
