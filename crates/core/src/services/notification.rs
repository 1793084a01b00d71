//! Notification service.
//!
//! Every notification in the system is created through [`NotificationService::fanout`],
//! which is the only place self-notifications are suppressed.

use chrono::Utc;
use pingoo_common::{AppError, AppResult, IdGenerator};
use pingoo_db::{
    entities::notification::{self, NotificationType},
    repositories::NotificationRepository,
};
use sea_orm::{ConnectionTrait, Set};
use tracing::debug;

/// An action that may notify another user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    /// Recipient.
    pub to: String,
    /// Actor.
    pub from: String,
    pub kind: NotificationType,
    pub post_id: Option<String>,
    pub comment_id: Option<String>,
}

impl NotificationEvent {
    /// `from` started following `to`.
    #[must_use]
    pub fn follow(to: &str, from: &str) -> Self {
        Self {
            to: to.to_string(),
            from: from.to_string(),
            kind: NotificationType::Follow,
            post_id: None,
            comment_id: None,
        }
    }

    /// `from` liked a post authored by `to`.
    #[must_use]
    pub fn like_post(to: &str, from: &str, post_id: &str) -> Self {
        Self {
            to: to.to_string(),
            from: from.to_string(),
            kind: NotificationType::Like,
            post_id: Some(post_id.to_string()),
            comment_id: None,
        }
    }

    /// `from` liked a comment authored by `to`.
    #[must_use]
    pub fn like_comment(to: &str, from: &str, post_id: &str, comment_id: &str) -> Self {
        Self {
            to: to.to_string(),
            from: from.to_string(),
            kind: NotificationType::Like,
            post_id: Some(post_id.to_string()),
            comment_id: Some(comment_id.to_string()),
        }
    }

    /// `from` commented on a post authored by `to`.
    #[must_use]
    pub fn comment(to: &str, from: &str, post_id: &str, comment_id: &str) -> Self {
        Self {
            to: to.to_string(),
            from: from.to_string(),
            kind: NotificationType::Comment,
            post_id: Some(post_id.to_string()),
            comment_id: Some(comment_id.to_string()),
        }
    }

    /// `from` reposted `original_post_id`, authored by `to`.
    #[must_use]
    pub fn repost(to: &str, from: &str, original_post_id: &str) -> Self {
        Self {
            to: to.to_string(),
            from: from.to_string(),
            kind: NotificationType::Repost,
            post_id: Some(original_post_id.to_string()),
            comment_id: None,
        }
    }

    /// Whether the actor is also the recipient.
    #[must_use]
    pub fn is_self_action(&self) -> bool {
        self.to == self.from
    }
}

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self {
            notification_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Persist a notification for `event` unless it is a self-action.
    ///
    /// Runs on the caller's connection so the notification commits or rolls
    /// back together with the action that triggered it.
    pub async fn fanout<C: ConnectionTrait>(
        &self,
        conn: &C,
        event: NotificationEvent,
    ) -> AppResult<Option<notification::Model>> {
        if event.is_self_action() {
            debug!(kind = event.kind.as_str(), user_id = %event.to, "Suppressed self-notification");
            return Ok(None);
        }

        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            notifiee_id: Set(event.to),
            notifier_id: Set(event.from),
            notification_type: Set(event.kind),
            post_id: Set(event.post_id),
            comment_id: Set(event.comment_id),
            is_read: Set(false),
            created_at: Set(Utc::now().into()),
        };

        let created = self.notification_repo.create(conn, model).await?;
        debug!(
            notification_id = %created.id,
            kind = created.notification_type.as_str(),
            notifiee_id = %created.notifiee_id,
            "Notification created"
        );

        Ok(Some(created))
    }

    /// Get notifications for a user, newest first.
    pub async fn list(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
        unread_only: bool,
    ) -> AppResult<Vec<notification::Model>> {
        self.notification_repo
            .find_by_user(user_id, limit, until_id, unread_only)
            .await
    }

    /// Mark one of the requester's notifications as read.
    pub async fn mark_read(&self, user_id: &str, notification_id: &str) -> AppResult<()> {
        let notification = self
            .notification_repo
            .find_by_id(notification_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification: {notification_id}")))?;

        if notification.notifiee_id != user_id {
            return Err(AppError::Forbidden(
                "Cannot mark another user's notification as read".to_string(),
            ));
        }

        if !self.notification_repo.mark_as_read(notification_id).await? {
            debug!(notification_id = %notification_id, "Notification already read");
        }

        Ok(())
    }

    /// Mark all of a user's notifications as read. Returns how many changed.
    pub async fn mark_all_read(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_all_as_read(user_id).await
    }

    /// Count unread notifications.
    pub async fn count_unread(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(user_id).await
    }
}
