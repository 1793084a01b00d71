//! Notification repository.

use std::sync::Arc;

use crate::entities::{Notification, notification};
use pingoo_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};

/// Notification repository for database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a notification by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<notification::Model>> {
        Notification::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new notification on the given connection.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: notification::ActiveModel,
    ) -> AppResult<notification::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get notifications for a user, newest first.
    ///
    /// Continues strictly after the notification `until_id` in
    /// `(created_at, id)` order.
    pub async fn find_by_user(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
        unread_only: bool,
    ) -> AppResult<Vec<notification::Model>> {
        let mut query = Notification::find()
            .filter(notification::Column::NotifieeId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id);

        if let Some(id) = until_id {
            let cursor = self
                .find_by_id(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Notification: {id}")))?;
            query = query.filter(
                Condition::any()
                    .add(notification::Column::CreatedAt.lt(cursor.created_at))
                    .add(
                        Condition::all()
                            .add(notification::Column::CreatedAt.eq(cursor.created_at))
                            .add(notification::Column::Id.lt(cursor.id)),
                    ),
            );
        }

        if unread_only {
            query = query.filter(notification::Column::IsRead.eq(false));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a notification as read. Returns whether a row changed.
    pub async fn mark_as_read(&self, id: &str) -> AppResult<bool> {
        let result = Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::Id.eq(id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Mark all notifications as read for a user.
    pub async fn mark_all_as_read(&self, user_id: &str) -> AppResult<u64> {
        let result = Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::NotifieeId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Count unread notifications for a user.
    pub async fn count_unread(&self, user_id: &str) -> AppResult<u64> {
        Notification::find()
            .filter(notification::Column::NotifieeId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete notifications that reference any of the given posts or comments.
    pub async fn delete_by_targets<C: ConnectionTrait>(
        &self,
        conn: &C,
        post_ids: &[String],
        comment_ids: &[String],
    ) -> AppResult<u64> {
        if post_ids.is_empty() && comment_ids.is_empty() {
            return Ok(0);
        }

        let mut targets = Condition::any();
        if !post_ids.is_empty() {
            targets = targets.add(notification::Column::PostId.is_in(post_ids.to_vec()));
        }
        if !comment_ids.is_empty() {
            targets = targets.add(notification::Column::CommentId.is_in(comment_ids.to_vec()));
        }

        let result = Notification::delete_many()
            .filter(targets)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::notification::NotificationType;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_notification(id: &str, notifiee_id: &str) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            notifiee_id: notifiee_id.to_string(),
            notifier_id: "user2".to_string(),
            notification_type: NotificationType::Like,
            post_id: Some("post1".to_string()),
            comment_id: None,
            is_read: false,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let notification = create_test_notification("n1", "user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[notification.clone()]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let result = repo.find_by_id("n1").await.unwrap().unwrap();

        assert_eq!(result.notification_type, NotificationType::Like);
        assert_eq!(result.notifiee_id, "user1");
    }

    #[tokio::test]
    async fn test_mark_all_as_read_returns_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                }])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let count = repo.mark_all_as_read("user1").await.unwrap();

        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_mark_as_read_already_read() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        assert!(!repo.mark_as_read("n1").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_by_user_unknown_cursor() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<notification::Model>::new()])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let result = repo.find_by_user("user1", 10, Some("gone"), false).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_by_targets_without_targets() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = NotificationRepository::new(Arc::clone(&db));
        let removed = repo.delete_by_targets(db.as_ref(), &[], &[]).await.unwrap();

        assert_eq!(removed, 0);
    }
}
