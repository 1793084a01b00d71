//! Post like repository.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::entities::{PostLike, post_like};
use pingoo_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect, sea_query::OnConflict,
};

/// Post like repository for database operations.
#[derive(Clone)]
pub struct PostLikeRepository {
    db: Arc<DatabaseConnection>,
}

impl PostLikeRepository {
    /// Create a new post like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Check if a user has liked a post.
    pub async fn exists(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        let count = PostLike::find()
            .filter(post_like::Column::UserId.eq(user_id))
            .filter(post_like::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// Remove the like edge for a pair. Returns the number of rows removed.
    pub async fn delete_pair<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
        post_id: &str,
    ) -> AppResult<u64> {
        let result = PostLike::delete_many()
            .filter(post_like::Column::UserId.eq(user_id))
            .filter(post_like::Column::PostId.eq(post_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Insert the like edge unless the pair already exists.
    ///
    /// Returns `false` when a concurrent insert won the unique index.
    pub async fn insert_if_absent<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: post_like::ActiveModel,
    ) -> AppResult<bool> {
        let inserted = PostLike::insert(model)
            .on_conflict(
                OnConflict::columns([post_like::Column::PostId, post_like::Column::UserId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(inserted > 0)
    }

    /// Count likes on a post.
    pub async fn count_by_post(&self, post_id: &str) -> AppResult<u64> {
        PostLike::find()
            .filter(post_like::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count likes for each of the given posts.
    pub async fn count_by_posts(&self, post_ids: &[String]) -> AppResult<HashMap<String, u64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(String, i64)> = PostLike::find()
            .select_only()
            .column(post_like::Column::PostId)
            .column_as(post_like::Column::Id.count(), "count")
            .filter(post_like::Column::PostId.is_in(post_ids.to_vec()))
            .group_by(post_like::Column::PostId)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, count.unsigned_abs()))
            .collect())
    }

    /// Of the given posts, the ones `user_id` has liked.
    pub async fn liked_post_ids(
        &self,
        user_id: &str,
        post_ids: &[String],
    ) -> AppResult<HashSet<String>> {
        if post_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<String> = PostLike::find()
            .select_only()
            .column(post_like::Column::PostId)
            .filter(post_like::Column::UserId.eq(user_id))
            .filter(post_like::Column::PostId.is_in(post_ids.to_vec()))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(ids.into_iter().collect())
    }

    /// Delete every like on the given posts.
    pub async fn delete_by_posts<C: ConnectionTrait>(
        &self,
        conn: &C,
        post_ids: &[String],
    ) -> AppResult<u64> {
        if post_ids.is_empty() {
            return Ok(0);
        }

        let result = PostLike::delete_many()
            .filter(post_like::Column::PostId.is_in(post_ids.to_vec()))
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
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    #[tokio::test]
    async fn test_delete_pair_reports_removed_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = PostLikeRepository::new(Arc::clone(&db));
        let removed = repo.delete_pair(db.as_ref(), "user1", "post1").await.unwrap();

        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn test_insert_if_absent_on_conflict() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = PostLikeRepository::new(Arc::clone(&db));
        let model = post_like::ActiveModel {
            id: Set("like1".to_string()),
            user_id: Set("user1".to_string()),
            post_id: Set("post1".to_string()),
            created_at: Set(Utc::now().into()),
        };
        let inserted = repo.insert_if_absent(db.as_ref(), model).await.unwrap();

        assert!(!inserted);
    }

    #[tokio::test]
    async fn test_liked_post_ids_empty_input() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = PostLikeRepository::new(db);
        let liked = repo.liked_post_ids("user1", &[]).await.unwrap();

        assert!(liked.is_empty());
    }
}
