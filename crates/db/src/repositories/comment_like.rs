//! Comment like repository.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::entities::{CommentLike, comment_like};
use pingoo_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
    sea_query::OnConflict,
};

/// Comment like repository for database operations.
#[derive(Clone)]
pub struct CommentLikeRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentLikeRepository {
    /// Create a new comment like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Remove the like edge for a pair. Returns the number of rows removed.
    pub async fn delete_pair<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
        comment_id: &str,
    ) -> AppResult<u64> {
        let result = CommentLike::delete_many()
            .filter(comment_like::Column::UserId.eq(user_id))
            .filter(comment_like::Column::CommentId.eq(comment_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Insert the like edge unless the pair already exists.
    pub async fn insert_if_absent<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: comment_like::ActiveModel,
    ) -> AppResult<bool> {
        let inserted = CommentLike::insert(model)
            .on_conflict(
                OnConflict::columns([
                    comment_like::Column::CommentId,
                    comment_like::Column::UserId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(inserted > 0)
    }

    /// Count likes for each of the given comments.
    pub async fn count_by_comments(
        &self,
        comment_ids: &[String],
    ) -> AppResult<HashMap<String, u64>> {
        if comment_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(String, i64)> = CommentLike::find()
            .select_only()
            .column(comment_like::Column::CommentId)
            .column_as(comment_like::Column::Id.count(), "count")
            .filter(comment_like::Column::CommentId.is_in(comment_ids.to_vec()))
            .group_by(comment_like::Column::CommentId)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, count.unsigned_abs()))
            .collect())
    }

    /// Of the given comments, the ones `user_id` has liked.
    pub async fn liked_comment_ids(
        &self,
        user_id: &str,
        comment_ids: &[String],
    ) -> AppResult<HashSet<String>> {
        if comment_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<String> = CommentLike::find()
            .select_only()
            .column(comment_like::Column::CommentId)
            .filter(comment_like::Column::UserId.eq(user_id))
            .filter(comment_like::Column::CommentId.is_in(comment_ids.to_vec()))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(ids.into_iter().collect())
    }

    /// Delete every like on the given comments.
    pub async fn delete_by_comments<C: ConnectionTrait>(
        &self,
        conn: &C,
        comment_ids: &[String],
    ) -> AppResult<u64> {
        if comment_ids.is_empty() {
            return Ok(0);
        }

        let result = CommentLike::delete_many()
            .filter(comment_like::Column::CommentId.is_in(comment_ids.to_vec()))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
