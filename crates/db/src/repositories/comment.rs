//! Comment repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{Comment, comment};
use pingoo_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a comment by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<comment::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::CommentNotFound(id.to_string()))
    }

    /// Create a new comment on the given connection.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: comment::ActiveModel,
    ) -> AppResult<comment::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a comment.
    pub async fn update(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Comments on a post, newest first, continuing after comment `until_id`.
    pub async fn find_by_post(
        &self,
        post_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<comment::Model>> {
        let mut query = Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::Id);

        if let Some(id) = until_id {
            let cursor = self.get_by_id(id).await?;
            query = query.filter(
                Condition::any()
                    .add(comment::Column::CreatedAt.lt(cursor.created_at))
                    .add(
                        Condition::all()
                            .add(comment::Column::CreatedAt.eq(cursor.created_at))
                            .add(comment::Column::Id.lt(cursor.id)),
                    ),
            );
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count comments for each of the given posts.
    pub async fn count_by_posts(&self, post_ids: &[String]) -> AppResult<HashMap<String, u64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(String, i64)> = Comment::find()
            .select_only()
            .column(comment::Column::PostId)
            .column_as(comment::Column::Id.count(), "count")
            .filter(comment::Column::PostId.is_in(post_ids.to_vec()))
            .group_by(comment::Column::PostId)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, count.unsigned_abs()))
            .collect())
    }

    /// IDs of all comments on the given posts.
    pub async fn find_ids_by_posts<C: ConnectionTrait>(
        &self,
        conn: &C,
        post_ids: &[String],
    ) -> AppResult<Vec<String>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        Comment::find()
            .select_only()
            .column(comment::Column::Id)
            .filter(comment::Column::PostId.is_in(post_ids.to_vec()))
            .into_tuple()
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete comments by ID on the given connection.
    pub async fn delete_many<C: ConnectionTrait>(&self, conn: &C, ids: &[String]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = Comment::delete_many()
            .filter(comment::Column::Id.is_in(ids.to_vec()))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
