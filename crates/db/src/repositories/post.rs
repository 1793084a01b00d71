//! Post repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{Post, post};
use pingoo_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, prelude::DateTimeWithTimeZone, sea_query::Expr,
};

/// Keyset position in a newest-first post listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCursor {
    /// Creation time of the last post already returned.
    pub created_at: DateTimeWithTimeZone,
    /// ID of the last post already returned (tie-breaker).
    pub id: String,
}

impl From<&post::Model> for PostCursor {
    fn from(post: &post::Model) -> Self {
        Self {
            created_at: post.created_at,
            id: post.id.clone(),
        }
    }
}

/// Order `(created_at DESC, id DESC)` and continue strictly after `until`.
fn newest_first(query: Select<Post>, until: Option<&PostCursor>, limit: u64) -> Select<Post> {
    let query = match until {
        Some(cursor) => query.filter(
            Condition::any()
                .add(post::Column::CreatedAt.lt(cursor.created_at))
                .add(
                    Condition::all()
                        .add(post::Column::CreatedAt.eq(cursor.created_at))
                        .add(post::Column::Id.lt(cursor.id.as_str())),
                ),
        ),
        None => query,
    };

    query
        .order_by_desc(post::Column::CreatedAt)
        .order_by_desc(post::Column::Id)
        .limit(limit)
}

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Create a new post on the given connection.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: post::ActiveModel,
    ) -> AppResult<post::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a post.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All posts, newest first.
    pub async fn find_public(
        &self,
        limit: u64,
        until: Option<&PostCursor>,
    ) -> AppResult<Vec<post::Model>> {
        newest_first(Post::find(), until, limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Posts authored by one user, newest first.
    pub async fn find_by_user(
        &self,
        user_id: &str,
        limit: u64,
        until: Option<&PostCursor>,
    ) -> AppResult<Vec<post::Model>> {
        newest_first(
            Post::find().filter(post::Column::UserId.eq(user_id)),
            until,
            limit,
        )
        .all(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Posts authored by any of `user_ids`, newest first.
    pub async fn find_by_users(
        &self,
        user_ids: &[String],
        limit: u64,
        until: Option<&PostCursor>,
    ) -> AppResult<Vec<post::Model>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        newest_first(
            Post::find().filter(post::Column::UserId.is_in(user_ids.to_vec())),
            until,
            limit,
        )
        .all(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Direct replies to a post, newest first.
    pub async fn find_replies(
        &self,
        post_id: &str,
        limit: u64,
        until: Option<&PostCursor>,
    ) -> AppResult<Vec<post::Model>> {
        newest_first(
            Post::find().filter(post::Column::ParentId.eq(post_id)),
            until,
            limit,
        )
        .all(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count direct replies for each of the given posts.
    ///
    /// Posts without replies are absent from the map.
    pub async fn count_replies(&self, post_ids: &[String]) -> AppResult<HashMap<String, u64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(String, i64)> = Post::find()
            .select_only()
            .column(post::Column::ParentId)
            .column_as(post::Column::Id.count(), "count")
            .filter(post::Column::ParentId.is_in(post_ids.to_vec()))
            .group_by(post::Column::ParentId)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, count.unsigned_abs()))
            .collect())
    }

    /// Count live reposts for each of the given posts.
    ///
    /// Orphaned reposts have no original and are never counted.
    pub async fn count_reposts(&self, post_ids: &[String]) -> AppResult<HashMap<String, u64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(String, i64)> = Post::find()
            .select_only()
            .column(post::Column::OriginalPostId)
            .column_as(post::Column::Id.count(), "count")
            .filter(post::Column::IsRepost.eq(true))
            .filter(post::Column::OriginalPostId.is_in(post_ids.to_vec()))
            .group_by(post::Column::OriginalPostId)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, count.unsigned_abs()))
            .collect())
    }

    /// Collect the IDs of a post and its whole reply tree, root first.
    pub async fn find_thread_ids<C: ConnectionTrait>(
        &self,
        conn: &C,
        root_id: &str,
    ) -> AppResult<Vec<String>> {
        let mut ids = vec![root_id.to_string()];
        let mut frontier = ids.clone();

        while !frontier.is_empty() {
            let children: Vec<String> = Post::find()
                .select_only()
                .column(post::Column::Id)
                .filter(post::Column::ParentId.is_in(frontier))
                .into_tuple()
                .all(conn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            ids.extend(children.iter().cloned());
            frontier = children;
        }

        Ok(ids)
    }

    /// Detach reposts from originals that are about to be deleted.
    ///
    /// Returns the number of reposts that became orphaned.
    pub async fn detach_reposts<C: ConnectionTrait>(
        &self,
        conn: &C,
        original_ids: &[String],
    ) -> AppResult<u64> {
        if original_ids.is_empty() {
            return Ok(0);
        }

        let result = Post::update_many()
            .col_expr(
                post::Column::OriginalPostId,
                Expr::value(Option::<String>::None),
            )
            .filter(post::Column::OriginalPostId.is_in(original_ids.to_vec()))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Delete posts by ID on the given connection.
    pub async fn delete_many<C: ConnectionTrait>(&self, conn: &C, ids: &[String]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = Post::delete_many()
            .filter(post::Column::Id.is_in(ids.to_vec()))
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
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_post(id: &str, user_id: &str) -> post::Model {
        let now = Utc::now().into();
        post::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            content: "hello".to_string(),
            media_ref: None,
            parent_id: None,
            is_repost: false,
            original_post_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let post = create_test_post("post1", "user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post.clone()]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo.find_by_id("post1").await.unwrap();

        assert_eq!(result.unwrap().content, "hello");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo.get_by_id("missing").await;

        match result {
            Err(AppError::PostNotFound(id)) => assert_eq!(id, "missing"),
            _ => panic!("Expected PostNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_find_by_users_without_authors_is_empty() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = PostRepository::new(db);
        let result = repo.find_by_users(&[], 20, None).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_detach_reposts_reports_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let repo = PostRepository::new(Arc::clone(&db));
        let detached = repo
            .detach_reposts(db.as_ref(), &["post1".to_string()])
            .await
            .unwrap();

        assert_eq!(detached, 2);
    }

    #[test]
    fn test_cursor_from_post() {
        let post = create_test_post("post1", "user1");
        let cursor = PostCursor::from(&post);

        assert_eq!(cursor.id, "post1");
        assert_eq!(cursor.created_at, post.created_at);
    }
}
