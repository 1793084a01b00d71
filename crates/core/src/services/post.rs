//! Post service.
//!
//! Posts, replies and reposts, the post like edge, and the read-time
//! counters that go with them. Counters are never stored; each view is
//! computed from the current edge and post sets.

use std::sync::Arc;

use chrono::Utc;
use pingoo_common::{AppError, AppResult, IdGenerator};
use pingoo_db::{
    entities::{post, post_like},
    repositories::{
        CommentLikeRepository, CommentRepository, NotificationRepository, PostCursor,
        PostLikeRepository, PostRepository,
    },
};
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::Validate;

use crate::services::feed::Page;
use crate::services::notification::{NotificationEvent, NotificationService};

/// Outcome of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeResult {
    Liked,
    Unliked,
}

impl LikeResult {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Liked => "liked",
            Self::Unliked => "unliked",
        }
    }
}

/// Input for creating a post or a reply.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    #[validate(length(max = 280))]
    pub content: String,

    #[validate(length(max = 1024))]
    pub media_ref: Option<String>,

    /// Post being replied to.
    pub parent_id: Option<String>,
}

/// Input for reposting.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RepostInput {
    pub post_id: String,

    /// Optional commentary; may be empty.
    #[validate(length(max = 280))]
    #[serde(default)]
    pub content: String,
}

/// Input for editing a post.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostInput {
    #[validate(length(max = 280))]
    pub content: Option<String>,

    #[validate(length(max = 1024))]
    pub media_ref: Option<String>,
}

/// A post with its derived counters and the viewer's like state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostView {
    pub post: post::Model,
    pub like_count: u64,
    pub reply_count: u64,
    pub repost_count: u64,
    pub comment_count: u64,
    pub is_liked: bool,
}

/// Reject blank content unless the post is a repost.
pub(crate) fn ensure_content(content: &str, allow_empty: bool) -> AppResult<()> {
    if !allow_empty && content.trim().is_empty() {
        return Err(AppError::Validation("content: must not be empty".to_string()));
    }
    Ok(())
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    db: Arc<DatabaseConnection>,
    post_repo: PostRepository,
    post_like_repo: PostLikeRepository,
    comment_repo: CommentRepository,
    comment_like_repo: CommentLikeRepository,
    notification_repo: NotificationRepository,
    notification_service: NotificationService,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        post_repo: PostRepository,
        post_like_repo: PostLikeRepository,
        comment_repo: CommentRepository,
        comment_like_repo: CommentLikeRepository,
        notification_repo: NotificationRepository,
        notification_service: NotificationService,
    ) -> Self {
        Self {
            db,
            post_repo,
            post_like_repo,
            comment_repo,
            comment_like_repo,
            notification_repo,
            notification_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a post, or a reply when `parent_id` is set.
    pub async fn create(&self, author_id: &str, input: CreatePostInput) -> AppResult<PostView> {
        input.validate()?;
        ensure_content(&input.content, false)?;

        if let Some(parent_id) = &input.parent_id {
            self.post_repo.get_by_id(parent_id).await?;
        }

        let now = Utc::now();
        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(author_id.to_string()),
            content: Set(input.content),
            media_ref: Set(input.media_ref),
            parent_id: Set(input.parent_id),
            is_repost: Set(false),
            original_post_id: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let post = self.post_repo.create(self.db.as_ref(), model).await?;
        info!(post_id = %post.id, user_id = %author_id, "Post created");

        Ok(Self::fresh_view(post))
    }

    /// Repost another post, notifying its author.
    pub async fn repost(&self, author_id: &str, input: RepostInput) -> AppResult<PostView> {
        input.validate()?;

        let original = self.post_repo.get_by_id(&input.post_id).await?;
        if original.is_orphaned_repost() {
            return Err(AppError::Validation(
                "Cannot repost a repost whose original was deleted".to_string(),
            ));
        }

        let now = Utc::now();
        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(author_id.to_string()),
            content: Set(input.content),
            media_ref: Set(None),
            parent_id: Set(None),
            is_repost: Set(true),
            original_post_id: Set(Some(original.id.clone())),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let txn = self.db.begin().await?;
        let post = self.post_repo.create(&txn, model).await?;
        self.notification_service
            .fanout(
                &txn,
                NotificationEvent::repost(&original.user_id, author_id, &original.id),
            )
            .await?;
        txn.commit().await?;

        info!(post_id = %post.id, original_post_id = %original.id, user_id = %author_id, "Post reposted");
        Ok(Self::fresh_view(post))
    }

    /// Edit one of the requester's posts.
    pub async fn update(
        &self,
        requester_id: &str,
        post_id: &str,
        input: UpdatePostInput,
    ) -> AppResult<PostView> {
        input.validate()?;

        let post = self.post_repo.get_by_id(post_id).await?;
        if post.user_id != requester_id {
            return Err(AppError::Forbidden("Not the author of this post".to_string()));
        }
        if let Some(content) = &input.content {
            ensure_content(content, post.is_repost)?;
        }

        let mut active: post::ActiveModel = post.into();
        if let Some(content) = input.content {
            active.content = Set(content);
        }
        if let Some(media_ref) = input.media_ref {
            active.media_ref = Set(Some(media_ref));
        }
        active.updated_at = Set(Utc::now().into());

        let post = self.post_repo.update(active).await?;
        debug!(post_id = %post.id, "Post updated");

        self.view(Some(requester_id), post).await
    }

    /// Delete one of the requester's posts with its whole reply tree.
    ///
    /// Comments, like edges and notifications on every removed post go with
    /// it; reposts of removed posts stay but lose their original.
    pub async fn delete(&self, requester_id: &str, post_id: &str) -> AppResult<()> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if post.user_id != requester_id {
            return Err(AppError::Forbidden("Not the author of this post".to_string()));
        }

        let txn = self.db.begin().await?;

        let post_ids = self.post_repo.find_thread_ids(&txn, &post.id).await?;
        let comment_ids = self.comment_repo.find_ids_by_posts(&txn, &post_ids).await?;

        self.notification_repo
            .delete_by_targets(&txn, &post_ids, &comment_ids)
            .await?;
        self.comment_like_repo
            .delete_by_comments(&txn, &comment_ids)
            .await?;
        self.comment_repo.delete_many(&txn, &comment_ids).await?;
        self.post_like_repo.delete_by_posts(&txn, &post_ids).await?;
        let orphaned = self.post_repo.detach_reposts(&txn, &post_ids).await?;
        let deleted = self.post_repo.delete_many(&txn, &post_ids).await?;

        txn.commit().await?;

        info!(
            post_id = %post.id,
            deleted_posts = deleted,
            deleted_comments = comment_ids.len(),
            orphaned_reposts = orphaned,
            "Post deleted"
        );
        Ok(())
    }

    /// Toggle the requester's like on a post.
    ///
    /// Only the transition to liked notifies the post's author.
    pub async fn like(&self, user_id: &str, post_id: &str) -> AppResult<LikeResult> {
        let post = self.post_repo.get_by_id(post_id).await?;

        let txn = self.db.begin().await?;

        if self.post_like_repo.delete_pair(&txn, user_id, post_id).await? > 0 {
            txn.commit().await?;
            debug!(user_id = %user_id, post_id = %post_id, "Post unliked");
            return Ok(LikeResult::Unliked);
        }

        let edge = post_like::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            post_id: Set(post_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        if self.post_like_repo.insert_if_absent(&txn, edge).await? {
            self.notification_service
                .fanout(
                    &txn,
                    NotificationEvent::like_post(&post.user_id, user_id, post_id),
                )
                .await?;
            txn.commit().await?;
            debug!(user_id = %user_id, post_id = %post_id, "Post liked");
            return Ok(LikeResult::Liked);
        }

        // A concurrent like inserted the edge first; this toggle removes it.
        self.post_like_repo
            .delete_pair(&txn, user_id, post_id)
            .await?;
        txn.commit().await?;
        debug!(user_id = %user_id, post_id = %post_id, "Post unliked after concurrent like");

        Ok(LikeResult::Unliked)
    }

    /// Get a post as seen by `viewer_id`.
    pub async fn get(&self, viewer_id: Option<&str>, post_id: &str) -> AppResult<PostView> {
        let post = self.post_repo.get_by_id(post_id).await?;
        self.view(viewer_id, post).await
    }

    /// Direct replies to a post, newest first.
    pub async fn replies(
        &self,
        viewer_id: Option<&str>,
        post_id: &str,
        page: &Page,
    ) -> AppResult<Vec<PostView>> {
        self.post_repo.get_by_id(post_id).await?;
        let until = self.resolve_cursor(page).await?;

        let posts = self
            .post_repo
            .find_replies(post_id, page.limit, until.as_ref())
            .await?;
        self.views(viewer_id, posts).await
    }

    /// Number of likes on a post.
    pub async fn like_count(&self, post_id: &str) -> AppResult<u64> {
        self.post_like_repo.count_by_post(post_id).await
    }

    /// Whether `user_id` has liked a post.
    pub async fn is_liked(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        self.post_like_repo.exists(user_id, post_id).await
    }

    /// Turn a page's `until_id` into a keyset cursor.
    pub(crate) async fn resolve_cursor(&self, page: &Page) -> AppResult<Option<PostCursor>> {
        match &page.until_id {
            Some(id) => {
                let post = self.post_repo.get_by_id(id).await?;
                Ok(Some(PostCursor::from(&post)))
            }
            None => Ok(None),
        }
    }

    /// Build a view for a single post.
    pub async fn view(&self, viewer_id: Option<&str>, post: post::Model) -> AppResult<PostView> {
        let mut views = self.views(viewer_id, vec![post]).await?;
        views
            .pop()
            .ok_or_else(|| AppError::Internal("Post view missing".to_string()))
    }

    /// Build views for a list of posts, preserving order.
    pub async fn views(
        &self,
        viewer_id: Option<&str>,
        posts: Vec<post::Model>,
    ) -> AppResult<Vec<PostView>> {
        let ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();

        let like_counts = self.post_like_repo.count_by_posts(&ids).await?;
        let reply_counts = self.post_repo.count_replies(&ids).await?;
        let repost_counts = self.post_repo.count_reposts(&ids).await?;
        let comment_counts = self.comment_repo.count_by_posts(&ids).await?;
        let liked = match viewer_id {
            Some(viewer) => self.post_like_repo.liked_post_ids(viewer, &ids).await?,
            None => Default::default(),
        };

        Ok(posts
            .into_iter()
            .map(|post| PostView {
                like_count: like_counts.get(&post.id).copied().unwrap_or(0),
                reply_count: reply_counts.get(&post.id).copied().unwrap_or(0),
                repost_count: repost_counts.get(&post.id).copied().unwrap_or(0),
                comment_count: comment_counts.get(&post.id).copied().unwrap_or(0),
                is_liked: liked.contains(&post.id),
                post,
            })
            .collect())
    }

    /// View of a post that was just created.
    const fn fresh_view(post: post::Model) -> PostView {
        PostView {
            post,
            like_count: 0,
            reply_count: 0,
            repost_count: 0,
            comment_count: 0,
            is_liked: false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
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

    fn rows(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn service(db: Arc<DatabaseConnection>) -> PostService {
        PostService::new(
            Arc::clone(&db),
            PostRepository::new(Arc::clone(&db)),
            PostLikeRepository::new(Arc::clone(&db)),
            CommentRepository::new(Arc::clone(&db)),
            CommentLikeRepository::new(Arc::clone(&db)),
            NotificationRepository::new(Arc::clone(&db)),
            NotificationService::new(NotificationRepository::new(db)),
        )
    }

    #[test]
    fn test_ensure_content() {
        assert!(ensure_content("hi", false).is_ok());
        assert!(ensure_content("   ", false).is_err());
        assert!(ensure_content("", true).is_ok());
    }

    #[test]
    fn test_content_length_counts_chars() {
        let input = CreatePostInput {
            content: "ぴ".repeat(280),
            media_ref: None,
            parent_id: None,
        };
        assert!(input.validate().is_ok());

        let input = CreatePostInput {
            content: "a".repeat(281),
            media_ref: None,
            parent_id: None,
        };
        assert!(input.validate().is_err());
    }

    #[tokio::test]
    async fn test_create_rejects_empty_content() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = service(db)
            .create(
                "user1",
                CreatePostInput {
                    content: String::new(),
                    media_ref: None,
                    parent_id: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_reply_to_missing_parent() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let result = service(db)
            .create(
                "user1",
                CreatePostInput {
                    content: "reply".to_string(),
                    media_ref: None,
                    parent_id: Some("missing".to_string()),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_repost_of_orphaned_repost_is_rejected() {
        let mut orphan = create_test_post("post2", "user2");
        orphan.is_repost = true;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[orphan]])
                .into_connection(),
        );

        let result = service(db)
            .repost(
                "user1",
                RepostInput {
                    post_id: "post2".to_string(),
                    content: String::new(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_by_non_author_is_forbidden() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post("post1", "author")]])
                .into_connection(),
        );

        let result = service(db)
            .update(
                "intruder",
                "post1",
                UpdatePostInput {
                    content: Some("mine now".to_string()),
                    media_ref: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_by_non_author_is_forbidden() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post("post1", "author")]])
                .into_connection(),
        );

        let result = service(db).delete("intruder", "post1").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_like_losing_insert_race_unlikes_without_notifying() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post("post1", "author")]])
                .append_exec_results([rows(0), rows(0), rows(1)])
                .into_connection(),
        );

        let result = service(Arc::clone(&db)).like("fan", "post1").await.unwrap();
        assert_eq!(result, LikeResult::Unliked);

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        assert!(!format!("{log:?}").contains("notification"));
    }
}
