//! Feed service.
//!
//! Feeds are read-only projections of the post table through the follow
//! graph, recomputed on every request.

use pingoo_common::AppResult;
use pingoo_db::repositories::{FollowingRepository, PostRepository, UserRepository};
use tracing::debug;

use crate::services::post::{PostService, PostView};

/// A page request over a newest-first listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Maximum number of items.
    pub limit: u64,
    /// Return only items strictly older than this one.
    pub until_id: Option<String>,
}

impl Page {
    /// The first page of `limit` items.
    #[must_use]
    pub const fn first(limit: u64) -> Self {
        Self {
            limit,
            until_id: None,
        }
    }

    /// The page of `limit` items following `until_id`.
    #[must_use]
    pub fn after(limit: u64, until_id: impl Into<String>) -> Self {
        Self {
            limit,
            until_id: Some(until_id.into()),
        }
    }
}

/// Feed service for business logic.
#[derive(Clone)]
pub struct FeedService {
    post_repo: PostRepository,
    following_repo: FollowingRepository,
    user_repo: UserRepository,
    post_service: PostService,
}

impl FeedService {
    /// Create a new feed service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        following_repo: FollowingRepository,
        user_repo: UserRepository,
        post_service: PostService,
    ) -> Self {
        Self {
            post_repo,
            following_repo,
            user_repo,
            post_service,
        }
    }

    /// Posts by the accounts `viewer_id` follows. The viewer's own posts are
    /// not included.
    pub async fn home(&self, viewer_id: &str, page: &Page) -> AppResult<Vec<PostView>> {
        let followee_ids = self.following_repo.find_followee_ids(viewer_id).await?;
        if followee_ids.is_empty() {
            debug!(user_id = %viewer_id, "Home feed empty: not following anyone");
            return Ok(vec![]);
        }

        let until = self.post_service.resolve_cursor(page).await?;
        let posts = self
            .post_repo
            .find_by_users(&followee_ids, page.limit, until.as_ref())
            .await?;

        self.post_service.views(Some(viewer_id), posts).await
    }

    /// Every post by one account.
    pub async fn profile(
        &self,
        viewer_id: Option<&str>,
        user_id: &str,
        page: &Page,
    ) -> AppResult<Vec<PostView>> {
        self.user_repo.get_by_id(user_id).await?;

        let until = self.post_service.resolve_cursor(page).await?;
        let posts = self
            .post_repo
            .find_by_user(user_id, page.limit, until.as_ref())
            .await?;

        self.post_service.views(viewer_id, posts).await
    }

    /// Every post on the instance.
    pub async fn public(&self, viewer_id: Option<&str>, page: &Page) -> AppResult<Vec<PostView>> {
        let until = self.post_service.resolve_cursor(page).await?;
        let posts = self.post_repo.find_public(page.limit, until.as_ref()).await?;

        self.post_service.views(viewer_id, posts).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pingoo_db::repositories::{
        CommentLikeRepository, CommentRepository, NotificationRepository, PostLikeRepository,
    };
    use pingoo_db::entities::following;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    use crate::services::notification::NotificationService;

    fn service(db: Arc<DatabaseConnection>) -> FeedService {
        let post_service = PostService::new(
            Arc::clone(&db),
            PostRepository::new(Arc::clone(&db)),
            PostLikeRepository::new(Arc::clone(&db)),
            CommentRepository::new(Arc::clone(&db)),
            CommentLikeRepository::new(Arc::clone(&db)),
            NotificationRepository::new(Arc::clone(&db)),
            NotificationService::new(NotificationRepository::new(Arc::clone(&db))),
        );
        FeedService::new(
            PostRepository::new(Arc::clone(&db)),
            FollowingRepository::new(Arc::clone(&db)),
            UserRepository::new(db),
            post_service,
        )
    }

    #[test]
    fn test_page_constructors() {
        assert_eq!(Page::first(20).until_id, None);
        assert_eq!(Page::after(5, "post1").until_id.as_deref(), Some("post1"));
    }

    #[tokio::test]
    async fn test_home_feed_without_followees_is_empty() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<following::Model>::new()])
                .into_connection(),
        );

        let feed = service(db).home("loner", &Page::first(20)).await.unwrap();

        assert!(feed.is_empty());
    }
}
