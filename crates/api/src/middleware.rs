//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use pingoo_common::config::FeedConfig;
use pingoo_core::{
    CommentService, FeedService, FollowingService, NotificationService, Page, PostService,
    UserService,
};
use pingoo_db::repositories::{
    CommentLikeRepository, CommentRepository, FollowingRepository, NotificationRepository,
    PostLikeRepository, PostRepository, UserProfileRepository, UserRepository,
};
use sea_orm::DatabaseConnection;
use tracing::debug;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub following_service: FollowingService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub feed_service: FeedService,
    pub notification_service: NotificationService,
    pub feed_config: FeedConfig,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, feed_config: FeedConfig) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let user_profile_repo = UserProfileRepository::new(Arc::clone(&db));
        let following_repo = FollowingRepository::new(Arc::clone(&db));
        let post_repo = PostRepository::new(Arc::clone(&db));
        let post_like_repo = PostLikeRepository::new(Arc::clone(&db));
        let comment_repo = CommentRepository::new(Arc::clone(&db));
        let comment_like_repo = CommentLikeRepository::new(Arc::clone(&db));
        let notification_repo = NotificationRepository::new(Arc::clone(&db));

        let notification_service = NotificationService::new(notification_repo.clone());
        let user_service = UserService::new(
            Arc::clone(&db),
            user_repo.clone(),
            user_profile_repo,
            following_repo.clone(),
        );
        let following_service = FollowingService::new(
            Arc::clone(&db),
            following_repo.clone(),
            user_repo.clone(),
            notification_service.clone(),
        );
        let post_service = PostService::new(
            Arc::clone(&db),
            post_repo.clone(),
            post_like_repo,
            comment_repo.clone(),
            comment_like_repo.clone(),
            notification_repo.clone(),
            notification_service.clone(),
        );
        let comment_service = CommentService::new(
            db,
            comment_repo,
            comment_like_repo,
            post_repo.clone(),
            notification_repo,
            notification_service.clone(),
        );
        let feed_service =
            FeedService::new(post_repo, following_repo, user_repo, post_service.clone());

        Self {
            user_service,
            following_service,
            post_service,
            comment_service,
            feed_service,
            notification_service,
            feed_config,
        }
    }

    /// Build a page request, clamping the size to the configured bounds.
    #[must_use]
    pub fn page(&self, limit: Option<u64>, until_id: Option<String>) -> Page {
        Page {
            limit: self.feed_config.clamp_limit(limit),
            until_id,
        }
    }
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` into the caller's account and
/// stores it as a request extension. Requests without a valid token pass
/// through anonymously; handlers decide whether that is acceptable.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate_by_token(token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => debug!(error = %e, "Bearer token rejected"),
        }
    }

    next.run(req).await
}
