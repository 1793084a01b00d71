//! API endpoints.

mod auth;
mod comments;
mod feed;
mod notifications;
mod posts;
mod profiles;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(feed::router())
        .nest("/auth", auth::router())
        .nest("/profiles", profiles::router())
        .nest("/posts", posts::router())
        .nest("/comments", comments::router())
        .nest("/notifications", notifications::router())
}
