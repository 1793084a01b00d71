//! Database repositories.
//!
//! Read helpers run on the repository's own pooled connection. Mutation
//! helpers that take a `conn: &C` argument accept any [`sea_orm::ConnectionTrait`]
//! so services can compose them inside one transaction.

mod comment;
mod comment_like;
mod following;
mod notification;
mod post;
mod post_like;
mod user;
mod user_profile;

pub use comment::CommentRepository;
pub use comment_like::CommentLikeRepository;
pub use following::FollowingRepository;
pub use notification::NotificationRepository;
pub use post::{PostCursor, PostRepository};
pub use post_like::PostLikeRepository;
pub use user::UserRepository;
pub use user_profile::UserProfileRepository;
