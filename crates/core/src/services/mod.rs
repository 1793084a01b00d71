//! Business logic services.

#![allow(missing_docs)]

pub mod comment;
pub mod feed;
pub mod following;
pub mod notification;
pub mod post;
pub mod user;

pub use comment::{CommentInput, CommentService, CommentView};
pub use feed::{FeedService, Page};
pub use following::{FollowResult, FollowingService};
pub use notification::{NotificationEvent, NotificationService};
pub use post::{
    CreatePostInput, LikeResult, PostService, PostView, RepostInput, UpdatePostInput,
};
pub use user::{ProfileView, RegisterInput, UpdateProfileInput, UserService};
