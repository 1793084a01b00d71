//! Comment service.

use std::sync::Arc;

use chrono::Utc;
use pingoo_common::{AppError, AppResult, IdGenerator};
use pingoo_db::{
    entities::{comment, comment_like},
    repositories::{
        CommentLikeRepository, CommentRepository, NotificationRepository, PostRepository,
    },
};
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::Deserialize;
use tracing::{debug, info};
use validator::Validate;

use crate::services::feed::Page;
use crate::services::notification::{NotificationEvent, NotificationService};
use crate::services::post::{LikeResult, ensure_content};

/// Input for writing or editing a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CommentInput {
    #[validate(length(max = 280))]
    pub content: String,
}

/// A comment with its like count and the viewer's like state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentView {
    pub comment: comment::Model,
    pub like_count: u64,
    pub is_liked: bool,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    db: Arc<DatabaseConnection>,
    comment_repo: CommentRepository,
    comment_like_repo: CommentLikeRepository,
    post_repo: PostRepository,
    notification_repo: NotificationRepository,
    notification_service: NotificationService,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        comment_repo: CommentRepository,
        comment_like_repo: CommentLikeRepository,
        post_repo: PostRepository,
        notification_repo: NotificationRepository,
        notification_service: NotificationService,
    ) -> Self {
        Self {
            db,
            comment_repo,
            comment_like_repo,
            post_repo,
            notification_repo,
            notification_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// Comment on a post, notifying its author.
    pub async fn add(
        &self,
        author_id: &str,
        post_id: &str,
        input: CommentInput,
    ) -> AppResult<CommentView> {
        input.validate()?;
        ensure_content(&input.content, false)?;

        let post = self.post_repo.get_by_id(post_id).await?;

        let now = Utc::now();
        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post.id.clone()),
            user_id: Set(author_id.to_string()),
            content: Set(input.content),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let txn = self.db.begin().await?;
        let comment = self.comment_repo.create(&txn, model).await?;
        self.notification_service
            .fanout(
                &txn,
                NotificationEvent::comment(&post.user_id, author_id, &post.id, &comment.id),
            )
            .await?;
        txn.commit().await?;

        info!(comment_id = %comment.id, post_id = %post.id, user_id = %author_id, "Comment created");
        Ok(CommentView {
            comment,
            like_count: 0,
            is_liked: false,
        })
    }

    /// Edit one of the requester's comments.
    pub async fn update(
        &self,
        requester_id: &str,
        comment_id: &str,
        input: CommentInput,
    ) -> AppResult<CommentView> {
        input.validate()?;
        ensure_content(&input.content, false)?;

        let comment = self.comment_repo.get_by_id(comment_id).await?;
        if comment.user_id != requester_id {
            return Err(AppError::Forbidden(
                "Not the author of this comment".to_string(),
            ));
        }

        let mut active: comment::ActiveModel = comment.into();
        active.content = Set(input.content);
        active.updated_at = Set(Utc::now().into());

        let comment = self.comment_repo.update(active).await?;
        debug!(comment_id = %comment.id, "Comment updated");

        let mut views = self.views(Some(requester_id), vec![comment]).await?;
        views
            .pop()
            .ok_or_else(|| AppError::Internal("Comment view missing".to_string()))
    }

    /// Delete one of the requester's comments with its likes and notifications.
    pub async fn delete(&self, requester_id: &str, comment_id: &str) -> AppResult<()> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;
        if comment.user_id != requester_id {
            return Err(AppError::Forbidden(
                "Not the author of this comment".to_string(),
            ));
        }

        let ids = [comment.id.clone()];

        let txn = self.db.begin().await?;
        self.notification_repo
            .delete_by_targets(&txn, &[], &ids)
            .await?;
        self.comment_like_repo.delete_by_comments(&txn, &ids).await?;
        self.comment_repo.delete_many(&txn, &ids).await?;
        txn.commit().await?;

        info!(comment_id = %comment.id, "Comment deleted");
        Ok(())
    }

    /// Toggle the requester's like on a comment.
    pub async fn like(&self, user_id: &str, comment_id: &str) -> AppResult<LikeResult> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;

        let txn = self.db.begin().await?;

        if self
            .comment_like_repo
            .delete_pair(&txn, user_id, comment_id)
            .await?
            > 0
        {
            txn.commit().await?;
            debug!(user_id = %user_id, comment_id = %comment_id, "Comment unliked");
            return Ok(LikeResult::Unliked);
        }

        let edge = comment_like::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            comment_id: Set(comment_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        if self.comment_like_repo.insert_if_absent(&txn, edge).await? {
            self.notification_service
                .fanout(
                    &txn,
                    NotificationEvent::like_comment(
                        &comment.user_id,
                        user_id,
                        &comment.post_id,
                        &comment.id,
                    ),
                )
                .await?;
            txn.commit().await?;
            debug!(user_id = %user_id, comment_id = %comment_id, "Comment liked");
            return Ok(LikeResult::Liked);
        }

        // A concurrent like inserted the edge first; this toggle removes it.
        self.comment_like_repo
            .delete_pair(&txn, user_id, comment_id)
            .await?;
        txn.commit().await?;

        Ok(LikeResult::Unliked)
    }

    /// Comments on a post, newest first.
    pub async fn list(
        &self,
        viewer_id: Option<&str>,
        post_id: &str,
        page: &Page,
    ) -> AppResult<Vec<CommentView>> {
        self.post_repo.get_by_id(post_id).await?;

        let comments = self
            .comment_repo
            .find_by_post(post_id, page.limit, page.until_id.as_deref())
            .await?;
        self.views(viewer_id, comments).await
    }

    async fn views(
        &self,
        viewer_id: Option<&str>,
        comments: Vec<comment::Model>,
    ) -> AppResult<Vec<CommentView>> {
        let ids: Vec<String> = comments.iter().map(|c| c.id.clone()).collect();

        let like_counts = self.comment_like_repo.count_by_comments(&ids).await?;
        let liked = match viewer_id {
            Some(viewer) => {
                self.comment_like_repo
                    .liked_comment_ids(viewer, &ids)
                    .await?
            }
            None => Default::default(),
        };

        Ok(comments
            .into_iter()
            .map(|comment| CommentView {
                like_count: like_counts.get(&comment.id).copied().unwrap_or(0),
                is_liked: liked.contains(&comment.id),
                comment,
            })
            .collect())
    }
}
