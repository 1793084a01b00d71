//! Post endpoints.

use axum::{Json, Router, extract::State, routing::post};
use pingoo_common::{AppError, AppResult};
use pingoo_core::{CreatePostInput, PostView, RepostInput, UpdatePostInput};
use serde::{Deserialize, Serialize};

use crate::{
    endpoints::comments::CommentResponse,
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, OkResponse, StatusResponse},
};

/// Post response with read-time counters.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub user_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub is_repost: bool,
    /// `null` for a repost whose original was deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_post_id: Option<String>,
    pub like_count: u64,
    pub reply_count: u64,
    pub repost_count: u64,
    pub comment_count: u64,
    pub is_liked: bool,
}

impl From<PostView> for PostResponse {
    fn from(v: PostView) -> Self {
        Self {
            id: v.post.id,
            created_at: v.post.created_at.to_rfc3339(),
            updated_at: v.post.updated_at.to_rfc3339(),
            user_id: v.post.user_id,
            content: v.post.content,
            media_ref: v.post.media_ref,
            parent_id: v.post.parent_id,
            is_repost: v.post.is_repost,
            original_post_id: v.post.original_post_id,
            like_count: v.like_count,
            reply_count: v.reply_count,
            repost_count: v.repost_count,
            comment_count: v.comment_count,
            is_liked: v.is_liked,
        }
    }
}

/// Convert a list of views.
pub fn to_responses(views: Vec<PostView>) -> Vec<PostResponse> {
    views.into_iter().map(Into::into).collect()
}

/// A post together with its first page of comments.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub comments: Vec<CommentResponse>,
}

/// Request naming one post.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostIdRequest {
    pub post_id: String,
}

/// Update post request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub post_id: String,
    #[serde(flatten)]
    pub changes: UpdatePostInput,
}

/// Replies request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepliesRequest {
    pub post_id: String,
    pub limit: Option<u64>,
    pub until_id: Option<String>,
}

/// Listing request. `following` selects the caller's home feed, `userId` a
/// profile feed; with neither, every post is listed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsRequest {
    #[serde(default)]
    pub following: bool,
    pub user_id: Option<String>,
    pub limit: Option<u64>,
    pub until_id: Option<String>,
}

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreatePostInput>,
) -> AppResult<ApiResponse<PostResponse>> {
    let view = state.post_service.create(&user.id, req).await?;

    Ok(ApiResponse::created(view.into()))
}

async fn repost(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<RepostInput>,
) -> AppResult<ApiResponse<PostResponse>> {
    let view = state.post_service.repost(&user.id, req).await?;

    Ok(ApiResponse::created(view.into()))
}

async fn show(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<PostIdRequest>,
) -> AppResult<ApiResponse<PostDetailResponse>> {
    let view = state.post_service.get(viewer.id(), &req.post_id).await?;
    let comments = state
        .comment_service
        .list(viewer.id(), &req.post_id, &state.page(None, None))
        .await?;

    Ok(ApiResponse::ok(PostDetailResponse {
        post: view.into(),
        comments: comments.into_iter().map(Into::into).collect(),
    }))
}

async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdatePostRequest>,
) -> AppResult<ApiResponse<PostResponse>> {
    let view = state
        .post_service
        .update(&user.id, &req.post_id, req.changes)
        .await?;

    Ok(ApiResponse::ok(view.into()))
}

async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<PostIdRequest>,
) -> AppResult<ApiResponse<OkResponse>> {
    state.post_service.delete(&user.id, &req.post_id).await?;

    Ok(ApiResponse::ok(OkResponse { ok: true }))
}

/// Toggle liking a post.
async fn like(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<PostIdRequest>,
) -> AppResult<ApiResponse<StatusResponse>> {
    let result = state.post_service.like(&user.id, &req.post_id).await?;

    Ok(ApiResponse::ok(StatusResponse {
        status: result.as_str(),
    }))
}

async fn replies(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<RepliesRequest>,
) -> AppResult<ApiResponse<Vec<PostResponse>>> {
    let page = state.page(req.limit, req.until_id);
    let views = state
        .post_service
        .replies(viewer.id(), &req.post_id, &page)
        .await?;

    Ok(ApiResponse::ok(to_responses(views)))
}

async fn list(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListPostsRequest>,
) -> AppResult<ApiResponse<Vec<PostResponse>>> {
    let page = state.page(req.limit, req.until_id);

    let views = if req.following {
        let viewer_id = viewer.id().ok_or(AppError::Unauthorized)?;
        state.feed_service.home(viewer_id, &page).await?
    } else if let Some(user_id) = &req.user_id {
        state
            .feed_service
            .profile(viewer.id(), user_id, &page)
            .await?
    } else {
        state.feed_service.public(viewer.id(), &page).await?
    };

    Ok(ApiResponse::ok(to_responses(views)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/repost", post(repost))
        .route("/show", post(show))
        .route("/update", post(update))
        .route("/delete", post(delete))
        .route("/like", post(like))
        .route("/replies", post(replies))
        .route("/list", post(list))
}
