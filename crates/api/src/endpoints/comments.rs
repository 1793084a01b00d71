//! Comment endpoints.

use axum::{Json, Router, extract::State, routing::post};
use pingoo_common::AppResult;
use pingoo_core::{CommentInput, CommentView};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, OkResponse, StatusResponse},
};

/// Comment response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub post_id: String,
    pub user_id: String,
    pub content: String,
    pub like_count: u64,
    pub is_liked: bool,
}

impl From<CommentView> for CommentResponse {
    fn from(v: CommentView) -> Self {
        Self {
            id: v.comment.id,
            created_at: v.comment.created_at.to_rfc3339(),
            updated_at: v.comment.updated_at.to_rfc3339(),
            post_id: v.comment.post_id,
            user_id: v.comment.user_id,
            content: v.comment.content,
            like_count: v.like_count,
            is_liked: v.is_liked,
        }
    }
}

/// Create comment request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub post_id: String,
    pub content: String,
}

/// Update comment request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentRequest {
    pub comment_id: String,
    pub content: String,
}

/// Request naming one comment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentIdRequest {
    pub comment_id: String,
}

/// List comments request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCommentsRequest {
    pub post_id: String,
    pub limit: Option<u64>,
    pub until_id: Option<String>,
}

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let view = state
        .comment_service
        .add(
            &user.id,
            &req.post_id,
            CommentInput {
                content: req.content,
            },
        )
        .await?;

    Ok(ApiResponse::created(view.into()))
}

async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateCommentRequest>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let view = state
        .comment_service
        .update(
            &user.id,
            &req.comment_id,
            CommentInput {
                content: req.content,
            },
        )
        .await?;

    Ok(ApiResponse::ok(view.into()))
}

async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CommentIdRequest>,
) -> AppResult<ApiResponse<OkResponse>> {
    state
        .comment_service
        .delete(&user.id, &req.comment_id)
        .await?;

    Ok(ApiResponse::ok(OkResponse { ok: true }))
}

/// Toggle liking a comment.
async fn like(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CommentIdRequest>,
) -> AppResult<ApiResponse<StatusResponse>> {
    let result = state
        .comment_service
        .like(&user.id, &req.comment_id)
        .await?;

    Ok(ApiResponse::ok(StatusResponse {
        status: result.as_str(),
    }))
}

async fn list(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListCommentsRequest>,
) -> AppResult<ApiResponse<Vec<CommentResponse>>> {
    let page = state.page(req.limit, req.until_id);
    let views = state
        .comment_service
        .list(viewer.id(), &req.post_id, &page)
        .await?;

    Ok(ApiResponse::ok(views.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/update", post(update))
        .route("/delete", post(delete))
        .route("/like", post(like))
        .route("/list", post(list))
}
