//! Profile and follow-graph endpoints.

use axum::{Json, Router, extract::State, routing::post};
use pingoo_common::AppResult;
use pingoo_core::{ProfileView, UpdateProfileInput};
use pingoo_db::entities::following;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, StatusResponse},
};

/// Public profile with follow counts.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub created_at: String,
    pub bio: String,
    pub location: String,
    pub website: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_ref: Option<String>,
    pub followers_count: u64,
    pub following_count: u64,
    pub is_following: bool,
}

impl From<ProfileView> for ProfileResponse {
    fn from(v: ProfileView) -> Self {
        Self {
            id: v.user.id,
            username: v.user.username,
            first_name: v.user.first_name,
            last_name: v.user.last_name,
            created_at: v.user.created_at.to_rfc3339(),
            bio: v.profile.bio,
            location: v.profile.location,
            website: v.profile.website,
            birth_date: v.profile.birth_date.map(|d| d.to_string()),
            avatar_ref: v.profile.avatar_ref,
            followers_count: v.followers_count,
            following_count: v.following_count,
            is_following: v.is_following,
        }
    }
}

/// Follow edge response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowEdgeResponse {
    pub id: String,
    pub created_at: String,
    pub follower_id: String,
    pub followee_id: String,
}

impl From<following::Model> for FollowEdgeResponse {
    fn from(f: following::Model) -> Self {
        Self {
            id: f.id,
            created_at: f.created_at.to_rfc3339(),
            follower_id: f.follower_id,
            followee_id: f.followee_id,
        }
    }
}

/// Request naming one user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdRequest {
    pub user_id: String,
}

/// Paginated follow list request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowListRequest {
    pub user_id: String,
    pub limit: Option<u64>,
    pub until_id: Option<String>,
}

async fn show(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let view = state
        .user_service
        .get_profile(&req.user_id, viewer.id())
        .await?;

    Ok(ApiResponse::ok(view.into()))
}

async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let view = state.user_service.update_profile(&user.id, req).await?;

    Ok(ApiResponse::ok(view.into()))
}

/// Toggle following a user.
async fn follow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<StatusResponse>> {
    let result = state
        .following_service
        .follow(&user.id, &req.user_id)
        .await?;

    Ok(ApiResponse::ok(StatusResponse {
        status: result.as_str(),
    }))
}

async fn followers(
    State(state): State<AppState>,
    Json(req): Json<FollowListRequest>,
) -> AppResult<ApiResponse<Vec<FollowEdgeResponse>>> {
    let page = state.page(req.limit, req.until_id);
    let edges = state
        .following_service
        .followers(&req.user_id, page.limit, page.until_id.as_deref())
        .await?;

    Ok(ApiResponse::ok(edges.into_iter().map(Into::into).collect()))
}

async fn following(
    State(state): State<AppState>,
    Json(req): Json<FollowListRequest>,
) -> AppResult<ApiResponse<Vec<FollowEdgeResponse>>> {
    let page = state.page(req.limit, req.until_id);
    let edges = state
        .following_service
        .following(&req.user_id, page.limit, page.until_id.as_deref())
        .await?;

    Ok(ApiResponse::ok(edges.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/show", post(show))
        .route("/update", post(update))
        .route("/follow", post(follow))
        .route("/followers", post(followers))
        .route("/following", post(following))
}
