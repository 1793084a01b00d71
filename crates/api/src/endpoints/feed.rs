//! Home feed endpoint.

use axum::{Json, Router, extract::State, routing::post};
use pingoo_common::AppResult;
use serde::Deserialize;

use crate::{
    endpoints::posts::{PostResponse, to_responses},
    extractors::AuthUser,
    middleware::AppState,
    response::ApiResponse,
};

/// Home feed request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRequest {
    pub limit: Option<u64>,
    pub until_id: Option<String>,
}

/// Posts from accounts the caller follows.
async fn home(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FeedRequest>,
) -> AppResult<ApiResponse<Vec<PostResponse>>> {
    let page = state.page(req.limit, req.until_id);
    let views = state.feed_service.home(&user.id, &page).await?;

    Ok(ApiResponse::ok(to_responses(views)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/feed", post(home))
}
