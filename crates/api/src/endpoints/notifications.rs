//! Notification endpoints.

use axum::{Json, Router, extract::State, routing::post};
use pingoo_common::AppResult;
use pingoo_db::entities::notification;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, OkResponse},
};

/// List notifications request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsRequest {
    pub limit: Option<u64>,
    /// Cursor for pagination (before this ID)
    pub until_id: Option<String>,
    #[serde(default)]
    pub unread_only: bool,
}

/// Notifications page with the caller's unread total.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: u64,
}

/// Notification response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub created_at: String,
    pub is_read: bool,
    #[serde(rename = "type")]
    pub notification_type: &'static str,
    pub notifier_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<String>,
}

impl From<notification::Model> for NotificationResponse {
    fn from(n: notification::Model) -> Self {
        Self {
            id: n.id,
            created_at: n.created_at.to_rfc3339(),
            is_read: n.is_read,
            notification_type: n.notification_type.as_str(),
            notifier_id: n.notifier_id,
            post_id: n.post_id,
            comment_id: n.comment_id,
        }
    }
}

/// Mark one notification request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub notification_id: String,
}

/// Mark all response.
#[derive(Serialize)]
pub struct MarkAllReadResponse {
    pub count: u64,
}

async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListNotificationsRequest>,
) -> AppResult<ApiResponse<NotificationsListResponse>> {
    let page = state.page(req.limit, req.until_id);
    let notifications = state
        .notification_service
        .list(&user.id, page.limit, page.until_id.as_deref(), req.unread_only)
        .await?;
    let unread_count = state.notification_service.count_unread(&user.id).await?;

    Ok(ApiResponse::ok(NotificationsListResponse {
        notifications: notifications.into_iter().map(Into::into).collect(),
        unread_count,
    }))
}

async fn mark_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<MarkReadRequest>,
) -> AppResult<ApiResponse<OkResponse>> {
    state
        .notification_service
        .mark_read(&user.id, &req.notification_id)
        .await?;

    Ok(ApiResponse::ok(OkResponse { ok: true }))
}

async fn mark_all_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<MarkAllReadResponse>> {
    let count = state.notification_service.mark_all_read(&user.id).await?;

    Ok(ApiResponse::ok(MarkAllReadResponse { count }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/mark-read", post(mark_read))
        .route("/mark-all-read", post(mark_all_read))
}
