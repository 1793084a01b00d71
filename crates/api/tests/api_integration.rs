//! API integration tests.
//!
//! Each test drives the full router, auth middleware included, against a
//! fresh in-memory SQLite database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
    middleware,
};
use pingoo_api::{AppState, auth_middleware, router as api_router};
use pingoo_common::config::FeedConfig;
use pingoo_db::test_utils::TestDatabase;
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    _db: TestDatabase,
}

impl TestApp {
    async fn new() -> Self {
        let db = TestDatabase::new().await.unwrap();
        let state = AppState::new(db.shared(), FeedConfig::default());

        let router = api_router()
            .layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            ))
            .with_state(state);

        Self { router, _db: db }
    }

    async fn call(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .uri(uri)
            .method("POST")
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let response = self
            .router
            .clone()
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Register an account and return `(id, token)`.
    async fn register(&self, username: &str) -> (String, String) {
        let (status, body) = self
            .call(
                "/auth/register",
                None,
                json!({"username": username, "password": "correct horse battery"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        (
            body["data"]["id"].as_str().unwrap().to_string(),
            body["data"]["token"].as_str().unwrap().to_string(),
        )
    }
}

#[tokio::test]
async fn test_register_and_login() {
    let app = TestApp::new().await;
    let (id, token) = app.register("alice").await;

    let (status, body) = app
        .call(
            "/auth/login",
            None,
            json!({"username": "alice", "password": "correct horse battery"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());
    assert_eq!(body["data"]["token"], token.as_str());

    let (status, body) = app
        .call(
            "/auth/login",
            None,
            json!({"username": "alice", "password": "nope nope nope"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_register_with_names_shows_on_profile() {
    let app = TestApp::new().await;

    let (status, body) = app
        .call(
            "/auth/register",
            None,
            json!({
                "username": "ada",
                "password": "correct horse battery",
                "firstName": "Ada",
                "lastName": "Lovelace"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = app
        .call("/profiles/show", None, json!({"userId": id}))
        .await;
    assert_eq!(body["data"]["firstName"], "Ada");
    assert_eq!(body["data"]["lastName"], "Lovelace");

    let (bob_id, _) = app.register("bob").await;
    let (_, body) = app
        .call("/profiles/show", None, json!({"userId": bob_id}))
        .await;
    assert!(body["data"].get("firstName").is_none());
}

#[tokio::test]
async fn test_register_rejects_bad_username() {
    let app = TestApp::new().await;

    let (status, body) = app
        .call(
            "/auth/register",
            None,
            json!({"username": "no spaces", "password": "correct horse battery"}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_logout_rotates_token() {
    let app = TestApp::new().await;
    let (_, token) = app.register("alice").await;

    let (status, body) = app.call("/auth/logout", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ok"], true);

    let (status, _) = app.call("/feed", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_authenticated_routes_require_token() {
    let app = TestApp::new().await;

    for uri in [
        "/feed",
        "/posts/create",
        "/profiles/follow",
        "/notifications/list",
        "/notifications/mark-all-read",
    ] {
        let (status, body) = app.call(uri, None, json!({})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"]["code"], "UNAUTHORIZED", "{uri}");
    }
}

#[tokio::test]
async fn test_follow_post_like_flow() {
    let app = TestApp::new().await;
    let (a_id, a_token) = app.register("alice").await;
    let (b_id, b_token) = app.register("bob").await;

    let (status, body) = app
        .call("/profiles/follow", Some(&a_token), json!({"userId": b_id}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "followed");

    let (status, body) = app
        .call("/posts/create", Some(&b_token), json!({"content": "hello"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let post_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.call("/feed", Some(&a_token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["id"], post_id.as_str());

    let (_, body) = app
        .call("/posts/like", Some(&a_token), json!({"postId": post_id}))
        .await;
    assert_eq!(body["data"]["status"], "liked");

    let (_, body) = app
        .call("/posts/show", Some(&a_token), json!({"postId": post_id}))
        .await;
    assert_eq!(body["data"]["likeCount"], 1);
    assert_eq!(body["data"]["isLiked"], true);
    assert_eq!(body["data"]["comments"], json!([]));

    let (_, body) = app
        .call("/posts/like", Some(&a_token), json!({"postId": post_id}))
        .await;
    assert_eq!(body["data"]["status"], "unliked");

    let (_, body) = app
        .call("/notifications/list", Some(&b_token), json!({}))
        .await;
    let notifications = body["data"]["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0]["type"], "like");
    assert_eq!(notifications[0]["notifierId"], a_id.as_str());
    assert_eq!(notifications[1]["type"], "follow");
    assert_eq!(body["data"]["unreadCount"], 2);

    let (_, body) = app
        .call("/notifications/mark-all-read", Some(&b_token), json!({}))
        .await;
    assert_eq!(body["data"]["count"], 2);
}

#[tokio::test]
async fn test_follow_self_is_bad_request() {
    let app = TestApp::new().await;
    let (id, token) = app.register("alice").await;

    let (status, body) = app
        .call("/profiles/follow", Some(&token), json!({"userId": id}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "SELF_FOLLOW");
}

#[tokio::test]
async fn test_post_validation_and_ownership() {
    let app = TestApp::new().await;
    let (_, a_token) = app.register("alice").await;
    let (_, b_token) = app.register("bob").await;

    let (status, body) = app
        .call(
            "/posts/create",
            Some(&a_token),
            json!({"content": "x".repeat(281)}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (_, body) = app
        .call("/posts/create", Some(&a_token), json!({"content": "mine"}))
        .await;
    let post_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .call("/posts/delete", Some(&b_token), json!({"postId": post_id}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, _) = app
        .call(
            "/posts/update",
            Some(&a_token),
            json!({"postId": post_id, "content": "edited"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call("/posts/delete", Some(&a_token), json!({"postId": post_id}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call("/posts/show", None, json!({"postId": post_id}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "POST_NOT_FOUND");
}

#[tokio::test]
async fn test_repost_and_comments() {
    let app = TestApp::new().await;
    let (_, a_token) = app.register("alice").await;
    let (_, b_token) = app.register("bob").await;

    let (_, body) = app
        .call("/posts/create", Some(&b_token), json!({"content": "original"}))
        .await;
    let post_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .call("/posts/repost", Some(&a_token), json!({"postId": post_id}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["isRepost"], true);
    assert_eq!(body["data"]["originalPostId"], post_id.as_str());

    let (status, body) = app
        .call(
            "/comments/create",
            Some(&a_token),
            json!({"postId": post_id, "content": "nice"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = app
        .call("/comments/like", Some(&b_token), json!({"commentId": comment_id}))
        .await;
    assert_eq!(body["data"]["status"], "liked");

    let (_, body) = app
        .call("/comments/list", None, json!({"postId": post_id}))
        .await;
    assert_eq!(body["data"][0]["likeCount"], 1);

    let (status, body) = app
        .call(
            "/comments/list",
            None,
            json!({"postId": post_id, "untilId": "missing"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "COMMENT_NOT_FOUND");

    let (_, body) = app.call("/posts/show", None, json!({"postId": post_id})).await;
    assert_eq!(body["data"]["repostCount"], 1);
    assert_eq!(body["data"]["commentCount"], 1);
    assert_eq!(body["data"]["comments"][0]["id"], comment_id.as_str());

    let (status, _) = app
        .call("/comments/delete", Some(&b_token), json!({"commentId": comment_id}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_profile_show_counts() {
    let app = TestApp::new().await;
    let (a_id, a_token) = app.register("alice").await;
    let (b_id, _) = app.register("bob").await;

    app.call("/profiles/follow", Some(&a_token), json!({"userId": b_id}))
        .await;

    let (status, body) = app
        .call("/profiles/show", Some(&a_token), json!({"userId": b_id}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "bob");
    assert_eq!(body["data"]["followersCount"], 1);
    assert_eq!(body["data"]["isFollowing"], true);

    let (_, body) = app
        .call("/profiles/followers", None, json!({"userId": b_id}))
        .await;
    assert_eq!(body["data"][0]["followerId"], a_id.as_str());

    let (status, body) = app
        .call(
            "/profiles/update",
            Some(&a_token),
            json!({"bio": "hi", "birthDate": "1990-04-01"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["bio"], "hi");
    assert_eq!(body["data"]["birthDate"], "1990-04-01");
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = TestApp::new().await;
    let (_, token) = app.register("alice").await;

    let (status, _) = app.call("/nonexistent/endpoint", None, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call("/auth/regenerate-token", Some(&token), json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
