//! Repository integration tests.
//!
//! Each test runs against a fresh in-memory SQLite database with the full
//! migration set applied.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{Duration, Utc};
use pingoo_common::{AppError, IdGenerator};
use pingoo_db::{
    entities::{
        comment, following,
        notification::{self, NotificationType},
        post, post_like, user,
    },
    repositories::{
        CommentRepository, FollowingRepository, NotificationRepository, PostCursor,
        PostLikeRepository, PostRepository, UserRepository,
    },
    test_utils::TestDatabase,
};
use sea_orm::Set;

async fn insert_user(db: &TestDatabase, username: &str) -> user::Model {
    let repo = UserRepository::new(db.shared());
    repo.create(
        db.conn.as_ref(),
        user::ActiveModel {
            id: Set(IdGenerator::new().generate()),
            username: Set(username.to_string()),
            username_lower: Set(username.to_lowercase()),
            email: Set(None),
            first_name: Set(None),
            last_name: Set(None),
            token: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        },
    )
    .await
    .unwrap()
}

fn post_model(user_id: &str, parent_id: Option<&str>, offset_secs: i64) -> post::ActiveModel {
    let at = (Utc::now() + Duration::seconds(offset_secs)).into();
    post::ActiveModel {
        id: Set(IdGenerator::new().generate()),
        user_id: Set(user_id.to_string()),
        content: Set("hello".to_string()),
        media_ref: Set(None),
        parent_id: Set(parent_id.map(str::to_string)),
        is_repost: Set(false),
        original_post_id: Set(None),
        created_at: Set(at),
        updated_at: Set(at),
    }
}

#[tokio::test]
async fn test_migrations_apply_on_sqlite() {
    let db = TestDatabase::new().await.expect("Failed to set up database");
    let users = UserRepository::new(db.shared());

    let alice = insert_user(&db, "Alice").await;
    let found = users.find_by_username("alice").await.unwrap();

    assert_eq!(found.unwrap().id, alice.id);
}

#[tokio::test]
async fn test_follow_edge_is_unique_per_pair() {
    let db = TestDatabase::new().await.unwrap();
    let repo = FollowingRepository::new(db.shared());
    let a = insert_user(&db, "a").await;
    let b = insert_user(&db, "b").await;

    let edge = |id: String| following::ActiveModel {
        id: Set(id),
        follower_id: Set(a.id.clone()),
        followee_id: Set(b.id.clone()),
        created_at: Set(Utc::now().into()),
    };

    let id_gen = IdGenerator::new();
    assert!(repo.insert_if_absent(db.conn.as_ref(), edge(id_gen.generate())).await.unwrap());
    assert!(!repo.insert_if_absent(db.conn.as_ref(), edge(id_gen.generate())).await.unwrap());
    assert_eq!(repo.count_followers(&b.id).await.unwrap(), 1);

    assert_eq!(repo.delete_pair(db.conn.as_ref(), &a.id, &b.id).await.unwrap(), 1);
    assert_eq!(repo.delete_pair(db.conn.as_ref(), &a.id, &b.id).await.unwrap(), 0);
    assert!(!repo.is_following(&a.id, &b.id).await.unwrap());
}

#[tokio::test]
async fn test_keyset_pagination_walks_newest_first() {
    let db = TestDatabase::new().await.unwrap();
    let posts = PostRepository::new(db.shared());
    let author = insert_user(&db, "author").await;

    let mut created = Vec::new();
    for i in 0..5 {
        created.push(
            posts
                .create(db.conn.as_ref(), post_model(&author.id, None, i))
                .await
                .unwrap(),
        );
    }

    let first = posts.find_by_user(&author.id, 2, None).await.unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].id, created[4].id);
    assert_eq!(first[1].id, created[3].id);

    let cursor = PostCursor::from(&first[1]);
    let second = posts.find_public(10, Some(&cursor)).await.unwrap();
    let ids: Vec<String> = second.into_iter().map(|p| p.id).collect();
    assert_eq!(
        ids,
        vec![
            created[2].id.clone(),
            created[1].id.clone(),
            created[0].id.clone()
        ]
    );
}

#[tokio::test]
async fn test_thread_ids_and_reply_counts() {
    let db = TestDatabase::new().await.unwrap();
    let posts = PostRepository::new(db.shared());
    let author = insert_user(&db, "author").await;

    let root = posts
        .create(db.conn.as_ref(), post_model(&author.id, None, 0))
        .await
        .unwrap();
    let reply = posts
        .create(db.conn.as_ref(), post_model(&author.id, Some(&root.id), 1))
        .await
        .unwrap();
    let nested = posts
        .create(db.conn.as_ref(), post_model(&author.id, Some(&reply.id), 2))
        .await
        .unwrap();

    let ids = posts.find_thread_ids(db.conn.as_ref(), &root.id).await.unwrap();
    assert_eq!(ids, vec![root.id.clone(), reply.id.clone(), nested.id.clone()]);

    let counts = posts
        .count_replies(&[root.id.clone(), nested.id.clone()])
        .await
        .unwrap();
    assert_eq!(counts.get(&root.id), Some(&1));
    assert_eq!(counts.get(&nested.id), None);
}

#[tokio::test]
async fn test_like_counts_track_edges() {
    let db = TestDatabase::new().await.unwrap();
    let posts = PostRepository::new(db.shared());
    let likes = PostLikeRepository::new(db.shared());
    let comments = CommentRepository::new(db.shared());
    let author = insert_user(&db, "author").await;
    let fan = insert_user(&db, "fan").await;

    let target = posts
        .create(db.conn.as_ref(), post_model(&author.id, None, 0))
        .await
        .unwrap();

    let like = post_like::ActiveModel {
        id: Set(IdGenerator::new().generate()),
        user_id: Set(fan.id.clone()),
        post_id: Set(target.id.clone()),
        created_at: Set(Utc::now().into()),
    };
    assert!(likes.insert_if_absent(db.conn.as_ref(), like).await.unwrap());

    assert_eq!(likes.count_by_post(&target.id).await.unwrap(), 1);
    assert!(likes.exists(&fan.id, &target.id).await.unwrap());
    let liked = likes
        .liked_post_ids(&fan.id, &[target.id.clone()])
        .await
        .unwrap();
    assert!(liked.contains(&target.id));
    assert!(comments.count_by_posts(&[target.id.clone()]).await.unwrap().is_empty());
}

// IDs are minted before timestamps are taken, so under concurrency a later
// ID can carry an earlier `created_at`.
#[tokio::test]
async fn test_cursor_follows_time_order_when_ids_disagree() {
    let db = TestDatabase::new().await.unwrap();
    let posts = PostRepository::new(db.shared());
    let comments = CommentRepository::new(db.shared());
    let notifications = NotificationRepository::new(db.shared());
    let author = insert_user(&db, "author").await;
    let fan = insert_user(&db, "fan").await;

    let target = posts
        .create(db.conn.as_ref(), post_model(&author.id, None, 0))
        .await
        .unwrap();

    let now = Utc::now();
    let later = now + Duration::milliseconds(1);

    for (id, at) in [("01aaaa", later), ("01bbbb", now)] {
        notifications
            .create(
                db.conn.as_ref(),
                notification::ActiveModel {
                    id: Set(id.to_string()),
                    notifiee_id: Set(author.id.clone()),
                    notifier_id: Set(fan.id.clone()),
                    notification_type: Set(NotificationType::Follow),
                    post_id: Set(None),
                    comment_id: Set(None),
                    is_read: Set(false),
                    created_at: Set(at.into()),
                },
            )
            .await
            .unwrap();

        comments
            .create(
                db.conn.as_ref(),
                comment::ActiveModel {
                    id: Set(id.to_string()),
                    post_id: Set(target.id.clone()),
                    user_id: Set(fan.id.clone()),
                    content: Set("nice".to_string()),
                    created_at: Set(at.into()),
                    updated_at: Set(at.into()),
                },
            )
            .await
            .unwrap();
    }

    let first = notifications
        .find_by_user(&author.id, 1, None, false)
        .await
        .unwrap();
    assert_eq!(first[0].id, "01aaaa");
    let second = notifications
        .find_by_user(&author.id, 1, Some("01aaaa"), false)
        .await
        .unwrap();
    let ids: Vec<String> = second.into_iter().map(|n| n.id).collect();
    assert_eq!(ids, vec!["01bbbb".to_string()]);

    let first = comments.find_by_post(&target.id, 1, None).await.unwrap();
    assert_eq!(first[0].id, "01aaaa");
    let second = comments
        .find_by_post(&target.id, 1, Some("01aaaa"))
        .await
        .unwrap();
    let ids: Vec<String> = second.into_iter().map(|c| c.id).collect();
    assert_eq!(ids, vec!["01bbbb".to_string()]);

    let missing = notifications
        .find_by_user(&author.id, 1, Some("01zzzz"), false)
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
    let missing = comments.find_by_post(&target.id, 1, Some("01zzzz")).await;
    assert!(matches!(missing, Err(AppError::CommentNotFound(_))));
}
