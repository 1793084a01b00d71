//! User profile repository.

use std::sync::Arc;

use crate::entities::{UserProfile, user_profile};
use pingoo_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait};

/// User profile repository for database operations.
#[derive(Clone)]
pub struct UserProfileRepository {
    db: Arc<DatabaseConnection>,
}

impl UserProfileRepository {
    /// Create a new user profile repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user profile by user ID.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<user_profile::Model>> {
        UserProfile::find_by_id(user_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user profile by user ID, returning an error if not found.
    pub async fn get_by_user_id(&self, user_id: &str) -> AppResult<user_profile::Model> {
        self.find_by_user_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("UserProfile: {user_id}")))
    }

    /// Create a new user profile on the given connection.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: user_profile::ActiveModel,
    ) -> AppResult<user_profile::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a user profile.
    pub async fn update(&self, model: user_profile::ActiveModel) -> AppResult<user_profile::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_profile(user_id: &str) -> user_profile::Model {
        user_profile::Model {
            user_id: user_id.to_string(),
            password: Some("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string()),
            bio: "hello".to_string(),
            location: String::new(),
            website: String::new(),
            birth_date: None,
            avatar_ref: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_user_id() {
        let profile = create_test_profile("user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile.clone()]])
                .into_connection(),
        );

        let repo = UserProfileRepository::new(db);
        let result = repo.find_by_user_id("user1").await.unwrap();

        assert_eq!(result.unwrap().bio, "hello");
    }

    #[tokio::test]
    async fn test_get_by_user_id_missing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user_profile::Model>::new()])
                .into_connection(),
        );

        let repo = UserProfileRepository::new(db);
        let result = repo.get_by_user_id("ghost").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_password_is_never_serialized() {
        let profile = create_test_profile("user1");
        let json = serde_json::to_value(&profile).unwrap();

        assert!(json.get("password").is_none());
        assert_eq!(json["bio"], "hello");
    }
}
