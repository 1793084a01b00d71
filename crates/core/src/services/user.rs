//! User service.
//!
//! Accounts, credentials and public profiles.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{NaiveDate, Utc};
use pingoo_common::{AppError, AppResult, IdGenerator};
use pingoo_db::{
    entities::{user, user_profile},
    repositories::{FollowingRepository, UserProfileRepository, UserRepository},
};
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::Deserialize;
use tracing::info;
use validator::{Validate, ValidationError};

/// Input for creating a new account.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 150), custom(function = "validate_username"))]
    pub username: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(max = 150))]
    pub first_name: Option<String>,

    #[validate(length(max = 150))]
    pub last_name: Option<String>,
}

/// Input for updating the caller's profile.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[validate(length(max = 500))]
    pub bio: Option<String>,

    #[validate(length(max = 100))]
    pub location: Option<String>,

    #[validate(length(max = 200), url)]
    pub website: Option<String>,

    pub birth_date: Option<NaiveDate>,

    #[validate(length(max = 1024))]
    pub avatar_ref: Option<String>,
}

/// A user's public profile with derived follow counts.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub user: user::Model,
    pub profile: user_profile::Model,
    pub followers_count: u64,
    pub following_count: u64,
    /// Whether the viewer follows this user (`false` for anonymous viewers).
    pub is_following: bool,
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        Err(ValidationError::new("username_chars"))
    }
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    user_repo: UserRepository,
    profile_repo: UserProfileRepository,
    following_repo: FollowingRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        user_repo: UserRepository,
        profile_repo: UserProfileRepository,
        following_repo: FollowingRepository,
    ) -> Self {
        Self {
            db,
            user_repo,
            profile_repo,
            following_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create an account together with its empty profile.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        input.validate()?;

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let user_id = self.id_gen.generate();
        let now = Utc::now();

        let user_model = user::ActiveModel {
            id: Set(user_id.clone()),
            username: Set(input.username.clone()),
            username_lower: Set(input.username.to_lowercase()),
            email: Set(input.email),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            token: Set(Some(self.id_gen.generate_token())),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        let profile_model = user_profile::ActiveModel {
            user_id: Set(user_id),
            password: Set(Some(password_hash)),
            bio: Set(String::new()),
            location: Set(String::new()),
            website: Set(String::new()),
            birth_date: Set(None),
            avatar_ref: Set(None),
            updated_at: Set(None),
        };

        let txn = self.db.begin().await?;
        let user = self.user_repo.create(&txn, user_model).await?;
        self.profile_repo.create(&txn, profile_model).await?;
        txn.commit().await?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Authenticate a user by username and password.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let profile = self
            .profile_repo
            .find_by_user_id(&user.id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let password_hash = profile.password.ok_or(AppError::Unauthorized)?;
        if !verify_password(password, &password_hash)? {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Authenticate a user by token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Regenerate a user's authentication token, invalidating the old one.
    pub async fn regenerate_token(&self, user_id: &str) -> AppResult<String> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let new_token = self.id_gen.generate_token();

        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(new_token.clone()));
        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await?;

        Ok(new_token)
    }

    /// Get a user's profile as seen by `viewer_id`.
    pub async fn get_profile(
        &self,
        user_id: &str,
        viewer_id: Option<&str>,
    ) -> AppResult<ProfileView> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let profile = self.profile_repo.get_by_user_id(user_id).await?;
        self.profile_view(user, profile, viewer_id).await
    }

    /// Update the caller's own profile.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<ProfileView> {
        input.validate()?;

        let user = self.user_repo.get_by_id(user_id).await?;
        let profile = self.profile_repo.get_by_user_id(user_id).await?;
        let mut active: user_profile::ActiveModel = profile.into();

        if let Some(bio) = input.bio {
            active.bio = Set(bio);
        }
        if let Some(location) = input.location {
            active.location = Set(location);
        }
        if let Some(website) = input.website {
            active.website = Set(website);
        }
        if let Some(birth_date) = input.birth_date {
            active.birth_date = Set(Some(birth_date));
        }
        if let Some(avatar_ref) = input.avatar_ref {
            active.avatar_ref = Set(Some(avatar_ref));
        }
        active.updated_at = Set(Some(Utc::now().into()));

        let profile = self.profile_repo.update(active).await?;
        self.profile_view(user, profile, Some(user_id)).await
    }

    async fn profile_view(
        &self,
        user: user::Model,
        profile: user_profile::Model,
        viewer_id: Option<&str>,
    ) -> AppResult<ProfileView> {
        let followers_count = self.following_repo.count_followers(&user.id).await?;
        let following_count = self.following_repo.count_following(&user.id).await?;
        let is_following = match viewer_id {
            Some(viewer) if viewer != user.id => {
                self.following_repo.is_following(viewer, &user.id).await?
            }
            _ => false,
        };

        Ok(ProfileView {
            user,
            profile,
            followers_count,
            following_count,
            is_following,
        })
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
