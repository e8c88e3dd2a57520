//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use opinionated_common::{AppError, AppResult, IdGenerator, storage::content_key};
use opinionated_db::{
    entities::user,
    repositories::{FollowRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    follow_repo: FollowRepository,
    id_gen: IdGenerator,
}

/// Input for password-based signup.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(min = 1, max = 256))]
    pub display_name: String,

    pub gender: Option<String>,
    pub age_bucket: Option<String>,
    pub location: Option<String>,
    pub about_me: Option<String>,
}

/// Attributes handed over by an external identity provider at login.
#[derive(Debug, Clone)]
pub struct ExternalProfile {
    pub external_id: String,
    pub email: String,
    pub display_name: String,
    pub gender: Option<String>,
    pub age_bucket: Option<String>,
    pub location: Option<String>,
    /// The provider's IDs of the user's friends there.
    pub friend_external_ids: Vec<String>,
}

/// Whether a first external login seeds follow edges from provider friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendImportPolicy {
    /// Seed mutual follow edges with provider friends who already have an
    /// account here.
    ProviderFriends,
    /// Create the account without touching the follow graph.
    Disabled,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, follow_repo: FollowRepository) -> Self {
        Self {
            user_repo,
            follow_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new password-based account.
    ///
    /// A duplicate email surfaces as [`AppError::ConstraintViolation`].
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        input.validate()?;

        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            email: Set(input.email),
            display_name: Set(input.display_name),
            password_hash: Set(Some(password_hash)),
            external_id: Set(None),
            gender: Set(input.gender),
            age_bucket: Set(input.age_bucket),
            location: Set(input.location),
            about_me: Set(input.about_me),
            avatar_key: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.user_repo.create(model).await?;
        tracing::debug!(user_id = %created.id, "User registered");
        Ok(created)
    }

    /// Authenticate by email and password.
    ///
    /// Unknown email, wrong password, and external-only accounts all yield
    /// the same [`AppError::Unauthorized`].
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::Unauthorized)?;
        let Some(ref password_hash) = user.password_hash else {
            return Err(AppError::Unauthorized);
        };
        if !verify_password(password, password_hash)? {
            return Err(AppError::Unauthorized);
        }
        Ok(user)
    }

    /// Log in through an external identity provider.
    ///
    /// The first login provisions the account from provider attributes and,
    /// when the policy allows, seeds mutual follow edges with provider
    /// friends who already have an account. Later logins return the existing
    /// user untouched.
    pub async fn login_external(
        &self,
        profile: ExternalProfile,
        policy: FriendImportPolicy,
    ) -> AppResult<user::Model> {
        if let Some(existing) = self
            .user_repo
            .find_by_external_id(&profile.external_id)
            .await?
        {
            return Ok(existing);
        }

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            email: Set(profile.email),
            display_name: Set(profile.display_name),
            password_hash: Set(None),
            external_id: Set(Some(profile.external_id)),
            gender: Set(profile.gender),
            age_bucket: Set(profile.age_bucket),
            location: Set(profile.location),
            about_me: Set(None),
            avatar_key: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };
        let created = self.user_repo.create(model).await?;
        tracing::debug!(user_id = %created.id, "User provisioned from external identity");

        if policy == FriendImportPolicy::ProviderFriends {
            let friends = self
                .user_repo
                .find_by_external_ids(&profile.friend_external_ids)
                .await?;
            for friend in friends {
                self.follow_repo
                    .create_if_absent(&created.id, &friend.id)
                    .await?;
                self.follow_repo
                    .create_if_absent(&friend.id, &created.id)
                    .await?;
            }
        }

        Ok(created)
    }

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(user_id).await
    }

    /// Record an avatar key for the user. Self only.
    pub async fn assign_avatar_key(&self, user_id: &str, actor_id: &str) -> AppResult<user::Model> {
        if user_id != actor_id {
            return Err(AppError::Unauthorized);
        }
        let user = self.user_repo.get_by_id(user_id).await?;

        let key = content_key(&user.id);
        let mut active: user::ActiveModel = user.into();
        active.avatar_key = Set(Some(key));
        active.updated_at = Set(Some(Utc::now().into()));
        self.user_repo.update(active).await
    }

    /// Delete a user and everything the user owns. Self only.
    pub async fn delete_user(&self, user_id: &str, actor_id: &str) -> AppResult<()> {
        if user_id != actor_id {
            return Err(AppError::Unauthorized);
        }
        let user = self.user_repo.get_by_id(user_id).await?;
        self.user_repo.delete_cascading(&user.id).await?;
        tracing::debug!(user_id = %user.id, "User deleted");
        Ok(())
    }
}

/// Hash a password with Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against an Argon2 hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn test_user(id: &str, email: &str, password_hash: Option<String>) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: email.to_string(),
            display_name: "Test User".to_string(),
            password_hash,
            external_id: None,
            gender: None,
            age_bucket: None,
            location: None,
            about_me: None,
            avatar_key: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service_with(user_db: MockDatabase, follow_db: MockDatabase) -> UserService {
        UserService::new(
            UserRepository::new(Arc::new(user_db.into_connection())),
            FollowRepository::new(Arc::new(follow_db.into_connection())),
        )
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse battery").unwrap();

        assert!(verify_password("correct horse battery", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_register_rejects_bad_email() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let input = RegisterInput {
            email: "not-an-email".to_string(),
            password: "longenough".to_string(),
            display_name: "A".to_string(),
            gender: None,
            age_bucket: None,
            location: None,
            about_me: None,
        };
        let result = service.register(input).await;

        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_email() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service.authenticate("nobody@example.com", "pw").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_authenticate_external_only_account() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user("u1", "a@example.com", None)]]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service.authenticate("a@example.com", "pw").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_external_returns_existing_user() {
        let mut existing = test_user("u1", "a@example.com", None);
        existing.external_id = Some("ext-1".to_string());

        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing.clone()]]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let profile = ExternalProfile {
            external_id: "ext-1".to_string(),
            email: "a@example.com".to_string(),
            display_name: "A".to_string(),
            gender: None,
            age_bucket: None,
            location: None,
            friend_external_ids: vec![],
        };
        let result = service
            .login_external(profile, FriendImportPolicy::ProviderFriends)
            .await
            .unwrap();

        assert_eq!(result.id, "u1");
    }

    #[tokio::test]
    async fn test_delete_user_self_only() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service.delete_user("u1", "u2").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
