//! User repository.

use std::sync::Arc;

use crate::entities::{Choice, Comment, Follow, Post, TagPost, User, Vote, choice, comment, follow, post, tag_post, user, vote};
use opinionated_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    TransactionTrait,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {id}")))
    }

    /// Find a user by email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by the external identity provider's ID.
    pub async fn find_by_external_id(&self, external_id: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::ExternalId.eq(external_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find users by a set of IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        User::find()
            .filter(user::Column::Id.is_in(ids.iter().map(String::as_str)))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find users by a set of external identity provider IDs.
    pub async fn find_by_external_ids(&self, external_ids: &[String]) -> AppResult<Vec<user::Model>> {
        if external_ids.is_empty() {
            return Ok(Vec::new());
        }
        User::find()
            .filter(user::Column::ExternalId.is_in(external_ids.iter().map(String::as_str)))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    ///
    /// A duplicate email or external ID surfaces as
    /// [`AppError::ConstraintViolation`].
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model.insert(self.db.as_ref()).await.map_err(AppError::from_db)
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a user and everything the user owns, as one transaction.
    ///
    /// Ordered explicitly: rows of the user's posts first (votes, tag links,
    /// comments, choices), then the posts, then the user's own comments and
    /// votes on other posts, the user's follow edges in both directions, and
    /// finally the user row.
    pub async fn delete_cascading(&self, user_id: &str) -> AppResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let post_ids: Vec<String> = Post::find()
            .filter(post::Column::AuthorId.eq(user_id))
            .all(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .map(|p| p.id)
            .collect();

        if !post_ids.is_empty() {
            Vote::delete_many()
                .filter(vote::Column::PostId.is_in(post_ids.iter().map(String::as_str)))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            TagPost::delete_many()
                .filter(tag_post::Column::PostId.is_in(post_ids.iter().map(String::as_str)))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            Comment::delete_many()
                .filter(comment::Column::PostId.is_in(post_ids.iter().map(String::as_str)))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            Choice::delete_many()
                .filter(choice::Column::PostId.is_in(post_ids.iter().map(String::as_str)))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            Post::delete_many()
                .filter(post::Column::AuthorId.eq(user_id))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        Comment::delete_many()
            .filter(comment::Column::UserId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Vote::delete_many()
            .filter(vote::Column::UserId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Follow::delete_many()
            .filter(
                Condition::any()
                    .add(follow::Column::FollowerId.eq(user_id))
                    .add(follow::Column::FolloweeId.eq(user_id)),
            )
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        User::delete_by_id(user_id)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
