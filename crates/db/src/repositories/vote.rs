//! Vote repository.

use std::sync::Arc;

use crate::entities::{Vote, vote};
use chrono::Utc;
use opinionated_common::{AppError, AppResult, IdGenerator};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Find a user's current vote on a post.
    pub async fn find_by_post_and_user(
        &self,
        post_id: &str,
        user_id: &str,
    ) -> AppResult<Option<vote::Model>> {
        Vote::find()
            .filter(vote::Column::PostId.eq(post_id))
            .filter(vote::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all votes on a post.
    pub async fn find_by_post(&self, post_id: &str) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(vote::Column::PostId.eq(post_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all votes cast by a user.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert or move the user's vote on a post.
    ///
    /// The (post_id, user_id) unique index is the concurrency guard: each
    /// statement here is individually atomic, and a concurrent duplicate
    /// insert loses against the index and is retried as an update, so at most
    /// one row per (post, user) ever exists.
    pub async fn upsert(
        &self,
        post_id: &str,
        user_id: &str,
        choice_id: &str,
    ) -> AppResult<vote::Model> {
        if let Some(existing) = self.find_by_post_and_user(post_id, user_id).await? {
            if existing.choice_id == choice_id {
                return Ok(existing);
            }
            return self.move_to_choice(existing, choice_id).await;
        }

        let model = vote::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            post_id: Set(post_id.to_string()),
            choice_id: Set(choice_id.to_string()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        match model.insert(self.db.as_ref()).await {
            Ok(created) => Ok(created),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    tracing::warn!(
                        post_id = %post_id,
                        user_id = %user_id,
                        "Concurrent duplicate vote insert; retrying as update"
                    );
                    let existing = self
                        .find_by_post_and_user(post_id, user_id)
                        .await?
                        .ok_or_else(|| {
                            AppError::Database(
                                "Vote row missing after unique violation".to_string(),
                            )
                        })?;
                    if existing.choice_id == choice_id {
                        Ok(existing)
                    } else {
                        self.move_to_choice(existing, choice_id).await
                    }
                }
                _ => Err(AppError::Database(e.to_string())),
            },
        }
    }

    /// Move an existing vote row to a different choice.
    async fn move_to_choice(
        &self,
        existing: vote::Model,
        choice_id: &str,
    ) -> AppResult<vote::Model> {
        let mut active: vote::ActiveModel = existing.into();
        active.choice_id = Set(choice_id.to_string());
        active.updated_at = Set(Some(Utc::now().into()));
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_vote(id: &str, user_id: &str, post_id: &str, choice_id: &str) -> vote::Model {
        vote::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            post_id: post_id.to_string(),
            choice_id: choice_id.to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_post_and_user_found() {
        let vote = create_test_vote("v1", "u1", "p1", "c1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[vote.clone()]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let result = repo.find_by_post_and_user("p1", "u1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().choice_id, "c1");
    }

    #[tokio::test]
    async fn test_upsert_same_choice_is_noop() {
        let vote = create_test_vote("v1", "u1", "p1", "c1");

        // Only the lookup query runs; no insert or update follows.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[vote.clone()]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let result = repo.upsert("p1", "u1", "c1").await.unwrap();

        assert_eq!(result.id, "v1");
        assert_eq!(result.choice_id, "c1");
    }

    #[tokio::test]
    async fn test_find_by_post() {
        let v1 = create_test_vote("v1", "u1", "p1", "c1");
        let v2 = create_test_vote("v2", "u2", "p1", "c2");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[v1, v2]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let result = repo.find_by_post("p1").await.unwrap();

        assert_eq!(result.len(), 2);
    }
}
