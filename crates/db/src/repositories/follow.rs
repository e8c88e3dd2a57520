//! Follow repository.

use std::sync::Arc;

use crate::entities::{Follow, follow};
use chrono::Utc;
use opinionated_common::{AppError, AppResult, IdGenerator};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr,
};

/// Follow repository for database operations.
#[derive(Clone)]
pub struct FollowRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl FollowRepository {
    /// Create a new follow repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Find the directed follow edge from `follower_id` to `followee_id`.
    pub async fn find_by_pair(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<Option<follow::Model>> {
        Follow::find()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::FolloweeId.eq(followee_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether the directed edge exists.
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(follower_id, followee_id).await?.is_some())
    }

    /// Create the directed follow edge if it does not already exist.
    ///
    /// Idempotent: a pre-existing edge (including one raced in concurrently,
    /// caught via the unique pair index) is returned unchanged.
    pub async fn create_if_absent(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<follow::Model> {
        if let Some(existing) = self.find_by_pair(follower_id, followee_id).await? {
            return Ok(existing);
        }

        let model = follow::ActiveModel {
            id: Set(self.id_gen.generate()),
            follower_id: Set(follower_id.to_string()),
            followee_id: Set(followee_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        match model.insert(self.db.as_ref()).await {
            Ok(created) => Ok(created),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => self
                    .find_by_pair(follower_id, followee_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Database("Follow edge missing after unique violation".to_string())
                    }),
                _ => Err(AppError::Database(e.to_string())),
            },
        }
    }

    /// Delete the directed follow edge. Returns whether an edge was removed.
    pub async fn delete_by_pair(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        let result = Follow::delete_many()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::FolloweeId.eq(followee_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Get the edges where `user_id` is the follower, most recent first.
    pub async fn find_following(&self, user_id: &str) -> AppResult<Vec<follow::Model>> {
        Follow::find()
            .filter(follow::Column::FollowerId.eq(user_id))
            .order_by_desc(follow::Column::CreatedAt)
            .order_by_desc(follow::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the edges where `user_id` is the followee, most recent first.
    pub async fn find_followers(&self, user_id: &str) -> AppResult<Vec<follow::Model>> {
        Follow::find()
            .filter(follow::Column::FolloweeId.eq(user_id))
            .order_by_desc(follow::Column::CreatedAt)
            .order_by_desc(follow::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get only the IDs of users that `user_id` follows.
    pub async fn following_ids(&self, user_id: &str) -> AppResult<Vec<String>> {
        Ok(self
            .find_following(user_id)
            .await?
            .into_iter()
            .map(|f| f.followee_id)
            .collect())
    }
}
