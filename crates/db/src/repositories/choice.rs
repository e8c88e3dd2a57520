//! Choice repository.

use std::sync::Arc;

use crate::entities::{Choice, choice};
use opinionated_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Choice repository for database operations.
#[derive(Clone)]
pub struct ChoiceRepository {
    db: Arc<DatabaseConnection>,
}

impl ChoiceRepository {
    /// Create a new choice repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a choice by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<choice::Model>> {
        Choice::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a choice by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<choice::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Choice not found: {id}")))
    }

    /// Get a post's choices in creation (positional) order.
    pub async fn find_by_post(&self, post_id: &str) -> AppResult<Vec<choice::Model>> {
        Choice::find()
            .filter(choice::Column::PostId.eq(post_id))
            .order_by_asc(choice::Column::CreatedAt)
            .order_by_asc(choice::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new choice.
    pub async fn create(&self, model: choice::ActiveModel) -> AppResult<choice::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a choice (e.g. to record its image key after upload).
    pub async fn update(&self, model: choice::ActiveModel) -> AppResult<choice::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
