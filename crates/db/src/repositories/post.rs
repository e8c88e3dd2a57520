//! Post repository.

use std::sync::Arc;

use crate::entities::{
    Choice, Comment, Post, TagPost, Vote, choice, comment, post, tag_post, vote,
};
use opinionated_common::{AppError, AppResult, IdGenerator, Page};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post not found: {id}")))
    }

    /// Create a post together with its choices and tag links as one
    /// transaction.
    ///
    /// If any insert fails, everything inserted before it rolls back; a post
    /// never persists without its choices.
    pub async fn create_bundle(
        &self,
        post_model: post::ActiveModel,
        choice_models: Vec<choice::ActiveModel>,
        tag_ids: &[String],
    ) -> AppResult<(post::Model, Vec<choice::Model>)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let created_post = post_model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut created_choices = Vec::with_capacity(choice_models.len());
        for model in choice_models {
            let created = model
                .insert(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            created_choices.push(created);
        }

        for tag_id in tag_ids {
            let link = tag_post::ActiveModel {
                id: Set(self.id_gen.generate()),
                tag_id: Set(tag_id.clone()),
                post_id: Set(created_post.id.clone()),
                created_at: Set(chrono::Utc::now().into()),
            };
            link.insert(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((created_post, created_choices))
    }

    /// Update a post.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all posts, newest first, paginated.
    pub async fn find_all(&self, page: u64, per_page: u64) -> AppResult<Page<post::Model>> {
        let items = Post::find()
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .offset(Page::<post::Model>::offset(page, per_page))
            .limit(per_page + 1)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(Page::from_overfetch(items, Page::<post::Model>::normalize(page), per_page))
    }

    /// Get posts by an author, newest first.
    pub async fn find_by_author(&self, author_id: &str) -> AppResult<Vec<post::Model>> {
        Post::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get posts authored by any of the given users, newest first, paginated.
    ///
    /// This backs the followed-posts feed; callers handle the empty author
    /// set before reaching the store.
    pub async fn find_by_author_ids(
        &self,
        author_ids: &[String],
        page: u64,
        per_page: u64,
    ) -> AppResult<Page<post::Model>> {
        let items = Post::find()
            .filter(post::Column::AuthorId.is_in(author_ids.iter().map(String::as_str)))
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .offset(Page::<post::Model>::offset(page, per_page))
            .limit(per_page + 1)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(Page::from_overfetch(items, Page::<post::Model>::normalize(page), per_page))
    }

    /// Get posts by a set of IDs, newest first, paginated.
    pub async fn find_by_ids_paged(
        &self,
        ids: &[String],
        page: u64,
        per_page: u64,
    ) -> AppResult<Page<post::Model>> {
        if ids.is_empty() {
            return Ok(Page::empty(Page::<post::Model>::normalize(page), per_page));
        }
        let items = Post::find()
            .filter(post::Column::Id.is_in(ids.iter().map(String::as_str)))
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .offset(Page::<post::Model>::offset(page, per_page))
            .limit(per_page + 1)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(Page::from_overfetch(items, Page::<post::Model>::normalize(page), per_page))
    }

    /// Delete a post and everything attached to it, as one transaction.
    ///
    /// Ordered explicitly: votes on the post, tag links, comments, choices,
    /// then the post row. Rows belonging to other posts are untouched.
    pub async fn delete_cascading(&self, post_id: &str) -> AppResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Vote::delete_many()
            .filter(vote::Column::PostId.eq(post_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        TagPost::delete_many()
            .filter(tag_post::Column::PostId.eq(post_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Comment::delete_many()
            .filter(comment::Column::PostId.eq(post_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Choice::delete_many()
            .filter(choice::Column::PostId.eq(post_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Post::delete_by_id(post_id)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_post(id: &str, author_id: &str, description: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            description: description.to_string(),
            attachment_key: None,
            decided: false,
            decided_choice_id: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let post = create_test_post("p1", "u1", "Pizza or Tacos?");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post.clone()]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo.find_by_id("p1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().description, "Pizza or Tacos?");
    }

    #[tokio::test]
    async fn test_find_by_author() {
        let p1 = create_test_post("p1", "u1", "first");
        let p2 = create_test_post("p2", "u1", "second");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[p2, p1]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo.find_by_author("u1").await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "p2");
    }

    #[tokio::test]
    async fn test_find_by_ids_paged_empty() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = PostRepository::new(db);
        let page = repo.find_by_ids_paged(&[], 1, 20).await.unwrap();

        assert!(page.items.is_empty());
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn test_find_all_overfetch_sets_has_next() {
        let posts: Vec<post::Model> = (0..3)
            .map(|i| create_test_post(&format!("p{i}"), "u1", "q"))
            .collect();

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([posts])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let page = repo.find_all(1, 2).await.unwrap();

        assert_eq!(page.items.len(), 2);
        assert!(page.has_next);
    }
}
