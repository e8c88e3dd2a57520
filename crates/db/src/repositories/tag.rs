//! Tag repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{Tag, TagPost, tag, tag_post};
use chrono::Utc;
use opinionated_common::{AppError, AppResult, IdGenerator};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr,
};

/// Tag repository for database operations.
#[derive(Clone)]
pub struct TagRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl TagRepository {
    /// Create a new tag repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Find a tag by its exact, case-sensitive name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<tag::Model>> {
        Tag::find()
            .filter(tag::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the tag for a name, creating it if it does not exist yet.
    ///
    /// Tag rows are shared across posts; a concurrent create racing on the
    /// unique name index falls back to re-reading the winner's row.
    pub async fn get_or_create(&self, name: &str) -> AppResult<tag::Model> {
        if let Some(existing) = self.find_by_name(name).await? {
            return Ok(existing);
        }

        let model = tag::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
        };

        match model.insert(self.db.as_ref()).await {
            Ok(created) => Ok(created),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    self.find_by_name(name).await?.ok_or_else(|| {
                        AppError::Database("Tag row missing after unique violation".to_string())
                    })
                }
                _ => Err(AppError::Database(e.to_string())),
            },
        }
    }

    /// Link a tag to a post, if not already linked.
    pub async fn link_post(&self, tag_id: &str, post_id: &str) -> AppResult<()> {
        let existing = TagPost::find()
            .filter(tag_post::Column::TagId.eq(tag_id))
            .filter(tag_post::Column::PostId.eq(post_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        if existing.is_some() {
            return Ok(());
        }

        let link = tag_post::ActiveModel {
            id: Set(self.id_gen.generate()),
            tag_id: Set(tag_id.to_string()),
            post_id: Set(post_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        match link.insert(self.db.as_ref()).await {
            Ok(_) => Ok(()),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Ok(()),
                _ => Err(AppError::Database(e.to_string())),
            },
        }
    }

    /// Get the IDs of posts carrying the given tag, link-order newest first.
    pub async fn post_ids_for_tag(&self, tag_id: &str) -> AppResult<Vec<String>> {
        Ok(TagPost::find()
            .filter(tag_post::Column::TagId.eq(tag_id))
            .order_by_desc(tag_post::Column::CreatedAt)
            .order_by_desc(tag_post::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .map(|link| link.post_id)
            .collect())
    }

    /// Get the tags attached to a post.
    pub async fn find_by_post(&self, post_id: &str) -> AppResult<Vec<tag::Model>> {
        let tag_ids: Vec<String> = TagPost::find()
            .filter(tag_post::Column::PostId.eq(post_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .map(|link| link.tag_id)
            .collect();
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }
        Tag::find()
            .filter(tag::Column::Id.is_in(tag_ids.iter().map(String::as_str)))
            .order_by_asc(tag::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count linked posts per tag, keyed by tag ID.
    pub async fn post_counts(&self) -> AppResult<HashMap<String, u64>> {
        let links = TagPost::find()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let mut counts: HashMap<String, u64> = HashMap::new();
        for link in links {
            *counts.entry(link.tag_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Get all tags.
    pub async fn find_all(&self) -> AppResult<Vec<tag::Model>> {
        Tag::find()
            .order_by_asc(tag::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_tag(id: &str, name: &str) -> tag::Model {
        tag::Model {
            id: id.to_string(),
            name: name.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn create_test_link(id: &str, tag_id: &str, post_id: &str) -> tag_post::Model {
        tag_post::Model {
            id: id.to_string(),
            tag_id: tag_id.to_string(),
            post_id: post_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_existing_row() {
        let existing = create_test_tag("t1", "food");

        // Only the lookup runs; no insert follows.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );

        let repo = TagRepository::new(db);
        let result = repo.get_or_create("food").await.unwrap();

        assert_eq!(result.id, "t1");
    }

    #[tokio::test]
    async fn test_find_by_name_is_exact() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<tag::Model>::new()])
                .into_connection(),
        );

        let repo = TagRepository::new(db);
        let result = repo.find_by_name("Food").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_post_ids_for_tag() {
        let l1 = create_test_link("l2", "t1", "p2");
        let l2 = create_test_link("l1", "t1", "p1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[l1, l2]])
                .into_connection(),
        );

        let repo = TagRepository::new(db);
        let ids = repo.post_ids_for_tag("t1").await.unwrap();

        assert_eq!(ids, vec!["p2".to_string(), "p1".to_string()]);
    }

    #[tokio::test]
    async fn test_post_counts() {
        let links = vec![
            create_test_link("l1", "t1", "p1"),
            create_test_link("l2", "t1", "p2"),
            create_test_link("l3", "t2", "p1"),
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([links])
                .into_connection(),
        );

        let repo = TagRepository::new(db);
        let counts = repo.post_counts().await.unwrap();

        assert_eq!(counts.get("t1"), Some(&2));
        assert_eq!(counts.get("t2"), Some(&1));
    }
}
