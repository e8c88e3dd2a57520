//! Follow graph.

use opinionated_common::{AppError, AppResult, PAGE_SIZE, Page};
use opinionated_db::{
    entities::{post, user},
    repositories::{FollowRepository, PostRepository, UserRepository},
};
use sea_orm::prelude::DateTimeWithTimeZone;
use std::collections::HashMap;

/// Follow service for business logic.
#[derive(Clone)]
pub struct FollowService {
    follow_repo: FollowRepository,
    user_repo: UserRepository,
    post_repo: PostRepository,
}

impl FollowService {
    /// Create a new follow service.
    #[must_use]
    pub const fn new(
        follow_repo: FollowRepository,
        user_repo: UserRepository,
        post_repo: PostRepository,
    ) -> Self {
        Self {
            follow_repo,
            user_repo,
            post_repo,
        }
    }

    /// Follow a user. Following someone already followed is a no-op.
    pub async fn follow(&self, follower_id: &str, followee_id: &str) -> AppResult<()> {
        if follower_id == followee_id {
            return Err(AppError::InvalidArgument(
                "Cannot follow yourself".to_string(),
            ));
        }

        self.user_repo.get_by_id(follower_id).await?;
        self.user_repo.get_by_id(followee_id).await?;

        self.follow_repo
            .create_if_absent(follower_id, followee_id)
            .await?;
        tracing::debug!(follower_id = %follower_id, followee_id = %followee_id, "Follow edge ensured");
        Ok(())
    }

    /// Unfollow a user. Removing an absent edge is a no-op.
    pub async fn unfollow(&self, follower_id: &str, followee_id: &str) -> AppResult<()> {
        let removed = self
            .follow_repo
            .delete_by_pair(follower_id, followee_id)
            .await?;
        if removed {
            tracing::debug!(follower_id = %follower_id, followee_id = %followee_id, "Follow edge removed");
        }
        Ok(())
    }

    /// Whether `follower_id` follows `followee_id`.
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        self.follow_repo.is_following(follower_id, followee_id).await
    }

    /// Whether `user_id` is followed by `other_id`.
    pub async fn is_followed_by(&self, user_id: &str, other_id: &str) -> AppResult<bool> {
        self.follow_repo.is_following(other_id, user_id).await
    }

    /// Users who follow `user_id`, most recent edge first, with the time the
    /// edge was created.
    pub async fn followers_of(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<(user::Model, DateTimeWithTimeZone)>> {
        let edges = self.follow_repo.find_followers(user_id).await?;
        let ids: Vec<String> = edges.iter().map(|e| e.follower_id.clone()).collect();
        let mut users: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();
        Ok(edges
            .into_iter()
            .filter_map(|e| users.remove(&e.follower_id).map(|u| (u, e.created_at)))
            .collect())
    }

    /// Users that `user_id` follows, most recent edge first, with the time
    /// the edge was created.
    pub async fn following_of(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<(user::Model, DateTimeWithTimeZone)>> {
        let edges = self.follow_repo.find_following(user_id).await?;
        let ids: Vec<String> = edges.iter().map(|e| e.followee_id.clone()).collect();
        let mut users: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();
        Ok(edges
            .into_iter()
            .filter_map(|e| users.remove(&e.followee_id).map(|u| (u, e.created_at)))
            .collect())
    }

    /// Posts authored by users that `user_id` follows, newest first.
    ///
    /// An empty follow set yields an empty page without touching the post
    /// store.
    pub async fn feed_for(&self, user_id: &str, page: u64) -> AppResult<Page<post::Model>> {
        self.user_repo.get_by_id(user_id).await?;
        let author_ids = self.follow_repo.following_ids(user_id).await?;
        if author_ids.is_empty() {
            return Ok(Page::empty(Page::<post::Model>::normalize(page), PAGE_SIZE));
        }
        self.post_repo
            .find_by_author_ids(&author_ids, page, PAGE_SIZE)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use opinionated_db::entities::follow;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn test_follow(id: &str, follower_id: &str, followee_id: &str) -> follow::Model {
        follow::Model {
            id: id.to_string(),
            follower_id: follower_id.to_string(),
            followee_id: followee_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn service_with(
        follow_db: MockDatabase,
        user_db: MockDatabase,
        post_db: MockDatabase,
    ) -> FollowService {
        FollowService::new(
            FollowRepository::new(Arc::new(follow_db.into_connection())),
            UserRepository::new(Arc::new(user_db.into_connection())),
            PostRepository::new(Arc::new(post_db.into_connection())),
        )
    }

    #[tokio::test]
    async fn test_self_follow_rejected() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service.follow("u1", "u1").await;

        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_unfollow_absent_edge_is_noop() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
                sea_orm::MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ]),
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        assert!(service.unfollow("u1", "u2").await.is_ok());
    }

    #[tokio::test]
    async fn test_is_followed_by_reverses_direction() {
        let edge = test_follow("f1", "u2", "u1");

        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[edge]]),
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        assert!(service.is_followed_by("u1", "u2").await.unwrap());
    }
}
