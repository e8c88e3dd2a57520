//! Vote engine.

use crate::services::aggregation::{Tally, tally_from_rows};
use opinionated_common::{AppError, AppResult};
use opinionated_db::repositories::{ChoiceRepository, PostRepository, VoteRepository};

/// Vote service for business logic.
#[derive(Clone)]
pub struct VoteService {
    post_repo: PostRepository,
    choice_repo: ChoiceRepository,
    vote_repo: VoteRepository,
}

impl VoteService {
    /// Create a new vote service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        choice_repo: ChoiceRepository,
        vote_repo: VoteRepository,
    ) -> Self {
        Self {
            post_repo,
            choice_repo,
            vote_repo,
        }
    }

    /// Cast a vote, or move the user's existing vote to the given choice.
    ///
    /// Idempotent for a repeated identical vote. The vote row's post is taken
    /// from the choice, never from the caller, so a vote can only ever point
    /// at a choice of its own post. Returns the post's fresh tally.
    pub async fn cast_or_change_vote(
        &self,
        post_id: &str,
        user_id: &str,
        choice_id: &str,
    ) -> AppResult<Tally> {
        if user_id.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "A voter identity is required".to_string(),
            ));
        }

        let post = self.post_repo.get_by_id(post_id).await?;
        let choice = self.choice_repo.get_by_id(choice_id).await?;
        if choice.post_id != post.id {
            return Err(AppError::NotFound(format!(
                "Choice {choice_id} does not belong to post {post_id}"
            )));
        }

        self.vote_repo
            .upsert(&choice.post_id, user_id, &choice.id)
            .await?;

        tracing::debug!(post_id = %post.id, user_id = %user_id, choice_id = %choice.id, "Vote recorded");

        let choices = self.choice_repo.find_by_post(&post.id).await?;
        let votes = self.vote_repo.find_by_post(&post.id).await?;
        Ok(tally_from_rows(&choices, &votes))
    }

    /// The choice the user currently has a vote on, if any.
    pub async fn current_choice_for_user(
        &self,
        post_id: &str,
        user_id: &str,
    ) -> AppResult<Option<String>> {
        Ok(self
            .vote_repo
            .find_by_post_and_user(post_id, user_id)
            .await?
            .map(|v| v.choice_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use opinionated_db::entities::{choice, post, vote};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn test_post(id: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            author_id: "u1".to_string(),
            description: "Pizza or Tacos?".to_string(),
            attachment_key: None,
            decided: false,
            decided_choice_id: None,
            created_at: Utc::now().into(),
        }
    }

    fn test_choice(id: &str, post_id: &str) -> choice::Model {
        choice::Model {
            id: id.to_string(),
            post_id: post_id.to_string(),
            text: Some("Pizza".to_string()),
            image_key: None,
            created_at: Utc::now().into(),
        }
    }

    fn empty_service() -> VoteService {
        let db1 = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let db2 = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let db3 = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        VoteService::new(
            PostRepository::new(db1),
            ChoiceRepository::new(db2),
            VoteRepository::new(db3),
        )
    }

    #[tokio::test]
    async fn test_blank_user_rejected() {
        let service = empty_service();
        let result = service.cast_or_change_vote("p1", "  ", "c1").await;

        assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_missing_post_rejected() {
        let db1 = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );
        let db2 = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let db3 = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = VoteService::new(
            PostRepository::new(db1),
            ChoiceRepository::new(db2),
            VoteRepository::new(db3),
        );

        let result = service.cast_or_change_vote("p1", "u1", "c1").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_choice_of_other_post_rejected() {
        let db1 = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_post("p1")]])
                .into_connection(),
        );
        let db2 = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_choice("c9", "p2")]])
                .into_connection(),
        );
        let db3 = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = VoteService::new(
            PostRepository::new(db1),
            ChoiceRepository::new(db2),
            VoteRepository::new(db3),
        );

        let result = service.cast_or_change_vote("p1", "u1", "c9").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_current_choice_none_without_vote() {
        let db1 = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let db2 = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let db3 = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<vote::Model>::new()])
                .into_connection(),
        );
        let service = VoteService::new(
            PostRepository::new(db1),
            ChoiceRepository::new(db2),
            VoteRepository::new(db3),
        );

        let result = service.current_choice_for_user("p1", "u1").await.unwrap();

        assert!(result.is_none());
    }
}
