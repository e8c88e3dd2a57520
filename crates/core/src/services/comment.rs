//! Comment service.

use chrono::Utc;
use opinionated_common::{AppError, AppResult, IdGenerator};
use opinionated_db::{
    entities::comment,
    repositories::{CommentRepository, PostRepository},
};
use sea_orm::Set;

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(comment_repo: CommentRepository, post_repo: PostRepository) -> Self {
        Self {
            comment_repo,
            post_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a comment to a post.
    pub async fn add_comment(
        &self,
        post_id: &str,
        user_id: &str,
        content: &str,
    ) -> AppResult<comment::Model> {
        if user_id.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "A commenter identity is required".to_string(),
            ));
        }
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::InvalidArgument(
                "Comment content cannot be blank".to_string(),
            ));
        }

        let post = self.post_repo.get_by_id(post_id).await?;

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            post_id: Set(post.id),
            content: Set(content.to_string()),
            created_at: Set(Utc::now().into()),
        };
        self.comment_repo.create(model).await
    }

    /// A post's comments, oldest first.
    pub async fn comments_for(&self, post_id: &str) -> AppResult<Vec<comment::Model>> {
        let post = self.post_repo.get_by_id(post_id).await?;
        self.comment_repo.find_by_post(&post.id).await
    }

    /// Delete a comment. Allowed for the comment's author and for the post's
    /// author.
    pub async fn delete_comment(&self, comment_id: &str, actor_id: &str) -> AppResult<()> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;
        if comment.user_id != actor_id {
            let post = self.post_repo.get_by_id(&comment.post_id).await?;
            if post.author_id != actor_id {
                return Err(AppError::Unauthorized);
            }
        }
        self.comment_repo.delete(&comment.id).await
    }
}
