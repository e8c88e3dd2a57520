//! Post service.

use chrono::{Duration, Utc};
use opinionated_common::{
    AppError, AppResult, IdGenerator, PAGE_SIZE, Page, storage::content_key,
};
use opinionated_db::{
    entities::{choice, post},
    repositories::{ChoiceRepository, PostRepository, TagRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Maximum number of choices a post can carry.
const MAX_CHOICES: usize = 10;

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    choice_repo: ChoiceRepository,
    tag_repo: TagRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for creating a post.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostInput {
    #[validate(length(min = 1, max = 4096))]
    pub description: String,

    /// Choice texts, in display order.
    pub choices: Vec<String>,

    /// Tag names, already parsed from the boundary's raw string.
    pub tags: Vec<String>,

    pub attachment_key: Option<String>,
}

/// The author's recorded decision on a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Decided, naming the chosen choice.
    Disclosed(String),
    /// Decided without saying which choice won.
    Undisclosed,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        choice_repo: ChoiceRepository,
        tag_repo: TagRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            post_repo,
            choice_repo,
            tag_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a post with its choices and tag links in one transaction.
    ///
    /// Tag rows are shared entities prepared up front (get-or-create); the
    /// post, choices, and links then commit or roll back together.
    pub async fn create_post(
        &self,
        author_id: &str,
        input: CreatePostInput,
    ) -> AppResult<(post::Model, Vec<choice::Model>)> {
        input.validate()?;

        if input.choices.len() < 2 {
            return Err(AppError::InvalidArgument(
                "A post needs at least 2 choices".to_string(),
            ));
        }
        if input.choices.len() > MAX_CHOICES {
            return Err(AppError::InvalidArgument(format!(
                "A post cannot have more than {MAX_CHOICES} choices"
            )));
        }
        for text in &input.choices {
            if text.trim().is_empty() {
                return Err(AppError::InvalidArgument(
                    "Choices cannot be blank".to_string(),
                ));
            }
        }

        let author = self.user_repo.get_by_id(author_id).await?;

        let mut tag_ids = Vec::new();
        for name in &input.tags {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let tag = self.tag_repo.get_or_create(name).await?;
            if !tag_ids.contains(&tag.id) {
                tag_ids.push(tag.id);
            }
        }

        let now = Utc::now();
        let post_id = self.id_gen.generate();
        let post_model = post::ActiveModel {
            id: Set(post_id.clone()),
            author_id: Set(author.id.clone()),
            description: Set(input.description),
            attachment_key: Set(input.attachment_key),
            decided: Set(false),
            decided_choice_id: Set(None),
            created_at: Set(now.into()),
        };

        // Staggered timestamps keep the choices' positional order stable
        // under the (created_at, id) sort.
        let choice_models: Vec<choice::ActiveModel> = input
            .choices
            .iter()
            .enumerate()
            .map(|(i, text)| choice::ActiveModel {
                id: Set(self.id_gen.generate()),
                post_id: Set(post_id.clone()),
                text: Set(Some(text.trim().to_string())),
                image_key: Set(None),
                created_at: Set((now + Duration::microseconds(i as i64 + 1)).into()),
            })
            .collect();

        let (created_post, created_choices) = self
            .post_repo
            .create_bundle(post_model, choice_models, &tag_ids)
            .await?;

        tracing::debug!(post_id = %created_post.id, author_id = %author.id, "Post created");
        Ok((created_post, created_choices))
    }

    /// Get a post by ID.
    pub async fn get_post(&self, post_id: &str) -> AppResult<post::Model> {
        self.post_repo.get_by_id(post_id).await
    }

    /// All posts, newest first, paginated.
    pub async fn all_posts(&self, page: u64) -> AppResult<Page<post::Model>> {
        self.post_repo.find_all(page, PAGE_SIZE).await
    }

    /// Posts by an author, newest first.
    pub async fn posts_by_author(&self, author_id: &str) -> AppResult<Vec<post::Model>> {
        self.user_repo.get_by_id(author_id).await?;
        self.post_repo.find_by_author(author_id).await
    }

    /// Record the author's decision on a post.
    ///
    /// Only the author may decide, and a disclosed choice must belong to the
    /// post. There is no way back to undecided.
    pub async fn decide(
        &self,
        post_id: &str,
        actor_id: &str,
        decision: Decision,
    ) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if post.author_id != actor_id {
            return Err(AppError::Unauthorized);
        }

        let decided_choice_id = match decision {
            Decision::Disclosed(choice_id) => {
                let choice = self.choice_repo.get_by_id(&choice_id).await?;
                if choice.post_id != post.id {
                    return Err(AppError::InvalidArgument(format!(
                        "Choice {choice_id} does not belong to post {post_id}"
                    )));
                }
                Some(choice.id)
            }
            Decision::Undisclosed => None,
        };

        let mut active: post::ActiveModel = post.into();
        active.decided = Set(true);
        active.decided_choice_id = Set(decided_choice_id);
        self.post_repo.update(active).await
    }

    /// Record an image key for one of the post's choices. Author only.
    pub async fn assign_choice_image(
        &self,
        choice_id: &str,
        actor_id: &str,
    ) -> AppResult<choice::Model> {
        let choice = self.choice_repo.get_by_id(choice_id).await?;
        let post = self.post_repo.get_by_id(&choice.post_id).await?;
        if post.author_id != actor_id {
            return Err(AppError::Unauthorized);
        }

        let key = content_key(&choice.id);
        let mut active: choice::ActiveModel = choice.into();
        active.image_key = Set(Some(key));
        self.choice_repo.update(active).await
    }

    /// Delete a post and everything attached to it. Author only.
    pub async fn delete_post(&self, post_id: &str, actor_id: &str) -> AppResult<()> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if post.author_id != actor_id {
            return Err(AppError::Unauthorized);
        }
        self.post_repo.delete_cascading(&post.id).await?;
        tracing::debug!(post_id = %post.id, "Post deleted");
        Ok(())
    }
}
