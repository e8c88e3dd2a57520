//! Tag index.

use opinionated_common::{AppResult, PAGE_SIZE, Page};
use opinionated_db::{
    entities::{post, tag},
    repositories::{PostRepository, TagRepository},
};

/// A tag together with its distinct linked-post count.
#[derive(Debug, Clone)]
pub struct TagWithCount {
    pub tag: tag::Model,
    pub post_count: u64,
}

/// Split a raw comma-separated tag string into clean names.
///
/// Names are trimmed, blanks dropped, duplicates removed preserving first
/// occurrence. Matching is case-sensitive, so "Food" and "food" stay
/// distinct.
#[must_use]
pub fn parse_tag_names(raw: &str) -> Vec<String> {
    let mut names = Vec::new();
    for part in raw.split(',') {
        let name = part.trim();
        if name.is_empty() {
            continue;
        }
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Tag service for business logic.
#[derive(Clone)]
pub struct TagService {
    tag_repo: TagRepository,
    post_repo: PostRepository,
}

impl TagService {
    /// Create a new tag service.
    #[must_use]
    pub const fn new(tag_repo: TagRepository, post_repo: PostRepository) -> Self {
        Self {
            tag_repo,
            post_repo,
        }
    }

    /// Attach tags to a post by name, reusing existing tag rows.
    ///
    /// Idempotent per (tag, post) pair. Blank names are skipped.
    pub async fn attach_tags(&self, post_id: &str, names: &[String]) -> AppResult<Vec<tag::Model>> {
        let post = self.post_repo.get_by_id(post_id).await?;

        let mut attached = Vec::new();
        for name in names {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let tag = self.tag_repo.get_or_create(name).await?;
            self.tag_repo.link_post(&tag.id, &post.id).await?;
            attached.push(tag);
        }
        Ok(attached)
    }

    /// The tags attached to a post, by name.
    pub async fn tags_of(&self, post_id: &str) -> AppResult<Vec<tag::Model>> {
        self.tag_repo.find_by_post(post_id).await
    }

    /// Posts carrying the exact tag name, newest first, paginated.
    ///
    /// An unknown tag yields an empty page, not an error.
    pub async fn posts_by_tag(&self, name: &str, page: u64) -> AppResult<Page<post::Model>> {
        let Some(tag) = self.tag_repo.find_by_name(name).await? else {
            return Ok(Page::empty(Page::<post::Model>::normalize(page), PAGE_SIZE));
        };
        let post_ids = self.tag_repo.post_ids_for_tag(&tag.id).await?;
        self.post_repo
            .find_by_ids_paged(&post_ids, page, PAGE_SIZE)
            .await
    }

    /// The `n` tags with the most distinct linked posts.
    ///
    /// Ordered by count descending; ties break by name ascending, so repeated
    /// calls return the same ranking.
    pub async fn most_popular(&self, n: usize) -> AppResult<Vec<TagWithCount>> {
        let tags = self.tag_repo.find_all().await?;
        let counts = self.tag_repo.post_counts().await?;

        // Tags arrive name-ascending; a stable sort on count keeps that as
        // the tie-break.
        let mut ranked: Vec<TagWithCount> = tags
            .into_iter()
            .map(|tag| {
                let post_count = counts.get(&tag.id).copied().unwrap_or(0);
                TagWithCount { tag, post_count }
            })
            .collect();
        ranked.sort_by(|a, b| b.post_count.cmp(&a.post_count));
        ranked.truncate(n);
        Ok(ranked)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn test_tag(id: &str, name: &str) -> tag::Model {
        tag::Model {
            id: id.to_string(),
            name: name.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_parse_tag_names_trims_and_dedupes() {
        let names = parse_tag_names(" food , travel,food , ,tech");
        assert_eq!(names, vec!["food", "travel", "tech"]);
    }

    #[test]
    fn test_parse_tag_names_case_sensitive() {
        let names = parse_tag_names("Food,food");
        assert_eq!(names, vec!["Food", "food"]);
    }

    #[test]
    fn test_parse_tag_names_empty_input() {
        assert!(parse_tag_names("  , ,").is_empty());
    }

    #[tokio::test]
    async fn test_posts_by_tag_unknown_yields_empty_page() {
        let tag_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<tag::Model>::new()])
                .into_connection(),
        );
        let post_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = TagService::new(TagRepository::new(tag_db), PostRepository::new(post_db));
        let page = service.posts_by_tag("nope", 1).await.unwrap();

        assert!(page.items.is_empty());
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn test_most_popular_ties_break_by_name() {
        use opinionated_db::entities::tag_post;

        let tags = vec![test_tag("t2", "alpha"), test_tag("t1", "beta")];
        let links = vec![
            tag_post::Model {
                id: "l1".to_string(),
                tag_id: "t1".to_string(),
                post_id: "p1".to_string(),
                created_at: Utc::now().into(),
            },
            tag_post::Model {
                id: "l2".to_string(),
                tag_id: "t2".to_string(),
                post_id: "p1".to_string(),
                created_at: Utc::now().into(),
            },
        ];

        let tag_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([tags])
                .append_query_results([links])
                .into_connection(),
        );
        let post_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = TagService::new(TagRepository::new(tag_db), PostRepository::new(post_db));
        let ranked = service.most_popular(10).await.unwrap();

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].tag.name, "alpha");
        assert_eq!(ranked[1].tag.name, "beta");
        assert!(ranked.iter().all(|t| t.post_count == 1));
    }
}
