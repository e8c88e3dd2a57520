//! Aggregation and reporting over votes.

use std::collections::{BTreeMap, HashMap, HashSet};

use opinionated_common::AppResult;
use opinionated_db::{
    entities::{choice, user, vote},
    repositories::{ChoiceRepository, PostRepository, UserRepository, VoteRepository},
};
use serde::Serialize;

/// Partition label for voters whose demographic attribute is unset.
const UNKNOWN_PARTITION: &str = "unknown";

/// Vote count for a single choice.
#[derive(Debug, Clone, Serialize)]
pub struct ChoiceCount {
    pub choice_id: String,
    /// The choice's text, or a positional fallback when it has none.
    pub label: String,
    pub count: u64,
    /// Fraction of the total, `None` when nobody has voted yet.
    pub share: Option<f64>,
}

/// Per-choice counts for one post, in choice creation order.
#[derive(Debug, Clone, Serialize)]
pub struct Tally {
    pub counts: Vec<ChoiceCount>,
    pub total: u64,
}

impl Tally {
    /// The count recorded for a choice, zero if the choice is unknown.
    #[must_use]
    pub fn count_for(&self, choice_id: &str) -> u64 {
        self.counts
            .iter()
            .find(|c| c.choice_id == choice_id)
            .map_or(0, |c| c.count)
    }
}

/// Demographic axis for a cross-tabulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dimension {
    Gender,
    Location,
    AgeBucket,
}

/// One choice column of a cross-tabulation.
#[derive(Debug, Clone, Serialize)]
pub struct ChoiceColumn {
    pub choice_id: String,
    pub label: String,
}

/// One partition row of a cross-tabulation.
#[derive(Debug, Clone, Serialize)]
pub struct CrossTabRow {
    pub partition: String,
    /// One cell per column, aligned with [`CrossTab::columns`].
    pub cells: Vec<u64>,
}

/// Votes broken down by a demographic dimension.
#[derive(Debug, Clone, Serialize)]
pub struct CrossTab {
    pub dimension: Dimension,
    pub columns: Vec<ChoiceColumn>,
    /// Rows sorted by partition value.
    pub rows: Vec<CrossTabRow>,
}

/// Label for a choice: its text, or "choice N" by position when unset.
fn choice_label(c: &choice::Model, position: usize) -> String {
    match c.text.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => format!("choice {}", position + 1),
    }
}

/// Compute a tally from already-fetched rows.
///
/// Counts follow the order of `choices`; votes pointing at a choice not in
/// the slice are ignored.
#[must_use]
pub fn tally_from_rows(choices: &[choice::Model], votes: &[vote::Model]) -> Tally {
    let mut per_choice: HashMap<&str, u64> = HashMap::new();
    let known: HashSet<&str> = choices.iter().map(|c| c.id.as_str()).collect();
    let mut total = 0u64;
    for v in votes {
        if known.contains(v.choice_id.as_str()) {
            *per_choice.entry(v.choice_id.as_str()).or_insert(0) += 1;
            total += 1;
        }
    }

    let counts = choices
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let count = per_choice.get(c.id.as_str()).copied().unwrap_or(0);
            #[allow(clippy::cast_precision_loss)]
            let share = if total == 0 {
                None
            } else {
                Some(count as f64 / total as f64)
            };
            ChoiceCount {
                choice_id: c.id.clone(),
                label: choice_label(c, i),
                count,
                share,
            }
        })
        .collect();

    Tally { counts, total }
}

/// Normalize a voter's attribute into a partition value.
///
/// Locations keep only the part before the first comma, trimmed, so
/// "Austin, TX" and "Austin" land in the same partition. Unset or blank
/// attributes fall into the "unknown" partition.
fn partition_value(u: &user::Model, dimension: Dimension) -> String {
    let raw = match dimension {
        Dimension::Gender => u.gender.as_deref(),
        Dimension::AgeBucket => u.age_bucket.as_deref(),
        Dimension::Location => u.location.as_deref(),
    };
    let Some(raw) = raw else {
        return UNKNOWN_PARTITION.to_string();
    };
    let value = match dimension {
        Dimension::Location => raw.split(',').next().unwrap_or("").trim(),
        _ => raw.trim(),
    };
    if value.is_empty() {
        UNKNOWN_PARTITION.to_string()
    } else {
        value.to_string()
    }
}

/// Compute a cross-tabulation from already-fetched rows.
///
/// `voters` maps user ID to the voter's record; votes by users absent from
/// the map partition as "unknown".
#[must_use]
pub fn cross_tab_from_rows(
    choices: &[choice::Model],
    votes: &[vote::Model],
    voters: &HashMap<String, user::Model>,
    dimension: Dimension,
) -> CrossTab {
    let columns: Vec<ChoiceColumn> = choices
        .iter()
        .enumerate()
        .map(|(i, c)| ChoiceColumn {
            choice_id: c.id.clone(),
            label: choice_label(c, i),
        })
        .collect();

    let column_index: HashMap<&str, usize> = choices
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.as_str(), i))
        .collect();

    // BTreeMap keeps partition rows in sorted order.
    let mut rows: BTreeMap<String, Vec<u64>> = BTreeMap::new();
    for v in votes {
        let Some(&col) = column_index.get(v.choice_id.as_str()) else {
            continue;
        };
        let partition = voters.get(&v.user_id).map_or_else(
            || UNKNOWN_PARTITION.to_string(),
            |u| partition_value(u, dimension),
        );
        let cells = rows
            .entry(partition)
            .or_insert_with(|| vec![0; columns.len()]);
        cells[col] += 1;
    }

    CrossTab {
        dimension,
        columns,
        rows: rows
            .into_iter()
            .map(|(partition, cells)| CrossTabRow { partition, cells })
            .collect(),
    }
}

/// Aggregation service for reporting over a post's votes.
#[derive(Clone)]
pub struct AggregationService {
    post_repo: PostRepository,
    choice_repo: ChoiceRepository,
    vote_repo: VoteRepository,
    user_repo: UserRepository,
}

impl AggregationService {
    /// Create a new aggregation service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        choice_repo: ChoiceRepository,
        vote_repo: VoteRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            post_repo,
            choice_repo,
            vote_repo,
            user_repo,
        }
    }

    /// Current tally for a post.
    pub async fn tally(&self, post_id: &str) -> AppResult<Tally> {
        let post = self.post_repo.get_by_id(post_id).await?;
        let choices = self.choice_repo.find_by_post(&post.id).await?;
        let votes = self.vote_repo.find_by_post(&post.id).await?;
        Ok(tally_from_rows(&choices, &votes))
    }

    /// Distinct users who voted on any choice of the post.
    pub async fn voters_of(&self, post_id: &str) -> AppResult<Vec<user::Model>> {
        let post = self.post_repo.get_by_id(post_id).await?;
        let votes = self.vote_repo.find_by_post(&post.id).await?;
        let mut seen = HashSet::new();
        let ids: Vec<String> = votes
            .into_iter()
            .map(|v| v.user_id)
            .filter(|id| seen.insert(id.clone()))
            .collect();
        self.user_repo.find_by_ids(&ids).await
    }

    /// Break a post's votes down by a voter attribute.
    pub async fn cross_tabulate(&self, post_id: &str, dimension: Dimension) -> AppResult<CrossTab> {
        let post = self.post_repo.get_by_id(post_id).await?;
        let choices = self.choice_repo.find_by_post(&post.id).await?;
        let votes = self.vote_repo.find_by_post(&post.id).await?;

        let mut seen = HashSet::new();
        let voter_ids: Vec<String> = votes
            .iter()
            .map(|v| v.user_id.clone())
            .filter(|id| seen.insert(id.clone()))
            .collect();
        let voters: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&voter_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        Ok(cross_tab_from_rows(&choices, &votes, &voters, dimension))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_choice(id: &str, text: Option<&str>) -> choice::Model {
        choice::Model {
            id: id.to_string(),
            post_id: "p1".to_string(),
            text: text.map(String::from),
            image_key: None,
            created_at: Utc::now().into(),
        }
    }

    fn test_vote(id: &str, user_id: &str, choice_id: &str) -> vote::Model {
        vote::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            post_id: "p1".to_string(),
            choice_id: choice_id.to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_user(id: &str, gender: Option<&str>, location: Option<&str>) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            display_name: id.to_string(),
            password_hash: None,
            external_id: None,
            gender: gender.map(String::from),
            age_bucket: None,
            location: location.map(String::from),
            about_me: None,
            avatar_key: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_tally_counts_sum_to_total() {
        let choices = vec![test_choice("c1", Some("Pizza")), test_choice("c2", Some("Tacos"))];
        let votes = vec![
            test_vote("v1", "u1", "c1"),
            test_vote("v2", "u2", "c1"),
            test_vote("v3", "u3", "c2"),
        ];

        let tally = tally_from_rows(&choices, &votes);

        assert_eq!(tally.total, 3);
        assert_eq!(tally.counts.iter().map(|c| c.count).sum::<u64>(), tally.total);
        assert_eq!(tally.count_for("c1"), 2);
        assert_eq!(tally.count_for("c2"), 1);
    }

    #[test]
    fn test_tally_share_none_when_no_votes() {
        let choices = vec![test_choice("c1", Some("Pizza")), test_choice("c2", Some("Tacos"))];

        let tally = tally_from_rows(&choices, &[]);

        assert_eq!(tally.total, 0);
        assert!(tally.counts.iter().all(|c| c.share.is_none()));
    }

    #[test]
    fn test_tally_shares_sum_to_one() {
        let choices = vec![test_choice("c1", Some("Pizza")), test_choice("c2", Some("Tacos"))];
        let votes = vec![test_vote("v1", "u1", "c1"), test_vote("v2", "u2", "c2")];

        let tally = tally_from_rows(&choices, &votes);

        let sum: f64 = tally.counts.iter().filter_map(|c| c.share).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_positional_label_fallback() {
        let choices = vec![test_choice("c1", None), test_choice("c2", Some("  "))];

        let tally = tally_from_rows(&choices, &[]);

        assert_eq!(tally.counts[0].label, "choice 1");
        assert_eq!(tally.counts[1].label, "choice 2");
    }

    #[test]
    fn test_cross_tab_location_normalized_before_comma() {
        let choices = vec![test_choice("c1", Some("Pizza")), test_choice("c2", Some("Tacos"))];
        let votes = vec![
            test_vote("v1", "u1", "c1"),
            test_vote("v2", "u2", "c1"),
            test_vote("v3", "u3", "c2"),
        ];
        let voters: HashMap<String, user::Model> = [
            ("u1".to_string(), test_user("u1", None, Some("Austin, TX"))),
            ("u2".to_string(), test_user("u2", None, Some("Austin"))),
            ("u3".to_string(), test_user("u3", None, Some("Dallas, TX"))),
        ]
        .into();

        let table = cross_tab_from_rows(&choices, &votes, &voters, Dimension::Location);

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].partition, "Austin");
        assert_eq!(table.rows[0].cells, vec![2, 0]);
        assert_eq!(table.rows[1].partition, "Dallas");
        assert_eq!(table.rows[1].cells, vec![0, 1]);
    }

    #[test]
    fn test_cross_tab_unknown_partition() {
        let choices = vec![test_choice("c1", Some("Pizza"))];
        let votes = vec![test_vote("v1", "u1", "c1"), test_vote("v2", "u2", "c1")];
        let voters: HashMap<String, user::Model> = [
            ("u1".to_string(), test_user("u1", Some("female"), None)),
            ("u2".to_string(), test_user("u2", None, None)),
        ]
        .into();

        let table = cross_tab_from_rows(&choices, &votes, &voters, Dimension::Gender);

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].partition, "female");
        assert_eq!(table.rows[1].partition, "unknown");
    }

    #[test]
    fn test_cross_tab_cells_sum_to_tally() {
        let choices = vec![test_choice("c1", Some("Pizza")), test_choice("c2", Some("Tacos"))];
        let votes = vec![
            test_vote("v1", "u1", "c1"),
            test_vote("v2", "u2", "c2"),
            test_vote("v3", "u3", "c2"),
        ];
        let voters: HashMap<String, user::Model> = [
            ("u1".to_string(), test_user("u1", Some("male"), None)),
            ("u2".to_string(), test_user("u2", Some("female"), None)),
            ("u3".to_string(), test_user("u3", Some("male"), None)),
        ]
        .into();

        let tally = tally_from_rows(&choices, &votes);
        let table = cross_tab_from_rows(&choices, &votes, &voters, Dimension::Gender);

        for (col, column) in table.columns.iter().enumerate() {
            let column_sum: u64 = table.rows.iter().map(|r| r.cells[col]).sum();
            assert_eq!(column_sum, tally.count_for(&column.choice_id));
        }
    }
}
