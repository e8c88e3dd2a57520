//! Business logic services.

#![allow(missing_docs)]

pub mod aggregation;
pub mod comment;
pub mod follow;
pub mod post;
pub mod tag;
pub mod user;
pub mod vote;

pub use aggregation::{
    AggregationService, ChoiceColumn, ChoiceCount, CrossTab, CrossTabRow, Dimension, Tally,
};
pub use comment::CommentService;
pub use follow::FollowService;
pub use post::{CreatePostInput, Decision, PostService};
pub use tag::{TagService, TagWithCount, parse_tag_names};
pub use user::{ExternalProfile, FriendImportPolicy, RegisterInput, UserService};
pub use vote::VoteService;
