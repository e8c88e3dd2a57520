//! Repository types for database operations.

#![allow(missing_docs)]

pub mod choice;
pub mod comment;
pub mod follow;
pub mod post;
pub mod tag;
pub mod user;
pub mod vote;

pub use choice::ChoiceRepository;
pub use comment::CommentRepository;
pub use follow::FollowRepository;
pub use post::PostRepository;
pub use tag::TagRepository;
pub use user::UserRepository;
pub use vote::VoteRepository;
