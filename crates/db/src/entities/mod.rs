//! Entity definitions for the relational schema.

#![allow(missing_docs)]

pub mod choice;
pub mod comment;
pub mod follow;
pub mod post;
pub mod tag;
pub mod tag_post;
pub mod user;
pub mod vote;

pub use choice::Entity as Choice;
pub use comment::Entity as Comment;
pub use follow::Entity as Follow;
pub use post::Entity as Post;
pub use tag::Entity as Tag;
pub use tag_post::Entity as TagPost;
pub use user::Entity as User;
pub use vote::Entity as Vote;
