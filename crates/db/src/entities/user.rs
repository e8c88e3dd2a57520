//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Display name shown next to posts and comments
    pub display_name: String,

    /// Argon2 hash; NULL for accounts provisioned by the external identity
    /// provider (they never hold a local password)
    #[sea_orm(nullable)]
    pub password_hash: Option<String>,

    /// Identifier assigned by the external identity provider, when the
    /// account was created through external login
    #[sea_orm(unique, nullable)]
    pub external_id: Option<String>,

    /// Self-reported gender, used for vote cross-tabulation
    #[sea_orm(nullable)]
    pub gender: Option<String>,

    /// Age bucket (e.g. "25-34"), used for vote cross-tabulation
    #[sea_orm(nullable)]
    pub age_bucket: Option<String>,

    /// Free-form "City, Region" location
    #[sea_orm(nullable)]
    pub location: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub about_me: Option<String>,

    /// Object-storage key of the profile picture
    #[sea_orm(nullable)]
    pub avatar_key: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Posts,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,

    #[sea_orm(has_many = "super::vote::Entity")]
    Votes,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Votes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
