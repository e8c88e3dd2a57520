//! Post entity (a question users vote on).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub author_id: String,

    /// The question text
    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Object-storage key of an optional attached file
    #[sea_orm(nullable)]
    pub attachment_key: Option<String>,

    /// Whether the author has recorded a final decision.
    ///
    /// `decided == true` with `decided_choice_id == None` means the author
    /// decided but chose not to disclose which choice.
    #[sea_orm(default_value = false)]
    pub decided: bool,

    /// The disclosed decision; always one of this post's own choices
    #[sea_orm(nullable)]
    pub decided_choice_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Author,

    #[sea_orm(has_many = "super::choice::Entity")]
    Choices,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,

    #[sea_orm(has_many = "super::tag_post::Entity")]
    TagLinks,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::choice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Choices.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
