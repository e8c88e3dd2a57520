//! Tag entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Topic tag, linked to posts through [`super::tag_post`].
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tag")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Tag name; unique and matched case-sensitively
    #[sea_orm(unique)]
    pub name: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tag_post::Entity")]
    PostLinks,
}

impl Related<super::tag_post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
