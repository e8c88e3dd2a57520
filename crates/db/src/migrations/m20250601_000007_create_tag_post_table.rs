//! Create tag_post join table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TagPost::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TagPost::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TagPost::TagId).string_len(32).not_null())
                    .col(ColumnDef::new(TagPost::PostId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(TagPost::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tag_post_tag")
                            .from(TagPost::Table, TagPost::TagId)
                            .to(Tag::Table, Tag::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tag_post_post")
                            .from(TagPost::Table, TagPost::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (tag_id, post_id) - tagging a post twice with the
        // same tag is a no-op
        manager
            .create_index(
                Index::create()
                    .name("idx_tag_post_tag_post")
                    .table(TagPost::Table)
                    .col(TagPost::TagId)
                    .col(TagPost::PostId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: post_id (for listing a post's tags)
        manager
            .create_index(
                Index::create()
                    .name("idx_tag_post_post_id")
                    .table(TagPost::Table)
                    .col(TagPost::PostId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TagPost::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum TagPost {
    Table,
    Id,
    TagId,
    PostId,
    CreatedAt,
}

#[derive(Iden)]
enum Tag {
    Table,
    Id,
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
}
