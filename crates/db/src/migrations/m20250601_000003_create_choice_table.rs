//! Create choice table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Choice::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Choice::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Choice::PostId).string_len(32).not_null())
                    .col(ColumnDef::new(Choice::Text).text())
                    .col(ColumnDef::new(Choice::ImageKey).string_len(256))
                    .col(
                        ColumnDef::new(Choice::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_choice_post")
                            .from(Choice::Table, Choice::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: post_id (for listing a post's choices)
        manager
            .create_index(
                Index::create()
                    .name("idx_choice_post_id")
                    .table(Choice::Table)
                    .col(Choice::PostId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Choice::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Choice {
    Table,
    Id,
    PostId,
    Text,
    ImageKey,
    CreatedAt,
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
}
