//! Create post table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Post::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Post::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Post::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Post::Content).text().not_null())
                    .col(ColumnDef::new(Post::MediaRef).string_len(1024))
                    .col(ColumnDef::new(Post::ParentId).string_len(32))
                    .col(
                        ColumnDef::new(Post::IsRepost)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Post::OriginalPostId).string_len(32))
                    .col(
                        ColumnDef::new(Post::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Post::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_user")
                            .from(Post::Table, Post::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    // Replies go away with their parent
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_parent")
                            .from(Post::Table, Post::ParentId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    // Reposts survive their original, detached
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_original_post")
                            .from(Post::Table, Post::OriginalPostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (created_at, id) for newest-first feeds
        manager
            .create_index(
                Index::create()
                    .name("idx_post_created_at_id")
                    .table(Post::Table)
                    .col(Post::CreatedAt)
                    .col(Post::Id)
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, created_at) for profile and home feeds
        manager
            .create_index(
                Index::create()
                    .name("idx_post_user_id_created_at")
                    .table(Post::Table)
                    .col(Post::UserId)
                    .col(Post::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: parent_id (reply counts and cascade)
        manager
            .create_index(
                Index::create()
                    .name("idx_post_parent_id")
                    .table(Post::Table)
                    .col(Post::ParentId)
                    .to_owned(),
            )
            .await?;

        // Index: original_post_id (repost counts)
        manager
            .create_index(
                Index::create()
                    .name("idx_post_original_post_id")
                    .table(Post::Table)
                    .col(Post::OriginalPostId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Post::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
    UserId,
    Content,
    MediaRef,
    ParentId,
    IsRepost,
    OriginalPostId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
