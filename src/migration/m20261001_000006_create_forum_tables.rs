use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum ForumCategories {
    Table,
    Id,
    Name,
    NameBn,
    Slug,
    Description,
    DisplayOrder,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ForumThreads {
    Table,
    Id,
    Title,
    Slug,
    Content,
    UserId,
    CategoryId,
    IsPinned,
    IsLocked,
    HasAcceptedAnswer,
    ViewCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ForumReplies {
    Table,
    Id,
    ThreadId,
    UserId,
    ParentId,
    Content,
    Upvotes,
    Downvotes,
    IsAccepted,
    IsDeleted,
    DeletedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ForumReplyVotes {
    Table,
    Id,
    ReplyId,
    UserId,
    VoteType,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ForumCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ForumCategories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ForumCategories::Name)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ForumCategories::NameBn)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ForumCategories::Slug)
                            .string_len(120)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ForumCategories::Description).text().null())
                    .col(
                        ColumnDef::new(ForumCategories::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ForumCategories::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ForumCategories::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ForumThreads::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ForumThreads::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ForumThreads::Title).string_len(300).not_null())
                    .col(
                        ColumnDef::new(ForumThreads::Slug)
                            .string_len(400)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ForumThreads::Content).text().not_null())
                    .col(ColumnDef::new(ForumThreads::UserId).integer().not_null())
                    .col(ColumnDef::new(ForumThreads::CategoryId).integer().not_null())
                    .col(
                        ColumnDef::new(ForumThreads::IsPinned)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ForumThreads::IsLocked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ForumThreads::HasAcceptedAnswer)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ForumThreads::ViewCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ForumThreads::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ForumThreads::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_threads_user_id")
                            .from(ForumThreads::Table, ForumThreads::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_threads_category_id")
                            .from(ForumThreads::Table, ForumThreads::CategoryId)
                            .to(ForumCategories::Table, ForumCategories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_forum_threads_listing")
                    .table(ForumThreads::Table)
                    .col(ForumThreads::CategoryId)
                    .col(ForumThreads::IsPinned)
                    .col(ForumThreads::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ForumReplies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ForumReplies::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ForumReplies::ThreadId).integer().not_null())
                    .col(ColumnDef::new(ForumReplies::UserId).integer().not_null())
                    .col(ColumnDef::new(ForumReplies::ParentId).integer().null())
                    .col(ColumnDef::new(ForumReplies::Content).text().not_null())
                    .col(
                        ColumnDef::new(ForumReplies::Upvotes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ForumReplies::Downvotes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ForumReplies::IsAccepted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ForumReplies::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ForumReplies::DeletedBy).integer().null())
                    .col(
                        ColumnDef::new(ForumReplies::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ForumReplies::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_replies_thread_id")
                            .from(ForumReplies::Table, ForumReplies::ThreadId)
                            .to(ForumThreads::Table, ForumThreads::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_replies_user_id")
                            .from(ForumReplies::Table, ForumReplies::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_forum_replies_thread_id")
                    .table(ForumReplies::Table)
                    .col(ForumReplies::ThreadId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ForumReplyVotes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ForumReplyVotes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ForumReplyVotes::ReplyId).integer().not_null())
                    .col(ColumnDef::new(ForumReplyVotes::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(ForumReplyVotes::VoteType)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ForumReplyVotes::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_reply_votes_reply_id")
                            .from(ForumReplyVotes::Table, ForumReplyVotes::ReplyId)
                            .to(ForumReplies::Table, ForumReplies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_reply_votes_user_id")
                            .from(ForumReplyVotes::Table, ForumReplyVotes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_forum_reply_votes_unique")
                    .table(ForumReplyVotes::Table)
                    .col(ForumReplyVotes::ReplyId)
                    .col(ForumReplyVotes::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ForumReplyVotes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ForumReplies::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ForumThreads::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ForumCategories::Table).to_owned())
            .await
    }
}
