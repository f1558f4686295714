use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Roasts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Roasts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Roasts::Url).string().not_null())
                    .col(
                        ColumnDef::new(Roasts::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Roasts::ScreenshotUrl).string())
                    .col(ColumnDef::new(Roasts::Result).json())
                    .col(ColumnDef::new(Roasts::Score).integer())
                    .col(ColumnDef::new(Roasts::ErrorMessage).text())
                    .col(ColumnDef::new(Roasts::UserId).uuid())
                    .col(ColumnDef::new(Roasts::SessionId).string())
                    .col(ColumnDef::new(Roasts::ClaimedByUserId).uuid())
                    .col(ColumnDef::new(Roasts::ClaimedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Roasts::ClaimedFrom).uuid())
                    .col(
                        ColumnDef::new(Roasts::AttemptCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Roasts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Roasts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Roasts::CompletedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_roasts_user_created")
                    .table(Roasts::Table)
                    .col(Roasts::UserId)
                    .col(Roasts::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_roasts_session")
                    .table(Roasts::Table)
                    .col(Roasts::SessionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_roasts_score")
                    .table(Roasts::Table)
                    .col(Roasts::Score)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Roasts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Roasts {
    Table,
    Id,
    Url,
    Status,
    ScreenshotUrl,
    Result,
    Score,
    ErrorMessage,
    UserId,
    SessionId,
    ClaimedByUserId,
    ClaimedAt,
    ClaimedFrom,
    AttemptCount,
    CreatedAt,
    UpdatedAt,
    CompletedAt,
}
