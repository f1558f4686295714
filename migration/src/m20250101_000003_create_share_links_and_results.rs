use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create share_links table
        manager
            .create_table(
                Table::create()
                    .table(ShareLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShareLinks::ShareId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ShareLinks::RoastId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ShareLinks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Denormalized results, one row per completed roast
        manager
            .create_table(
                Table::create()
                    .table(RoastResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RoastResults::RoastId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RoastResults::Url).string().not_null())
                    .col(ColumnDef::new(RoastResults::ScreenshotUrl).string())
                    .col(ColumnDef::new(RoastResults::Score).integer().not_null())
                    .col(ColumnDef::new(RoastResults::Result).json().not_null())
                    .col(
                        ColumnDef::new(RoastResults::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RoastResults::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ShareLinks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ShareLinks {
    Table,
    ShareId,
    RoastId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum RoastResults {
    Table,
    RoastId,
    Url,
    ScreenshotUrl,
    Score,
    Result,
    CreatedAt,
}
