use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DownloadTokens::Table)
                    .if_not_exists()
                    // トークン文字列そのものが主キー
                    .col(
                        ColumnDef::new(DownloadTokens::Id)
                            .string_len(128)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DownloadTokens::ResourceId)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(DownloadTokens::OriginalUrl).text().not_null())
                    .col(
                        ColumnDef::new(DownloadTokens::MaxDownloads)
                            .integer()
                            .not_null()
                            .default(3),
                    )
                    .col(
                        ColumnDef::new(DownloadTokens::CurrentDownloads)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DownloadTokens::OwnerEmail)
                            .string_len(320)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DownloadTokens::TransactionId)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DownloadTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(DownloadTokens::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .check(
                        Expr::col(DownloadTokens::CurrentDownloads)
                            .gte(0)
                            .and(
                                Expr::col(DownloadTokens::CurrentDownloads)
                                    .lte(Expr::col(DownloadTokens::MaxDownloads)),
                            ),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一取引の有効トークン検索用インデックス
        manager
            .create_index(
                Index::create()
                    .table(DownloadTokens::Table)
                    .name("idx_download_tokens_transaction_id")
                    .col(DownloadTokens::TransactionId)
                    .to_owned(),
            )
            .await?;

        // 有効期限でのクリーンアップ用インデックス
        manager
            .create_index(
                Index::create()
                    .table(DownloadTokens::Table)
                    .name("idx_download_tokens_expires_at")
                    .col(DownloadTokens::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .table(DownloadTokens::Table)
                    .name("idx_download_tokens_expires_at")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .table(DownloadTokens::Table)
                    .name("idx_download_tokens_transaction_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(DownloadTokens::Table).to_owned())
            .await
    }
}

/// Iden enum for the download_tokens table
#[derive(DeriveIden)]
enum DownloadTokens {
    Table,
    Id,
    ResourceId,
    OriginalUrl,
    MaxDownloads,
    CurrentDownloads,
    OwnerEmail,
    TransactionId,
    CreatedAt,
    ExpiresAt,
}
