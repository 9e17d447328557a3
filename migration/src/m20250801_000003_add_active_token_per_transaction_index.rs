use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 1取引につき残り回数のあるトークンは1件だけ（PostgreSQLの部分ユニークインデックス）
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS uq_download_tokens_active_transaction
                ON download_tokens (transaction_id)
                WHERE current_downloads < max_downloads",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS uq_download_tokens_active_transaction")
            .await?;

        Ok(())
    }
}
