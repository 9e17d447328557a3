// migration/src/lib.rs
pub use sea_orm_migration::prelude::*;

// 配信対象リソース
mod m20250801_000001_create_resources_table;

// ダウンロードトークン
mod m20250801_000002_create_download_tokens_table;
mod m20250801_000003_add_active_token_per_transaction_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            // 1. リソーステーブル作成
            Box::new(m20250801_000001_create_resources_table::Migration),
            // 2. ダウンロードトークンテーブル作成（リソースIDは外部キーにしない）
            Box::new(m20250801_000002_create_download_tokens_table::Migration),
            // 3. 取引ごとの有効トークンを1件に制限
            Box::new(m20250801_000003_add_active_token_per_transaction_index::Migration),
        ]
    }
}
