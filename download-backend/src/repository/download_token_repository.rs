// src/repository/download_token_repository.rs

use crate::domain::download_token_model::{
    self, Column as DownloadTokenColumn, Entity as DownloadTokenEntity,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::*;
use sea_orm::sea_query::Expr;
use sea_orm::{query::*, DbConn, DbErr, Order, QueryFilter, QueryOrder, SqlErr};

/// 引き換え1回分の消費結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// カウンタを1つ進めた。値は更新後のレコード
    Consumed(download_token_model::Model),
    /// 既に上限に達している
    Exhausted,
    /// トークンが存在しない
    NotFound,
}

/// 発行時の保存結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// 新しく保存した
    Created(download_token_model::Model),
    /// 同じ取引の有効なトークンが既にあった。値は既存のレコード
    ActiveExists(download_token_model::Model),
}

impl InsertOutcome {
    pub fn into_model(self) -> download_token_model::Model {
        match self {
            Self::Created(token) | Self::ActiveExists(token) => token,
        }
    }
}

/// ダウンロードトークンの保存先
///
/// カウンタの更新は `try_consume` の条件付き更新でのみ行う。
/// 1つの取引IDに対して残り回数のあるトークンは常に1件までとする。
#[async_trait]
pub trait DownloadTokenStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<download_token_model::Model>, DbErr>;

    /// 取引IDに紐づく、まだ残り回数のあるトークン
    async fn find_active_by_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<download_token_model::Model>, DbErr>;

    /// 保存する。同じ取引の有効なトークンがあれば保存せずにそれを返す
    async fn insert(&self, token: download_token_model::Model) -> Result<InsertOutcome, DbErr>;

    /// `current_downloads < max_downloads` の場合だけ1つ加算する
    async fn try_consume(&self, id: &str) -> Result<ConsumeOutcome, DbErr>;

    /// 消費した1回分を戻す。削除済みなら戻した状態で復元する
    async fn refund(&self, consumed: &download_token_model::Model) -> Result<(), DbErr>;

    async fn delete(&self, id: &str) -> Result<bool, DbErr>;

    /// 有効期限切れのトークンを削除し、削除件数を返す
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DbErr>;
}

pub struct DownloadTokenRepository {
    db: DbConn,
}

impl DownloadTokenRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DownloadTokenStore for DownloadTokenRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<download_token_model::Model>, DbErr> {
        DownloadTokenEntity::find_by_id(id.to_string())
            .one(&self.db)
            .await
    }

    async fn find_active_by_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<download_token_model::Model>, DbErr> {
        DownloadTokenEntity::find()
            .filter(DownloadTokenColumn::TransactionId.eq(transaction_id))
            .filter(
                Expr::col(DownloadTokenColumn::CurrentDownloads)
                    .lt(Expr::col(DownloadTokenColumn::MaxDownloads)),
            )
            .order_by(DownloadTokenColumn::CreatedAt, Order::Desc)
            .one(&self.db)
            .await
    }

    async fn insert(&self, token: download_token_model::Model) -> Result<InsertOutcome, DbErr> {
        let transaction_id = token.transaction_id.clone();

        match token.into_insertable().insert(&self.db).await {
            Ok(created) => Ok(InsertOutcome::Created(created)),
            // 部分ユニークインデックスに弾かれた場合は先に保存された側を返す
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                match self.find_active_by_transaction(&transaction_id).await? {
                    Some(existing) => Ok(InsertOutcome::ActiveExists(existing)),
                    None => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }

    async fn try_consume(&self, id: &str) -> Result<ConsumeOutcome, DbErr> {
        // UPDATE ... SET current_downloads = current_downloads + 1
        // WHERE id = $1 AND current_downloads < max_downloads RETURNING *
        let mut updated = DownloadTokenEntity::update_many()
            .col_expr(
                DownloadTokenColumn::CurrentDownloads,
                Expr::col(DownloadTokenColumn::CurrentDownloads).add(1),
            )
            .filter(DownloadTokenColumn::Id.eq(id))
            .filter(
                Expr::col(DownloadTokenColumn::CurrentDownloads)
                    .lt(Expr::col(DownloadTokenColumn::MaxDownloads)),
            )
            .exec_with_returning(&self.db)
            .await?;

        if let Some(token) = updated.pop() {
            return Ok(ConsumeOutcome::Consumed(token));
        }

        // 0行の場合は存在しないのか上限到達なのかを判別する
        match self.find_by_id(id).await? {
            Some(_) => Ok(ConsumeOutcome::Exhausted),
            None => Ok(ConsumeOutcome::NotFound),
        }
    }

    async fn refund(&self, consumed: &download_token_model::Model) -> Result<(), DbErr> {
        let result = DownloadTokenEntity::update_many()
            .col_expr(
                DownloadTokenColumn::CurrentDownloads,
                Expr::col(DownloadTokenColumn::CurrentDownloads).sub(1),
            )
            .filter(DownloadTokenColumn::Id.eq(consumed.id.as_str()))
            .filter(DownloadTokenColumn::CurrentDownloads.gt(0))
            .exec(&self.db)
            .await?;

        if result.rows_affected > 0 {
            return Ok(());
        }

        if self.find_by_id(&consumed.id).await?.is_none() {
            let mut restored = consumed.clone();
            restored.current_downloads = (consumed.current_downloads - 1).max(0);
            restored.into_insertable().insert(&self.db).await?;
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, DbErr> {
        let result = DownloadTokenEntity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DbErr> {
        let result = DownloadTokenEntity::delete_many()
            .filter(DownloadTokenColumn::ExpiresAt.lte(now))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
