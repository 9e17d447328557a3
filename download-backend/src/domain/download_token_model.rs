// src/domain/download_token_model.rs

use chrono::{DateTime, Duration, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

/// 回数制限付きダウンロードトークン
///
/// `id` はランダムに生成されたトークン文字列そのもので、
/// 引き換えURLのパスセグメントとしても使われる。
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "download_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[serde(skip_serializing)] // トークン本体はレスポンスに含めない
    pub id: String,

    pub resource_id: String,

    /// 変換済みの直接ダウンロードURL（共有リンクは保存しない）
    #[sea_orm(column_type = "Text")]
    pub original_url: String,

    pub max_downloads: i32,

    pub current_downloads: i32,

    pub owner_email: String,

    pub transaction_id: String,

    pub created_at: DateTime<Utc>,

    /// クリーンアップ用。引き換え時には検査しない
    pub expires_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// まだ引き換え可能か
    pub fn is_redeemable(&self) -> bool {
        self.current_downloads < self.max_downloads
    }

    /// 上限に達しているか
    pub fn is_exhausted(&self) -> bool {
        self.current_downloads >= self.max_downloads
    }

    pub fn remaining_downloads(&self) -> i32 {
        (self.max_downloads - self.current_downloads).max(0)
    }
}

/// ダウンロードトークンの作成用構造体
#[derive(Debug, Clone)]
pub struct CreateDownloadToken {
    pub id: String,
    pub resource_id: String,
    pub original_url: String,
    pub max_downloads: i32,
    pub owner_email: String,
    pub transaction_id: String,
    pub ttl: Duration,
}

impl CreateDownloadToken {
    /// 永続化前のレコードを組み立てる（カウンタは0から開始）
    pub fn into_model(self, now: DateTime<Utc>) -> Model {
        Model {
            id: self.id,
            resource_id: self.resource_id,
            original_url: self.original_url,
            max_downloads: self.max_downloads,
            current_downloads: 0,
            owner_email: self.owner_email,
            transaction_id: self.transaction_id,
            created_at: now,
            expires_at: now + self.ttl,
        }
    }
}

impl Model {
    /// INSERT 用に全カラムを Set した ActiveModel を作る
    pub fn into_insertable(self) -> ActiveModel {
        ActiveModel {
            id: Set(self.id),
            resource_id: Set(self.resource_id),
            original_url: Set(self.original_url),
            max_downloads: Set(self.max_downloads),
            current_downloads: Set(self.current_downloads),
            owner_email: Set(self.owner_email),
            transaction_id: Set(self.transaction_id),
            created_at: Set(self.created_at),
            expires_at: Set(self.expires_at),
        }
    }
}
