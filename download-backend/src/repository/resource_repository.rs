// src/repository/resource_repository.rs

use crate::domain::resource_model::{self, ActiveModel as ResourceActiveModel, Entity as ResourceEntity};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::entity::*;
use sea_orm::{DbConn, DbErr, Set};

/// 商品カタログの参照口
#[async_trait]
pub trait ResourceCatalog: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<resource_model::Model>, DbErr>;
}

pub struct ResourceRepository {
    db: DbConn,
}

impl ResourceRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// 商品を登録する（管理画面・初期データ投入用）
    pub async fn create(
        &self,
        id: &str,
        title: &str,
        download_url: &str,
        is_active: bool,
    ) -> Result<resource_model::Model, DbErr> {
        let now = Utc::now();
        let resource = ResourceActiveModel {
            id: Set(id.to_string()),
            title: Set(title.to_string()),
            download_url: Set(download_url.to_string()),
            is_active: Set(is_active),
            created_at: Set(now),
            updated_at: Set(now),
        };
        resource.insert(&self.db).await
    }
}

#[async_trait]
impl ResourceCatalog for ResourceRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<resource_model::Model>, DbErr> {
        ResourceEntity::find_by_id(id.to_string()).one(&self.db).await
    }
}
