// src/service/download_token_service.rs

//! 回数制限付きダウンロードトークンの発行と引き換え
//!
//! 状態遷移: 発行 → 引き換え（1..max回）→ 上限到達で削除。
//! カウンタは転送開始前に進め、到達した時点でレコードを削除する。

use crate::config::{AppConfig, FailedTransferPolicy};
use crate::domain::download_error::{GenerationError, RedemptionError};
use crate::domain::download_token_model::{self, CreateDownloadToken};
use crate::error::AppResult;
use crate::repository::download_token_repository::{
    ConsumeOutcome, DownloadTokenStore, InsertOutcome,
};
use crate::repository::resource_repository::ResourceCatalog;
use crate::service::download_proxy_service::{DownloadPayload, DownloadProxyService};
use crate::utils::link_converter::{convert_to_direct_link, is_valid_url};
use crate::utils::token::{generate_download_token, token_prefix};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

/// 発行結果。トークンそのものではなく引き換えURLを返す
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDownload {
    pub token_id: String,
    pub download_url: String,
    pub max_downloads: i32,
    pub remaining_downloads: i32,
    pub expires_at: DateTime<Utc>,
    /// 同じ取引の既存トークンを返した場合 true
    pub reused: bool,
}

pub struct DownloadTokenService {
    tokens: Arc<dyn DownloadTokenStore>,
    resources: Arc<dyn ResourceCatalog>,
    proxy: Arc<DownloadProxyService>,
    config: Arc<AppConfig>,
}

impl DownloadTokenService {
    pub fn new(
        tokens: Arc<dyn DownloadTokenStore>,
        resources: Arc<dyn ResourceCatalog>,
        proxy: Arc<DownloadProxyService>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            tokens,
            resources,
            proxy,
            config,
        }
    }

    /// 購入に対してダウンロードトークンを発行する（取引IDごとに冪等）
    pub async fn generate(
        &self,
        resource_id: &str,
        owner_email: &str,
        transaction_id: &str,
    ) -> Result<GeneratedDownload, GenerationError> {
        if let Some(existing) = self
            .tokens
            .find_active_by_transaction(transaction_id)
            .await
            .map_err(|e| GenerationError::Store(e.to_string()))?
        {
            if existing.is_redeemable() {
                info!(
                    transaction_id = %transaction_id,
                    token = %token_prefix(&existing.id),
                    "Reusing active download token for transaction"
                );
                return Ok(self.to_generated(existing, true));
            }
        }

        let resource = self
            .resources
            .find_by_id(resource_id)
            .await
            .map_err(|e| GenerationError::Store(e.to_string()))?
            .ok_or_else(|| GenerationError::ResourceNotFound(resource_id.to_string()))?;

        if !resource.has_download_url() {
            warn!(resource_id = %resource_id, "Resource has no download link");
            return Err(GenerationError::LinkUnavailable);
        }

        if !resource.is_active {
            warn!(resource_id = %resource_id, "Resource is inactive");
            return Err(GenerationError::ResourceInactive);
        }

        let converted = convert_to_direct_link(&resource.download_url);
        if !converted.is_valid || !is_valid_url(&converted.direct_url) {
            warn!(
                resource_id = %resource_id,
                provider = converted.provider.as_str(),
                "Resource download link could not be converted"
            );
            return Err(GenerationError::InvalidLink);
        }

        let token = CreateDownloadToken {
            id: generate_download_token(),
            resource_id: resource.id,
            original_url: converted.direct_url,
            max_downloads: self.config.download.max_downloads,
            owner_email: owner_email.to_string(),
            transaction_id: transaction_id.to_string(),
            ttl: Duration::hours(self.config.download.token_ttl_hours),
        }
        .into_model(Utc::now());

        let token = match self
            .tokens
            .insert(token)
            .await
            .map_err(|e| GenerationError::Store(e.to_string()))?
        {
            InsertOutcome::Created(token) => token,
            InsertOutcome::ActiveExists(existing) => {
                info!(
                    transaction_id = %transaction_id,
                    token = %token_prefix(&existing.id),
                    "Concurrent generation for transaction, reusing stored token"
                );
                return Ok(self.to_generated(existing, true));
            }
        };

        info!(
            resource_id = %token.resource_id,
            transaction_id = %transaction_id,
            token = %token_prefix(&token.id),
            provider = converted.provider.as_str(),
            "Download token generated"
        );

        Ok(self.to_generated(token, false))
    }

    /// トークンを1回分消費し、上流ファイルを取得する
    pub async fn redeem(&self, token_id: &str) -> Result<DownloadPayload, RedemptionError> {
        if token_id.trim().is_empty() {
            return Err(RedemptionError::InvalidToken);
        }

        let outcome = self
            .tokens
            .try_consume(token_id)
            .await
            .map_err(|e| RedemptionError::Store(e.to_string()))?;

        let token = match outcome {
            ConsumeOutcome::Consumed(token) => token,
            ConsumeOutcome::NotFound => {
                info!(token = %token_prefix(token_id), "Unknown download token");
                return Err(RedemptionError::InvalidToken);
            }
            ConsumeOutcome::Exhausted => {
                self.retire(token_id).await;
                info!(token = %token_prefix(token_id), "Download quota already exhausted");
                return Err(RedemptionError::QuotaExhausted);
            }
        };

        info!(
            token = %token_prefix(&token.id),
            resource_id = %token.resource_id,
            current_downloads = token.current_downloads,
            max_downloads = token.max_downloads,
            "Download token redeemed"
        );

        if token.is_exhausted() {
            self.retire(&token.id).await;
        }

        match self.proxy.fetch(&token.original_url).await {
            Ok(payload) => Ok(payload),
            Err(err) => {
                self.settle_failed_transfer(&token, &err).await;
                Err(err)
            }
        }
    }

    /// 有効期限切れトークンの掃除
    pub async fn cleanup_expired(&self) -> AppResult<u64> {
        let deleted = self.tokens.delete_expired(Utc::now()).await?;
        info!(deleted, "Expired download tokens removed");
        Ok(deleted)
    }

    pub fn failed_transfer_policy(&self) -> FailedTransferPolicy {
        self.config.download.failed_transfer_policy
    }

    /// 転送失敗時に消費済みの1回分をどう扱うか
    async fn settle_failed_transfer(
        &self,
        token: &download_token_model::Model,
        err: &RedemptionError,
    ) {
        warn!(
            token = %token_prefix(&token.id),
            error = %err,
            policy = ?self.failed_transfer_policy(),
            "Download transfer failed"
        );

        if self.failed_transfer_policy() != FailedTransferPolicy::Refund
            || !err.is_pre_stream_transfer_failure()
        {
            return;
        }

        match self.tokens.refund(token).await {
            Ok(()) => info!(token = %token_prefix(&token.id), "Download attempt refunded"),
            Err(e) => error!(
                token = %token_prefix(&token.id),
                error = %e,
                "Failed to refund download attempt"
            ),
        }
    }

    /// 上限に達したトークンを削除（失敗してもログのみ）
    async fn retire(&self, token_id: &str) {
        match self.tokens.delete(token_id).await {
            Ok(_) => info!(token = %token_prefix(token_id), "Download token retired"),
            Err(e) => error!(
                token = %token_prefix(token_id),
                error = %e,
                "Failed to retire download token"
            ),
        }
    }

    fn to_generated(&self, token: download_token_model::Model, reused: bool) -> GeneratedDownload {
        GeneratedDownload {
            download_url: self.config.download_access_url(&token.id),
            max_downloads: token.max_downloads,
            remaining_downloads: token.remaining_downloads(),
            expires_at: token.expires_at,
            token_id: token.id,
            reused,
        }
    }
}
