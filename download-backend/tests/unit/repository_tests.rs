// tests/unit/repository_tests.rs
use chrono::{Duration, Utc};
use download_backend::{
    config::AppConfig,
    domain::download_token_model::{self, CreateDownloadToken},
    repository::{
        download_token_repository::{
            ConsumeOutcome, DownloadTokenRepository, DownloadTokenStore, InsertOutcome,
        },
        resource_repository::{ResourceCatalog, ResourceRepository},
    },
    service::{
        download_proxy_service::DownloadProxyService, download_token_service::DownloadTokenService,
    },
    utils::token::generate_download_token,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use std::sync::Arc;

use crate::common;
use crate::common::app_helper::local_fetcher;

fn new_token(transaction_id: &str, ttl: Duration) -> CreateDownloadToken {
    CreateDownloadToken {
        id: generate_download_token(),
        resource_id: "game-1".to_string(),
        original_url: "https://files.example.com/game.zip".to_string(),
        max_downloads: 3,
        owner_email: "buyer@example.com".to_string(),
        transaction_id: transaction_id.to_string(),
        ttl,
    }
}

#[tokio::test]
async fn test_insert_and_find_token() {
    let db = common::db::TestDatabase::new().await;
    let repo = DownloadTokenRepository::new(db.connection.clone());

    let created = repo
        .insert(new_token("TXN1", Duration::hours(24)).into_model(Utc::now()))
        .await
        .unwrap()
        .into_model();

    let found = repo.find_by_id(&created.id).await.unwrap().unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.current_downloads, 0);
    assert_eq!(found.max_downloads, 3);

    let active = repo.find_active_by_transaction("TXN1").await.unwrap().unwrap();
    assert_eq!(active.id, created.id);
    assert!(repo.find_active_by_transaction("TXN2").await.unwrap().is_none());
}

#[tokio::test]
async fn test_one_active_token_per_transaction() {
    let db = common::db::TestDatabase::new().await;
    let repo = DownloadTokenRepository::new(db.connection.clone());

    let first = match repo
        .insert(new_token("TXN1", Duration::hours(24)).into_model(Utc::now()))
        .await
        .unwrap()
    {
        InsertOutcome::Created(token) => token,
        other => panic!("unexpected outcome: {:?}", other),
    };

    // 同じ取引の2件目は保存されず、既存のトークンが返る
    match repo
        .insert(new_token("TXN1", Duration::hours(24)).into_model(Utc::now()))
        .await
        .unwrap()
    {
        InsertOutcome::ActiveExists(existing) => assert_eq!(existing.id, first.id),
        other => panic!("unexpected outcome: {:?}", other),
    }

    // 使い切った後は新しいトークンを保存できる
    for _ in 0..3 {
        repo.try_consume(&first.id).await.unwrap();
    }
    match repo
        .insert(new_token("TXN1", Duration::hours(24)).into_model(Utc::now()))
        .await
        .unwrap()
    {
        InsertOutcome::Created(token) => assert_ne!(token.id, first.id),
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_generation_mints_single_token() {
    let db = common::db::TestDatabase::new().await;
    ResourceRepository::new(db.connection.clone())
        .create("game-1", "Desert Run", "https://files.example.com/game.zip", true)
        .await
        .unwrap();

    let config = Arc::new(AppConfig::for_testing());
    let service = Arc::new(DownloadTokenService::new(
        Arc::new(DownloadTokenRepository::new(db.connection.clone())),
        Arc::new(ResourceRepository::new(db.connection.clone())),
        Arc::new(DownloadProxyService::new(
            local_fetcher(),
            config.download.transfer_timeout,
        )),
        config,
    ));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .generate("game-1", "buyer@example.com", "TXN-concurrent")
                .await
                .unwrap()
        }));
    }

    let mut generated = Vec::new();
    for handle in handles {
        generated.push(handle.await.unwrap());
    }

    let token_id = &generated[0].token_id;
    assert!(generated.iter().all(|g| &g.token_id == token_id));
    assert_eq!(generated.iter().filter(|g| !g.reused).count(), 1);

    let stored = download_token_model::Entity::find()
        .filter(download_token_model::Column::TransactionId.eq("TXN-concurrent"))
        .count(&db.connection)
        .await
        .unwrap();
    assert_eq!(stored, 1);
}

#[tokio::test]
async fn test_consume_until_exhausted() {
    let db = common::db::TestDatabase::new().await;
    let repo = DownloadTokenRepository::new(db.connection.clone());

    let token = repo
        .insert(new_token("TXN1", Duration::hours(24)).into_model(Utc::now()))
        .await
        .unwrap()
        .into_model();

    for expected in 1..=3 {
        match repo.try_consume(&token.id).await.unwrap() {
            ConsumeOutcome::Consumed(updated) => assert_eq!(updated.current_downloads, expected),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    assert_eq!(
        repo.try_consume(&token.id).await.unwrap(),
        ConsumeOutcome::Exhausted
    );
    assert_eq!(
        repo.try_consume("missing").await.unwrap(),
        ConsumeOutcome::NotFound
    );

    // 使い切ったトークンは再利用の対象にならない
    assert!(repo.find_active_by_transaction("TXN1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_consumption_never_exceeds_quota() {
    let db = common::db::TestDatabase::new().await;
    let repo = Arc::new(DownloadTokenRepository::new(db.connection.clone()));

    let token = repo
        .insert(new_token("TXN1", Duration::hours(24)).into_model(Utc::now()))
        .await
        .unwrap()
        .into_model();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let repo = repo.clone();
        let id = token.id.clone();
        handles.push(tokio::spawn(async move { repo.try_consume(&id).await.unwrap() }));
    }

    let mut consumed = 0;
    for handle in handles {
        if let ConsumeOutcome::Consumed(_) = handle.await.unwrap() {
            consumed += 1;
        }
    }

    assert_eq!(consumed, 3);
    let stored = repo.find_by_id(&token.id).await.unwrap().unwrap();
    assert_eq!(stored.current_downloads, 3);
}

#[tokio::test]
async fn test_refund_restores_deleted_token() {
    let db = common::db::TestDatabase::new().await;
    let repo = DownloadTokenRepository::new(db.connection.clone());

    let token = repo
        .insert(new_token("TXN1", Duration::hours(24)).into_model(Utc::now()))
        .await
        .unwrap()
        .into_model();

    let consumed = match repo.try_consume(&token.id).await.unwrap() {
        ConsumeOutcome::Consumed(updated) => updated,
        other => panic!("unexpected outcome: {:?}", other),
    };

    repo.refund(&consumed).await.unwrap();
    let stored = repo.find_by_id(&token.id).await.unwrap().unwrap();
    assert_eq!(stored.current_downloads, 0);

    // 削除済みの場合は1回分戻した状態で作り直す
    let consumed = match repo.try_consume(&token.id).await.unwrap() {
        ConsumeOutcome::Consumed(updated) => updated,
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert!(repo.delete(&token.id).await.unwrap());
    assert!(!repo.delete(&token.id).await.unwrap());

    repo.refund(&consumed).await.unwrap();
    let restored = repo.find_by_id(&token.id).await.unwrap().unwrap();
    assert_eq!(restored.current_downloads, 0);
    assert_eq!(restored.transaction_id, "TXN1");
}

#[tokio::test]
async fn test_delete_expired_tokens() {
    let db = common::db::TestDatabase::new().await;
    let repo = DownloadTokenRepository::new(db.connection.clone());

    let expired = repo
        .insert(new_token("TXN1", Duration::hours(-1)).into_model(Utc::now()))
        .await
        .unwrap()
        .into_model();
    let live = repo
        .insert(new_token("TXN2", Duration::hours(24)).into_model(Utc::now()))
        .await
        .unwrap()
        .into_model();

    assert_eq!(repo.delete_expired(Utc::now()).await.unwrap(), 1);
    assert!(repo.find_by_id(&expired.id).await.unwrap().is_none());
    assert!(repo.find_by_id(&live.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_resource_catalog_lookup() {
    let db = common::db::TestDatabase::new().await;
    let repo = ResourceRepository::new(db.connection.clone());

    repo.create(
        "game-1",
        "Desert Run",
        "https://www.dropbox.com/s/abc/game.zip?dl=0",
        true,
    )
    .await
    .unwrap();

    let found = repo.find_by_id("game-1").await.unwrap().unwrap();
    assert_eq!(found.title, "Desert Run");
    assert!(found.is_active);
    assert!(repo.find_by_id("game-2").await.unwrap().is_none());
}
