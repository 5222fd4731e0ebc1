//! Storage backend contract tests
//!
//! Every check runs against the memory, JSON file and SQLite backends.

use std::sync::Arc;

use tempfile::TempDir;
use tinylink::config::StorageConfig;
use tinylink::errors::TinylinkError;
use tinylink::storage::{
    FileRepository, MemoryRepository, SeaOrmRepository, StorageFactory, UrlPair, UrlRepository,
};

/// 创建临时 SQLite 数据库的存储实例
async fn create_temp_sqlite() -> (SeaOrmRepository, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let repo = SeaOrmRepository::new(&db_url, &StorageConfig::default())
        .await
        .expect("Failed to create storage");

    (repo, temp_dir)
}

/// 三个后端各一份，TempDir 需要与存储实例同生命周期
async fn all_backends() -> Vec<(Arc<dyn UrlRepository>, TempDir)> {
    let file_dir = TempDir::new().unwrap();
    let file_repo = FileRepository::open(file_dir.path().join("links.json")).unwrap();

    let (sqlite_repo, sqlite_dir) = create_temp_sqlite().await;

    vec![
        (Arc::new(MemoryRepository::new()), TempDir::new().unwrap()),
        (Arc::new(file_repo), file_dir),
        (Arc::new(sqlite_repo), sqlite_dir),
    ]
}

#[tokio::test]
async fn test_save_and_get() {
    for (repo, _dir) in all_backends().await {
        let pair = UrlPair::new("AbCdEfg", "https://example.com", "u1");
        repo.save(pair.clone()).await.unwrap();

        let stored = repo.get_by_short("AbCdEfg").await.unwrap();
        assert_eq!(stored, Some(pair), "backend {}", repo.backend_name());
        assert_eq!(repo.get_by_short("missing").await.unwrap(), None);
    }
}

#[tokio::test]
async fn test_duplicate_short_is_conflict() {
    for (repo, _dir) in all_backends().await {
        repo.save(UrlPair::new("dup", "https://a.io", "u1"))
            .await
            .unwrap();

        let err = repo
            .save(UrlPair::new("dup", "https://b.io", "u2"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, TinylinkError::Conflict(_)),
            "backend {} returned {:?}",
            repo.backend_name(),
            err
        );

        let stored = repo.get_by_short("dup").await.unwrap().unwrap();
        assert_eq!(stored.long, "https://a.io");
    }
}

#[tokio::test]
async fn test_save_many_is_all_or_nothing() {
    for (repo, _dir) in all_backends().await {
        repo.save(UrlPair::new("taken", "https://taken.io", ""))
            .await
            .unwrap();

        let result = repo
            .save_many(vec![
                UrlPair::new("b1", "https://b1.io", "u1"),
                UrlPair::new("taken", "https://other.io", "u1"),
                UrlPair::new("b3", "https://b3.io", "u1"),
            ])
            .await;
        assert!(result.is_err(), "backend {}", repo.backend_name());
        assert_eq!(repo.get_by_short("b1").await.unwrap(), None);
        assert_eq!(repo.get_by_short("b3").await.unwrap(), None);

        repo.save_many(vec![
            UrlPair::new("b1", "https://b1.io", "u1"),
            UrlPair::new("b3", "https://b3.io", "u1"),
        ])
        .await
        .unwrap();
        assert_eq!(repo.get_all_by_owner("u1").await.unwrap().len(), 2);

        // 空批次是 no-op
        repo.save_many(Vec::new()).await.unwrap();
    }
}

#[tokio::test]
async fn test_get_all_by_owner_filters_owner_and_deleted() {
    for (repo, _dir) in all_backends().await {
        repo.save(UrlPair::new("a1", "https://a1.io", "alice"))
            .await
            .unwrap();
        repo.save(UrlPair::new("a2", "https://a2.io", "alice"))
            .await
            .unwrap();
        repo.save(UrlPair::new("b1", "https://b1.io", "bob"))
            .await
            .unwrap();
        repo.save(UrlPair::new("anon", "https://anon.io", ""))
            .await
            .unwrap();

        repo.delete_by_shorts("alice", &["a2".to_string()])
            .await
            .unwrap();

        let mut alice: Vec<String> = repo
            .get_all_by_owner("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.short)
            .collect();
        alice.sort();
        assert_eq!(alice, vec!["a1".to_string()], "backend {}", repo.backend_name());

        assert!(repo.get_all_by_owner("nobody").await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_delete_by_shorts_is_owner_scoped_and_idempotent() {
    for (repo, _dir) in all_backends().await {
        repo.save(UrlPair::new("x1", "https://x1.io", "alice"))
            .await
            .unwrap();
        repo.save(UrlPair::new("x2", "https://x2.io", "alice"))
            .await
            .unwrap();

        // 别人的删除请求不生效
        let affected = repo
            .delete_by_shorts("mallory", &["x1".to_string()])
            .await
            .unwrap();
        assert_eq!(affected, 0);

        let affected = repo
            .delete_by_shorts(
                "alice",
                &["x1".to_string(), "x2".to_string(), "unknown".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(affected, 2, "backend {}", repo.backend_name());

        let affected = repo
            .delete_by_shorts("alice", &["x1".to_string()])
            .await
            .unwrap();
        assert_eq!(affected, 0);

        let pair = repo.get_by_short("x1").await.unwrap().unwrap();
        assert!(pair.is_deleted);
        assert_eq!(pair.long, "https://x1.io");
    }
}

#[tokio::test]
async fn test_file_backend_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("links.json");

    {
        let repo = FileRepository::open(&path).unwrap();
        repo.save(UrlPair::new("keep", "https://keep.io", "u1"))
            .await
            .unwrap();
        repo.save_many(vec![UrlPair::new("gone", "https://gone.io", "u1")])
            .await
            .unwrap();
        repo.delete_by_shorts("u1", &["gone".to_string()])
            .await
            .unwrap();
    }

    let repo = FileRepository::open(&path).unwrap();
    assert_eq!(
        repo.get_by_short("keep").await.unwrap().unwrap().long,
        "https://keep.io"
    );
    assert!(repo.get_by_short("gone").await.unwrap().unwrap().is_deleted);
}

#[tokio::test]
async fn test_sqlite_backend_survives_reconnect() {
    let temp_dir = TempDir::new().unwrap();
    let db_url = format!("sqlite://{}?mode=rwc", temp_dir.path().join("t.db").display());

    {
        let repo = SeaOrmRepository::new(&db_url, &StorageConfig::default())
            .await
            .unwrap();
        repo.save(UrlPair::new("keep", "https://keep.io", "u1"))
            .await
            .unwrap();
    }

    // 迁移可重复执行
    let repo = SeaOrmRepository::new(&db_url, &StorageConfig::default())
        .await
        .unwrap();
    assert_eq!(repo.backend_name(), "sqlite");
    assert!(repo.get_by_short("keep").await.unwrap().is_some());
}

#[tokio::test]
async fn test_factory_selects_backend_from_config() {
    let temp_dir = TempDir::new().unwrap();

    let memory = StorageFactory::create(&StorageConfig::default())
        .await
        .unwrap();
    assert_eq!(memory.backend_name(), "memory");

    let file = StorageFactory::create(&StorageConfig {
        file_path: Some(temp_dir.path().join("f.json").display().to_string()),
        ..StorageConfig::default()
    })
    .await
    .unwrap();
    assert_eq!(file.backend_name(), "file");

    let db = StorageFactory::create(&StorageConfig {
        database_url: Some(format!(
            "sqlite://{}?mode=rwc",
            temp_dir.path().join("f.db").display()
        )),
        file_path: Some(temp_dir.path().join("ignored.json").display().to_string()),
        ..StorageConfig::default()
    })
    .await
    .unwrap();
    assert_eq!(db.backend_name(), "sqlite");
}

#[tokio::test]
async fn test_factory_rejects_unknown_database_scheme() {
    let err = StorageFactory::create(&StorageConfig {
        database_url: Some("redis://localhost".into()),
        ..StorageConfig::default()
    })
    .await
    .err()
    .unwrap();
    assert!(matches!(err, TinylinkError::DatabaseConfig(_)));
}
