//! Deletion pipeline against real backends

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tinylink::config::{DeletionConfig, StorageConfig};
use tinylink::deletion::{DeleteTask, DeletionPipeline};
use tinylink::storage::{MemoryRepository, SeaOrmRepository, UrlPair, UrlRepository};

async fn seed(repo: &dyn UrlRepository, owner: &str, count: usize) -> Vec<String> {
    let pairs: Vec<UrlPair> = (0..count)
        .map(|i| {
            UrlPair::new(
                format!("{}-{}", owner, i),
                format!("https://{}.io/{}", owner, i),
                owner,
            )
        })
        .collect();
    let shorts = pairs.iter().map(|p| p.short.clone()).collect();
    repo.save_many(pairs).await.unwrap();
    shorts
}

#[tokio::test]
async fn test_pipeline_soft_deletes_in_sqlite() {
    let temp_dir = TempDir::new().unwrap();
    let db_url = format!("sqlite://{}?mode=rwc", temp_dir.path().join("d.db").display());
    let repo: Arc<dyn UrlRepository> = Arc::new(
        SeaOrmRepository::new(&db_url, &StorageConfig::default())
            .await
            .unwrap(),
    );

    let alice = seed(repo.as_ref(), "alice", 3).await;
    let bob = seed(repo.as_ref(), "bob", 2).await;

    let pipeline = DeletionPipeline::start(repo.clone(), &DeletionConfig::default());
    for short in &alice[..2] {
        pipeline
            .enqueue(DeleteTask::new("alice", short.clone()))
            .await
            .unwrap();
    }
    // bob 的短码以 alice 身份删除，不生效
    pipeline
        .enqueue(DeleteTask::new("alice", bob[0].clone()))
        .await
        .unwrap();
    pipeline.flush().await.unwrap();

    assert_eq!(repo.get_all_by_owner("alice").await.unwrap().len(), 1);
    assert_eq!(repo.get_all_by_owner("bob").await.unwrap().len(), 2);
    assert!(repo.get_by_short(&alice[0]).await.unwrap().unwrap().is_deleted);

    pipeline.shutdown().await;
}

#[tokio::test]
async fn test_large_burst_is_fully_applied_on_shutdown() {
    let repo = Arc::new(MemoryRepository::new());
    let shorts = seed(repo.as_ref(), "u1", 250).await;

    let pipeline = DeletionPipeline::start(
        repo.clone(),
        &DeletionConfig {
            queue_capacity: 8,
            max_batch_size: 32,
            flush_interval_ms: 60_000,
        },
    );

    // 队列容量远小于任务数，enqueue 会等待
    for short in shorts {
        pipeline.enqueue(DeleteTask::new("u1", short)).await.unwrap();
    }

    tokio::time::timeout(Duration::from_secs(5), pipeline.shutdown())
        .await
        .unwrap();
    assert!(repo.get_all_by_owner("u1").await.unwrap().is_empty());
}
