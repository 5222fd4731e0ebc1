use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::audit::{
    AuditPublisher, AuditServiceBuilder, FileObserver, HttpObserver, NoopPublisher,
};
use crate::config::{AppConfig, AuditConfig};
use crate::deletion::DeletionPipeline;
use crate::errors::Result;
use crate::services::UrlService;
use crate::storage::{StorageFactory, UrlRepository};

/// 单个后台组件的关闭超时
const COMPONENT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// 启动后持有的全部组件
pub struct Runtime {
    pub repository: Arc<dyn UrlRepository>,
    pub publisher: Arc<dyn AuditPublisher>,
    pub deletion: Arc<DeletionPipeline>,
    pub url_service: Arc<UrlService>,
}

impl Runtime {
    /// 先停删除管道（取完队列并刷盘），再关闭审计总线
    pub async fn shutdown(&self) {
        match timeout(COMPONENT_SHUTDOWN_TIMEOUT, self.deletion.shutdown()).await {
            Ok(()) => info!("Deletion pipeline drained"),
            Err(_) => error!(
                "Deletion pipeline shutdown timed out after {:?}",
                COMPONENT_SHUTDOWN_TIMEOUT
            ),
        }

        match timeout(COMPONENT_SHUTDOWN_TIMEOUT, self.publisher.close()).await {
            Ok(()) => info!("Audit publisher closed"),
            Err(_) => error!(
                "Audit publisher close timed out after {:?}",
                COMPONENT_SHUTDOWN_TIMEOUT
            ),
        }
    }
}

/// 根据配置构建审计发布者，没有配置任何 sink 时返回 NoopPublisher
pub fn build_publisher(config: &AuditConfig) -> Result<Arc<dyn AuditPublisher>> {
    if !config.has_sinks() {
        debug!("No audit sinks configured, using NoopPublisher");
        return Ok(Arc::new(NoopPublisher::new()));
    }

    let mut builder = AuditServiceBuilder::new(config.queue_capacity);

    if let Some(path) = config.file.as_deref().filter(|p| !p.is_empty()) {
        builder = builder.register(Arc::new(FileObserver::open(path)?));
        info!("Audit events will be appended to {}", path);
    }

    if let Some(url) = config.url.as_deref().filter(|u| !u.is_empty()) {
        let observer = HttpObserver::new(url, Duration::from_secs(config.http_timeout_secs));
        builder = builder.register(Arc::new(observer));
        info!("Audit events will be posted to {}", url);
    }

    info!("Audit bus started with {} observers", builder.observer_count());
    Ok(Arc::new(builder.start()))
}

/// 组装运行时，必须在 tokio 运行时内调用
pub async fn prepare(config: &AppConfig) -> Result<Runtime> {
    let start_time = Instant::now();
    debug!("Starting pre-startup processing...");

    let repository = StorageFactory::create(&config.storage).await?;
    info!("Using storage backend: {}", repository.backend_name());

    let publisher = build_publisher(&config.audit)?;

    let deletion = Arc::new(DeletionPipeline::start(
        repository.clone(),
        &config.deletion,
    ));

    if config.server.base_url.is_empty() {
        warn!("server.base_url is empty, short URLs will be relative");
    }

    let url_service = Arc::new(UrlService::new(
        repository.clone(),
        publisher.clone(),
        deletion.clone(),
        config.server.base_url.clone(),
        &config.timeouts,
    ));

    info!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(Runtime {
        repository,
        publisher,
        deletion,
        url_service,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_prepare_with_defaults_uses_memory() {
        let runtime = prepare(&AppConfig::default()).await.unwrap();
        assert_eq!(runtime.repository.backend_name(), "memory");

        let result = runtime
            .url_service
            .shorten("https://example.com", "u1")
            .await
            .unwrap();
        assert!(result.short_url.starts_with("http://localhost:8080/"));

        runtime.shutdown().await;
        assert!(runtime.deletion.is_closed());
    }

    #[tokio::test]
    async fn test_prepare_with_file_audit_sink() {
        let dir = TempDir::new().unwrap();
        let audit_path = dir.path().join("audit.log");

        let mut config = AppConfig::default();
        config.audit.file = Some(audit_path.to_string_lossy().into_owned());

        let runtime = prepare(&config).await.unwrap();
        runtime
            .url_service
            .shorten("https://example.com", "u1")
            .await
            .unwrap();
        runtime.shutdown().await;

        let content = std::fs::read_to_string(&audit_path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains(r#""action":"shorten""#));
    }
}
