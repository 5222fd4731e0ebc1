use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::StorageConfig;
use crate::errors::Result;

pub mod backend;
pub mod models;

pub use backend::{FileRepository, MemoryRepository, SeaOrmRepository};
pub use models::UrlPair;

/// 短链接持久化接口
///
/// 三个后端可互换：内存、JSON 文件、关系型数据库。
/// 所有后端都保证 short 唯一：重复 short 的 save 返回 Conflict。
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// 插入单条记录，short 已存在时返回 `TinylinkError::Conflict`
    async fn save(&self, pair: UrlPair) -> Result<()>;

    /// 按 short 查询，调用方自行检查 is_deleted
    async fn get_by_short(&self, short: &str) -> Result<Option<UrlPair>>;

    /// 批量插入，全部成功或全部失败
    async fn save_many(&self, pairs: Vec<UrlPair>) -> Result<()>;

    /// 返回该用户所有未删除的记录，顺序不保证
    async fn get_all_by_owner(&self, user_id: &str) -> Result<Vec<UrlPair>>;

    /// 软删除该用户名下的指定 short，不匹配的忽略
    ///
    /// 返回实际被标记的记录数
    async fn delete_by_shorts(&self, user_id: &str, shorts: &[String]) -> Result<u64>;

    fn backend_name(&self) -> &'static str;
}

/// 存储后端类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Database(String),
    File(String),
    Memory,
}

impl StorageBackend {
    /// 按优先级选择：database_url > file_path > 内存
    pub fn from_config(config: &StorageConfig) -> Self {
        if let Some(url) = config.database_url.as_deref().filter(|u| !u.is_empty()) {
            StorageBackend::Database(url.to_string())
        } else if let Some(path) = config.file_path.as_deref().filter(|p| !p.is_empty()) {
            StorageBackend::File(path.to_string())
        } else {
            StorageBackend::Memory
        }
    }
}

pub struct StorageFactory;

impl StorageFactory {
    pub async fn create(config: &StorageConfig) -> Result<Arc<dyn UrlRepository>> {
        let repository: Arc<dyn UrlRepository> = match StorageBackend::from_config(config) {
            StorageBackend::Database(url) => {
                info!("Using the database for storage...");
                Arc::new(SeaOrmRepository::new(&url, config).await?)
            }
            StorageBackend::File(path) => {
                info!("Using the file system for storage: {}", path);
                Arc::new(FileRepository::open(&path)?)
            }
            StorageBackend::Memory => {
                info!("Using the in-memory repository...");
                Arc::new(MemoryRepository::new())
            }
        };

        Ok(repository)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_precedence() {
        let mut config = StorageConfig::default();
        assert_eq!(StorageBackend::from_config(&config), StorageBackend::Memory);

        config.file_path = Some("links.json".into());
        assert_eq!(
            StorageBackend::from_config(&config),
            StorageBackend::File("links.json".into())
        );

        config.database_url = Some("sqlite://links.db".into());
        assert_eq!(
            StorageBackend::from_config(&config),
            StorageBackend::Database("sqlite://links.db".into())
        );
    }

    #[test]
    fn test_empty_values_fall_through() {
        let config = StorageConfig {
            database_url: Some(String::new()),
            file_path: Some(String::new()),
            ..StorageConfig::default()
        };
        assert_eq!(StorageBackend::from_config(&config), StorageBackend::Memory);
    }
}
