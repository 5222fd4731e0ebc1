//! 内存存储后端
//!
//! 进程退出即丢失，主要用于开发和测试。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::errors::{Result, TinylinkError};
use crate::storage::{UrlPair, UrlRepository};

#[derive(Default)]
pub struct MemoryRepository {
    /// short -> UrlPair
    data: RwLock<HashMap<String, UrlPair>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

/// 检查一批记录与已有数据及批内是否有 short 冲突
fn check_batch_conflicts(
    existing: &HashMap<String, UrlPair>,
    pairs: &[UrlPair],
) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(pairs.len());
    for pair in pairs {
        if existing.contains_key(&pair.short) || !seen.insert(pair.short.as_str()) {
            return Err(TinylinkError::conflict(format!(
                "Short code '{}' already exists",
                pair.short
            )));
        }
    }
    Ok(())
}

/// 在 map 上执行软删除，返回被标记的数量
fn mark_deleted(
    data: &mut HashMap<String, UrlPair>,
    user_id: &str,
    shorts: &[String],
) -> u64 {
    let mut affected = 0;
    for short in shorts {
        if let Some(pair) = data.get_mut(short)
            && pair.user_id == user_id
            && !pair.is_deleted
        {
            pair.is_deleted = true;
            affected += 1;
        }
    }
    affected
}

#[async_trait]
impl UrlRepository for MemoryRepository {
    async fn save(&self, pair: UrlPair) -> Result<()> {
        let mut data = self.data.write();
        if data.contains_key(&pair.short) {
            return Err(TinylinkError::conflict(format!(
                "Short code '{}' already exists",
                pair.short
            )));
        }
        data.insert(pair.short.clone(), pair);
        Ok(())
    }

    async fn get_by_short(&self, short: &str) -> Result<Option<UrlPair>> {
        Ok(self.data.read().get(short).cloned())
    }

    async fn save_many(&self, pairs: Vec<UrlPair>) -> Result<()> {
        let mut data = self.data.write();
        check_batch_conflicts(&data, &pairs)?;

        let count = pairs.len();
        for pair in pairs {
            data.insert(pair.short.clone(), pair);
        }
        debug!("MemoryRepository: batch inserted {} pairs", count);
        Ok(())
    }

    async fn get_all_by_owner(&self, user_id: &str) -> Result<Vec<UrlPair>> {
        Ok(self
            .data
            .read()
            .values()
            .filter(|p| p.user_id == user_id && !p.is_deleted)
            .cloned()
            .collect())
    }

    async fn delete_by_shorts(&self, user_id: &str, shorts: &[String]) -> Result<u64> {
        let mut data = self.data.write();
        Ok(mark_deleted(&mut data, user_id, shorts))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_conflict_on_existing_short() {
        let repo = MemoryRepository::new();
        repo.save(UrlPair::new("abc", "https://a.io", "u1"))
            .await
            .unwrap();

        let err = repo
            .save(UrlPair::new("abc", "https://b.io", "u2"))
            .await
            .unwrap_err();
        assert!(matches!(err, TinylinkError::Conflict(_)));

        // 原记录未被覆盖
        let stored = repo.get_by_short("abc").await.unwrap().unwrap();
        assert_eq!(stored.long, "https://a.io");
    }

    #[tokio::test]
    async fn test_save_many_rejects_duplicates_within_batch() {
        let repo = MemoryRepository::new();
        let err = repo
            .save_many(vec![
                UrlPair::new("dup", "https://a.io", ""),
                UrlPair::new("dup", "https://b.io", ""),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, TinylinkError::Conflict(_)));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_owner_scoped() {
        let repo = MemoryRepository::new();
        repo.save(UrlPair::new("a1", "https://a.io", "alice"))
            .await
            .unwrap();

        let affected = repo
            .delete_by_shorts("mallory", &["a1".to_string()])
            .await
            .unwrap();
        assert_eq!(affected, 0);
        assert!(!repo.get_by_short("a1").await.unwrap().unwrap().is_deleted);

        let affected = repo
            .delete_by_shorts("alice", &["a1".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(affected, 1);

        // 再次删除是幂等的
        let affected = repo
            .delete_by_shorts("alice", &["a1".to_string()])
            .await
            .unwrap();
        assert_eq!(affected, 0);
        assert!(repo.get_all_by_owner("alice").await.unwrap().is_empty());
    }
}
