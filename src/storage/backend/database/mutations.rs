//! 写操作

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DbErr, EntityTrait, QueryFilter, SqlErr, TransactionTrait, sea_query::Expr,
};
use tracing::{debug, info};

use super::SeaOrmRepository;
use super::converters::pair_to_active_model;
use super::retry;
use crate::errors::{Result, TinylinkError};
use crate::storage::{UrlPair, UrlRepository};

use migration::entities::url_pair;

/// 唯一约束冲突转为 Conflict，其余归为存储失败
fn map_write_error(err: DbErr, context: &str) -> TinylinkError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        return TinylinkError::conflict(format!("{}: {}", context, detail));
    }
    TinylinkError::storage_operation(format!("{}: {}", context, err))
}

#[async_trait]
impl UrlRepository for SeaOrmRepository {
    async fn save(&self, pair: UrlPair) -> Result<()> {
        let db = &self.db;

        retry::with_retry(&format!("save({})", pair.short), self.retry_config, || async {
            url_pair::Entity::insert(pair_to_active_model(&pair))
                .exec(db)
                .await
        })
        .await
        .map_err(|e| map_write_error(e, "保存短链接失败"))?;

        debug!("Url pair saved: {}", pair.short);
        Ok(())
    }

    async fn get_by_short(&self, short: &str) -> Result<Option<UrlPair>> {
        self.find_by_short(short).await
    }

    async fn save_many(&self, pairs: Vec<UrlPair>) -> Result<()> {
        if pairs.is_empty() {
            return Ok(());
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| TinylinkError::storage_operation(format!("开始事务失败: {}", e)))?;

        let active_models: Vec<url_pair::ActiveModel> =
            pairs.iter().map(pair_to_active_model).collect();

        // 出错时 txn 被 drop，自动回滚
        url_pair::Entity::insert_many(active_models)
            .exec(&txn)
            .await
            .map_err(|e| map_write_error(e, "批量插入失败"))?;

        txn.commit()
            .await
            .map_err(|e| TinylinkError::storage_operation(format!("提交事务失败: {}", e)))?;

        info!("Batch inserted {} url pairs", pairs.len());
        Ok(())
    }

    async fn get_all_by_owner(&self, user_id: &str) -> Result<Vec<UrlPair>> {
        self.find_live_by_owner(user_id).await
    }

    async fn delete_by_shorts(&self, user_id: &str, shorts: &[String]) -> Result<u64> {
        if shorts.is_empty() {
            return Ok(0);
        }

        let db = &self.db;
        let result = retry::with_retry("delete_by_shorts", self.retry_config, || async {
            url_pair::Entity::update_many()
                .col_expr(url_pair::Column::IsDeleted, Expr::value(true))
                .filter(url_pair::Column::UserId.eq(user_id))
                .filter(url_pair::Column::Short.is_in(shorts.iter().cloned()))
                .filter(url_pair::Column::IsDeleted.eq(false))
                .exec(db)
                .await
        })
        .await
        .map_err(|e| TinylinkError::storage_operation(format!("批量删除失败: {}", e)))?;

        debug!(
            "Soft-deleted {} of {} requested pairs for user {}",
            result.rows_affected,
            shorts.len(),
            user_id
        );
        Ok(result.rows_affected)
    }

    fn backend_name(&self) -> &'static str {
        self.backend_name
    }
}
