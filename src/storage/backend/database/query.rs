//! 只读查询

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use super::SeaOrmRepository;
use super::converters::model_to_pair;
use super::retry;
use crate::errors::{Result, TinylinkError};
use crate::storage::UrlPair;

use migration::entities::url_pair;

impl SeaOrmRepository {
    pub(super) async fn find_by_short(&self, short: &str) -> Result<Option<UrlPair>> {
        let db = &self.db;
        let short_owned = short.to_string();

        let model = retry::with_retry(&format!("get({})", short), self.retry_config, || async {
            url_pair::Entity::find_by_id(short_owned.clone()).one(db).await
        })
        .await
        .map_err(|e| TinylinkError::storage_operation(format!("查询短链接失败: {}", e)))?;

        Ok(model.map(model_to_pair))
    }

    pub(super) async fn find_live_by_owner(&self, user_id: &str) -> Result<Vec<UrlPair>> {
        let db = &self.db;
        let user_owned = user_id.to_string();

        let models = retry::with_retry("get_all_by_owner", self.retry_config, || async {
            url_pair::Entity::find()
                .filter(url_pair::Column::UserId.eq(user_owned.clone()))
                .filter(url_pair::Column::IsDeleted.eq(false))
                .all(db)
                .await
        })
        .await
        .map_err(|e| TinylinkError::storage_operation(format!("查询用户短链接失败: {}", e)))?;

        Ok(models.into_iter().map(model_to_pair).collect())
    }
}
