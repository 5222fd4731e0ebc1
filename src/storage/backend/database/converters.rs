use sea_orm::ActiveValue::Set;

use crate::storage::UrlPair;
use migration::entities::url_pair;

pub fn model_to_pair(model: url_pair::Model) -> UrlPair {
    UrlPair {
        id: model.uid,
        short: model.short,
        long: model.long,
        user_id: model.user_id,
        is_deleted: model.is_deleted,
    }
}

pub fn pair_to_active_model(pair: &UrlPair) -> url_pair::ActiveModel {
    url_pair::ActiveModel {
        short: Set(pair.short.clone()),
        uid: Set(pair.id.clone()),
        long: Set(pair.long.clone()),
        user_id: Set(pair.user_id.clone()),
        is_deleted: Set(pair.is_deleted),
    }
}
