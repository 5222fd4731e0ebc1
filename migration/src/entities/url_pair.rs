use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "url_pairs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub short: String,
    #[sea_orm(unique)]
    pub uid: String,
    #[sea_orm(column_type = "Text")]
    pub long: String,
    pub user_id: String,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
