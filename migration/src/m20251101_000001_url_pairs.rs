use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 url_pairs 表，short 为主键，uid 唯一
        manager
            .create_table(
                Table::create()
                    .table(UrlPair::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UrlPair::Short)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UrlPair::Uid)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(UrlPair::Long).text().not_null())
                    .col(
                        ColumnDef::new(UrlPair::UserId)
                            .string_len(128)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(UrlPair::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        // 软删除按 (user_id, short) 过滤
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_url_pairs_user_short")
                    .table(UrlPair::Table)
                    .col(UrlPair::UserId)
                    .col(UrlPair::Short)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_url_pairs_user_short")
                    .table(UrlPair::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(UrlPair::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UrlPair {
    #[sea_orm(iden = "url_pairs")]
    Table,
    Short,
    Uid,
    Long,
    UserId,
    IsDeleted,
}
