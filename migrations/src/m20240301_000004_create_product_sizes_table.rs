use sea_orm_migration::prelude::*;

use super::m20240301_000002_create_products_table::Products;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240301_000004_create_product_sizes_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProductSizes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductSizes::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProductSizes::ProductId).uuid().not_null())
                    .col(ColumnDef::new(ProductSizes::Size).string_len(50).not_null())
                    .col(ColumnDef::new(ProductSizes::Quantity).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_sizes_product_id")
                            .from(ProductSizes::Table, ProductSizes::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_product_sizes_product_id")
                    .table(ProductSizes::Table)
                    .col(ProductSizes::ProductId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductSizes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ProductSizes {
    Table,
    Id,
    ProductId,
    Size,
    Quantity,
}
