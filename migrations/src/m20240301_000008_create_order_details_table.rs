use sea_orm_migration::prelude::*;

use super::m20240301_000002_create_products_table::Products;
use super::m20240301_000007_create_orders_table::Orders;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240301_000008_create_order_details_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrderDetails::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderDetails::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderDetails::OrderId).uuid().not_null())
                    .col(ColumnDef::new(OrderDetails::ProductId).uuid().not_null())
                    .col(ColumnDef::new(OrderDetails::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(OrderDetails::UnitPrice)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_details_order_id")
                            .from(OrderDetails::Table, OrderDetails::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_details_product_id")
                            .from(OrderDetails::Table, OrderDetails::ProductId)
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
                    .name("idx_order_details_order_id")
                    .table(OrderDetails::Table)
                    .col(OrderDetails::OrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_details_product_id")
                    .table(OrderDetails::Table)
                    .col(OrderDetails::ProductId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderDetails::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum OrderDetails {
    Table,
    Id,
    OrderId,
    ProductId,
    Quantity,
    UnitPrice,
}
