use sea_orm_migration::prelude::*;

use super::m20240301_000002_create_products_table::Products;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240301_000005_create_product_photos_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // An empty image name means no object has been stored for the photo.
        manager
            .create_table(
                Table::create()
                    .table(ProductPhotos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductPhotos::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProductPhotos::ProductId).uuid().not_null())
                    .col(
                        ColumnDef::new(ProductPhotos::Image)
                            .string_len(255)
                            .not_null()
                            .default(""),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_photos_product_id")
                            .from(ProductPhotos::Table, ProductPhotos::ProductId)
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
                    .name("idx_product_photos_product_id")
                    .table(ProductPhotos::Table)
                    .col(ProductPhotos::ProductId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductPhotos::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ProductPhotos {
    Table,
    Id,
    ProductId,
    Image,
}
