use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::MediaStorage;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_photos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Uuid")]
    pub product_id: Uuid,

    /// Object name inside the media bucket; empty when nothing was stored
    pub image: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn has_image(&self) -> bool {
        !self.image.trim().is_empty()
    }

    /// Public URL of the stored image, or `None` when the photo has no image.
    pub fn image_url(&self, storage: &MediaStorage) -> Option<String> {
        if self.has_image() {
            Some(storage.url(&self.image))
        } else {
            None
        }
    }

    pub fn label(&self, product: &super::product::Model) -> String {
        format!("Photo for {}", product.name)
    }
}
