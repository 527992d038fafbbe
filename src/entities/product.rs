use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

use crate::currency::{same_currency, CurrencyRateProvider};
use crate::errors::ServiceError;

/// Product entity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Product name
    pub name: String,

    /// Product description
    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Price in the shop's base currency
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,

    /// Revised price in the base currency
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub updated_price: Decimal,

    /// Whether the product ships with a 3D model
    #[sea_orm(column_name = "is_3d")]
    pub is_3d: bool,
}

/// Product entity relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_size::Entity")]
    Sizes,

    #[sea_orm(has_many = "super::product_photo::Entity")]
    Photos,

    #[sea_orm(has_many = "super::product_category::Entity")]
    ProductCategories,

    #[sea_orm(has_many = "super::order_detail::Entity")]
    OrderDetails,
}

impl Related<super::product_size::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sizes.def()
    }
}

impl Related<super::product_photo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Photos.def()
    }
}

impl Related<super::product_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductCategories.def()
    }
}

impl Related<super::order_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderDetails.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_category::Relation::Category.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::product_category::Relation::Product.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Expresses the stored price in `to_currency`.
    ///
    /// Prices are stored in `base_currency`; asking for the base currency
    /// returns the stored price untouched and never consults `rates`. Any other
    /// currency is the stored price multiplied by the rate `rates` reports for
    /// `base_currency -> to_currency`, without rounding. Lookup failures are
    /// returned to the caller.
    pub async fn convert_price<P>(
        &self,
        base_currency: &str,
        to_currency: &str,
        rates: &P,
    ) -> Result<Decimal, ServiceError>
    where
        P: CurrencyRateProvider + ?Sized,
    {
        if same_currency(base_currency, to_currency) {
            return Ok(self.price);
        }

        let rate = rates.get_rate(base_currency, to_currency).await?;
        debug!(
            product_id = %self.id,
            from = base_currency,
            to = to_currency,
            %rate,
            "converting product price"
        );
        self.price.checked_mul(rate).ok_or_else(|| {
            ServiceError::ExternalServiceError(format!(
                "rate {} for {} -> {} overflows price {}",
                rate, base_currency, to_currency, self.price
            ))
        })
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
