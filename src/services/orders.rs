use crate::{
    entities::{
        order, order_detail, Customer, Order, OrderDetail, OrderDetailModel, OrderModel, Product,
    },
    errors::ServiceError,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::validate_money;

/// Order service for placing and removing orders
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Place an order. Each line's unit price is the product's price at this
    /// moment and the order total is the sum of quantity times unit price.
    #[instrument(skip(self))]
    pub async fn create_order(
        &self,
        input: CreateOrderInput,
    ) -> Result<OrderWithDetails, ServiceError> {
        input.validate()?;
        for line in &input.lines {
            line.validate()?;
        }

        let txn = self.db.begin().await?;

        Customer::find_by_id(input.customer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", input.customer_id))?;

        let mut priced_lines = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let product = Product::find_by_id(line.product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::not_found("Product", line.product_id))?;
            priced_lines.push((line.product_id, line.quantity, product.price));
        }

        let total_amount = order_total(&priced_lines)
            .filter(|total| validate_money(total).is_ok())
            .ok_or_else(|| {
                ServiceError::ValidationError(
                    "order total does not fit the total_amount column".to_string(),
                )
            })?;

        let order_id = Uuid::new_v4();
        let order = order::ActiveModel {
            id: Set(order_id),
            customer_id: Set(input.customer_id),
            order_date: Set(input.order_date),
            total_amount: Set(total_amount),
        }
        .insert(&txn)
        .await?;

        let mut details = Vec::with_capacity(priced_lines.len());
        for (product_id, quantity, unit_price) in priced_lines {
            let detail = order_detail::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(product_id),
                quantity: Set(quantity),
                unit_price: Set(unit_price),
            }
            .insert(&txn)
            .await?;
            details.push(detail);
        }

        txn.commit().await?;

        info!(
            "Created order {} for customer {} ({} lines, total {})",
            order_id,
            input.customer_id,
            details.len(),
            total_amount
        );
        Ok(OrderWithDetails { order, details })
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderModel, ServiceError> {
        Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))
    }

    pub async fn order_details(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<OrderDetailModel>, ServiceError> {
        Ok(OrderDetail::find()
            .filter(order_detail::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?)
    }

    /// Delete an order and its lines
    #[instrument(skip(self))]
    pub async fn delete_order(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let order = Order::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))?;

        let lines = OrderDetail::delete_many()
            .filter(order_detail::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await?;
        order.delete(&txn).await?;

        txn.commit().await?;

        info!("Deleted order {} ({} lines)", order_id, lines.rows_affected);
        Ok(())
    }
}

/// Sum of quantity times unit price, `None` on overflow.
fn order_total(lines: &[(Uuid, i32, Decimal)]) -> Option<Decimal> {
    lines
        .iter()
        .try_fold(Decimal::ZERO, |total, (_, quantity, unit_price)| {
            unit_price
                .checked_mul(Decimal::from(*quantity))
                .and_then(|line| total.checked_add(line))
        })
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderLineInput {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderInput {
    pub customer_id: Uuid,
    pub order_date: NaiveDate,
    #[validate(length(min = 1))]
    pub lines: Vec<OrderLineInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithDetails {
    pub order: OrderModel,
    pub details: Vec<OrderDetailModel>,
}
