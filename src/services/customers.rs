use crate::{
    entities::{customer, order, order_detail, Customer, CustomerModel, Order, OrderDetail, OrderModel},
    errors::ServiceError,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Customer service for managing customer records
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new customer
    #[instrument(skip(self, input))]
    pub async fn create_customer(
        &self,
        input: CreateCustomerInput,
    ) -> Result<CustomerModel, ServiceError> {
        input.validate()?;

        let customer = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            email: Set(input.email),
            address: Set(input.address),
            phone: Set(input.phone),
        }
        .insert(&*self.db)
        .await?;

        info!("Created customer: {}", customer.id);
        Ok(customer)
    }

    pub async fn get_customer(&self, customer_id: Uuid) -> Result<CustomerModel, ServiceError> {
        Customer::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", customer_id))
    }

    pub async fn list_customers(&self) -> Result<Vec<CustomerModel>, ServiceError> {
        Ok(Customer::find()
            .order_by_asc(customer::Column::Name)
            .all(&*self.db)
            .await?)
    }

    /// Orders placed by a customer, oldest first
    pub async fn orders_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<OrderModel>, ServiceError> {
        let customer = self.get_customer(customer_id).await?;
        Ok(customer
            .find_related(Order)
            .order_by_asc(order::Column::OrderDate)
            .all(&*self.db)
            .await?)
    }

    /// Delete a customer together with their orders and those orders' lines
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, customer_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let customer = Customer::find_by_id(customer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", customer_id))?;

        let order_ids: Vec<Uuid> = Order::find()
            .select_only()
            .column(order::Column::Id)
            .filter(order::Column::CustomerId.eq(customer_id))
            .into_tuple()
            .all(&txn)
            .await?;

        let order_count = order_ids.len();
        if order_count > 0 {
            OrderDetail::delete_many()
                .filter(order_detail::Column::OrderId.is_in(order_ids.clone()))
                .exec(&txn)
                .await?;
            Order::delete_many()
                .filter(order::Column::Id.is_in(order_ids))
                .exec(&txn)
                .await?;
        }
        customer.delete(&txn).await?;

        txn.commit().await?;

        info!("Deleted customer {} ({} orders)", customer_id, order_count);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCustomerInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(max = 255))]
    pub address: String,
    #[validate(length(max = 20))]
    pub phone: String,
}
