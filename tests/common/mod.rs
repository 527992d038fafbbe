#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use rene_shop::{
    config::StorageConfig,
    currency::StaticRateProvider,
    db::{self, DbConfig},
    entities::{CategoryModel, CustomerModel, ProductModel},
    services::{
        catalog::{CreateCategoryInput, CreateProductInput},
        customers::CreateCustomerInput,
        orders::{CreateOrderInput, OrderLineInput, OrderWithDetails},
        CatalogService, CustomerService, OrderService,
    },
    storage::MediaStorage,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

/// Services wired to a fresh, migrated in-memory SQLite database.
pub struct TestShop {
    pub db: Arc<DatabaseConnection>,
    pub catalog: CatalogService,
    pub customers: CustomerService,
    pub orders: OrderService,
}

impl TestShop {
    pub async fn new() -> Self {
        let pool = db::establish_connection_with_config(&DbConfig::single_connection(
            "sqlite::memory:",
        ))
        .await
        .expect("failed to open test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to migrate test database");

        let db = Arc::new(pool);
        let storage =
            MediaStorage::from_config(&StorageConfig::default()).expect("default storage config");
        let rates = StaticRateProvider::new()
            .with_rate("USD", "EUR", dec!(0.92))
            .with_rate("USD", "JPY", dec!(151.37));

        Self {
            catalog: CatalogService::new(db.clone(), storage, Arc::new(rates), "USD"),
            customers: CustomerService::new(db.clone()),
            orders: OrderService::new(db.clone()),
            db,
        }
    }

    pub async fn category(&self, name: &str) -> CategoryModel {
        self.catalog
            .create_category(CreateCategoryInput {
                name: name.to_string(),
                description: format!("All things {}", name.to_lowercase()),
            })
            .await
            .expect("create category")
    }

    pub async fn product(&self, name: &str, price: Decimal) -> ProductModel {
        self.catalog
            .create_product(CreateProductInput {
                name: name.to_string(),
                description: format!("{} description", name),
                price,
                updated_price: None,
                is_3d: false,
                category_ids: vec![],
            })
            .await
            .expect("create product")
    }

    pub async fn customer(&self, name: &str) -> CustomerModel {
        self.customers
            .create_customer(CreateCustomerInput {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
                address: "1 Market Street".to_string(),
                phone: "555-0100".to_string(),
            })
            .await
            .expect("create customer")
    }

    pub async fn order(&self, customer_id: Uuid, lines: &[(Uuid, i32)]) -> OrderWithDetails {
        self.orders
            .create_order(CreateOrderInput {
                customer_id,
                order_date: NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date"),
                lines: lines
                    .iter()
                    .map(|(product_id, quantity)| OrderLineInput {
                        product_id: *product_id,
                        quantity: *quantity,
                    })
                    .collect(),
            })
            .await
            .expect("create order")
    }
}
