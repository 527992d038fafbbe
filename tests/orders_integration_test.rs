mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use common::TestShop;
use rene_shop::{
    entities::{Order, OrderDetail, Product, ProductSize},
    errors::ServiceError,
    services::{
        catalog::{AddSizeInput, UpdateProductInput},
        orders::{CreateOrderInput, OrderLineInput},
    },
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

#[tokio::test]
async fn order_total_is_sum_of_lines() {
    let shop = TestShop::new().await;
    let boot = shop.product("Chelsea Boot", dec!(129.99)).await;
    let laces = shop.product("Laces", dec!(4.50)).await;
    let customer = shop.customer("Ada Byron").await;

    let placed = shop
        .order(customer.id, &[(boot.id, 2), (laces.id, 3)])
        .await;

    assert_eq!(placed.order.total_amount, dec!(273.48));
    assert_eq!(placed.details.len(), 2);
    let line_sum: Decimal = placed.details.iter().map(|d| d.line_total()).sum();
    assert_eq!(line_sum, placed.order.total_amount);

    let stored = shop.orders.get_order(placed.order.id).await.unwrap();
    assert_eq!(stored.total_amount, dec!(273.48));
    assert_eq!(stored.label(&customer), format!("Order {} by Ada Byron", stored.id));

    let details = shop.orders.order_details(placed.order.id).await.unwrap();
    let boot_line = details.iter().find(|d| d.product_id == boot.id).unwrap();
    assert_eq!(boot_line.unit_price, dec!(129.99));
    assert_eq!(
        boot_line.label(&boot),
        format!("Order {} - Chelsea Boot", placed.order.id)
    );
}

#[tokio::test]
async fn unit_price_is_a_snapshot() {
    let shop = TestShop::new().await;
    let boot = shop.product("Chelsea Boot", dec!(129.99)).await;
    let customer = shop.customer("Ada Byron").await;
    let placed = shop.order(customer.id, &[(boot.id, 1)]).await;

    shop.catalog
        .update_product(
            boot.id,
            UpdateProductInput {
                price: Some(dec!(149.99)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let details = shop.orders.order_details(placed.order.id).await.unwrap();
    assert_eq!(details[0].unit_price, dec!(129.99));
    let order = shop.orders.get_order(placed.order.id).await.unwrap();
    assert_eq!(order.total_amount, dec!(129.99));
}

#[tokio::test]
async fn order_for_unknown_customer_or_product_is_rejected() {
    let shop = TestShop::new().await;
    let boot = shop.product("Chelsea Boot", dec!(129.99)).await;
    let customer = shop.customer("Ada Byron").await;
    let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

    let no_customer = shop
        .orders
        .create_order(CreateOrderInput {
            customer_id: Uuid::new_v4(),
            order_date: date,
            lines: vec![OrderLineInput {
                product_id: boot.id,
                quantity: 1,
            }],
        })
        .await;
    assert_matches!(no_customer, Err(ServiceError::NotFound(_)));

    let no_product = shop
        .orders
        .create_order(CreateOrderInput {
            customer_id: customer.id,
            order_date: date,
            lines: vec![
                OrderLineInput {
                    product_id: boot.id,
                    quantity: 1,
                },
                OrderLineInput {
                    product_id: Uuid::new_v4(),
                    quantity: 1,
                },
            ],
        })
        .await;
    assert_matches!(no_product, Err(ServiceError::NotFound(_)));

    let zero_quantity = shop
        .orders
        .create_order(CreateOrderInput {
            customer_id: customer.id,
            order_date: date,
            lines: vec![OrderLineInput {
                product_id: boot.id,
                quantity: 0,
            }],
        })
        .await;
    assert_matches!(zero_quantity, Err(ServiceError::ValidationError(_)));

    let db = shop.db.as_ref();
    assert_eq!(Order::find().count(db).await.unwrap(), 0);
    assert_eq!(OrderDetail::find().count(db).await.unwrap(), 0);
}

#[tokio::test]
async fn deleting_order_removes_its_lines() {
    let shop = TestShop::new().await;
    let boot = shop.product("Chelsea Boot", dec!(129.99)).await;
    let customer = shop.customer("Ada Byron").await;
    let first = shop.order(customer.id, &[(boot.id, 1)]).await;
    let second = shop.order(customer.id, &[(boot.id, 2)]).await;

    shop.orders.delete_order(first.order.id).await.unwrap();

    assert_matches!(
        shop.orders.get_order(first.order.id).await,
        Err(ServiceError::NotFound(_))
    );
    let remaining = OrderDetail::find().all(shop.db.as_ref()).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].order_id, second.order.id);
    assert!(shop.catalog.get_product(boot.id).await.is_ok());
}

#[tokio::test]
async fn deleting_customer_removes_orders() {
    let shop = TestShop::new().await;
    let boot = shop.product("Chelsea Boot", dec!(129.99)).await;
    let ada = shop.customer("Ada Byron").await;
    let grace = shop.customer("Grace Hopper").await;
    shop.order(ada.id, &[(boot.id, 1)]).await;
    shop.order(ada.id, &[(boot.id, 3)]).await;
    let kept = shop.order(grace.id, &[(boot.id, 2)]).await;

    assert_eq!(shop.customers.orders_for_customer(ada.id).await.unwrap().len(), 2);

    shop.customers.delete_customer(ada.id).await.unwrap();

    let db = shop.db.as_ref();
    let orders = Order::find().all(db).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, kept.order.id);
    assert_eq!(OrderDetail::find().count(db).await.unwrap(), 1);

    let names: Vec<_> = shop
        .customers
        .list_customers()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Grace Hopper"]);
    assert_matches!(
        shop.customers.orders_for_customer(ada.id).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn schema_cascades_product_delete() {
    let shop = TestShop::new().await;
    let boot = shop.product("Chelsea Boot", dec!(129.99)).await;
    shop.catalog
        .add_size(
            boot.id,
            AddSizeInput {
                size: "42".to_string(),
                quantity: 3,
            },
        )
        .await
        .unwrap();
    let customer = shop.customer("Ada Byron").await;
    shop.order(customer.id, &[(boot.id, 1)]).await;

    // bypass the service and delete the row directly
    let db = shop.db.as_ref();
    Product::delete_by_id(boot.id).exec(db).await.unwrap();

    assert_eq!(ProductSize::find().count(db).await.unwrap(), 0);
    assert_eq!(OrderDetail::find().count(db).await.unwrap(), 0);
    assert_eq!(Order::find().count(db).await.unwrap(), 1);
}

#[tokio::test]
async fn deleting_customer_without_orders() {
    let shop = TestShop::new().await;
    let customer = shop.customer("Ada Byron").await;

    shop.customers.delete_customer(customer.id).await.unwrap();

    assert!(shop.customers.list_customers().await.unwrap().is_empty());
    assert_matches!(
        shop.customers.delete_customer(customer.id).await,
        Err(ServiceError::NotFound(_))
    );
}
