mod common;

use assert_matches::assert_matches;
use common::TestApp;
use resale_catalog::{
    entities::OrderStatus,
    services::{
        customers::RegisterCustomerInput,
        orders::{OrderLineInput, PlaceOrderInput},
    },
    ServiceError,
};
use rust_decimal_macros::dec;

fn registration(email: &str) -> RegisterCustomerInput {
    RegisterCustomerInput {
        first_name: "Mina".into(),
        last_name: "Park".into(),
        email: email.into(),
        phone: Some("+82 10 0000 0000".into()),
        registration_date: None,
    }
}

#[tokio::test]
async fn emails_are_normalized_and_unique() {
    let app = TestApp::new().await;
    let customers = &app.services.customers;

    let mina = customers
        .register_customer(registration("Mina.Park@Example.COM"))
        .await
        .unwrap();
    assert_eq!(mina.email, "mina.park@example.com");
    assert!(mina.last_login.is_none());

    let found = customers.find_by_email("MINA.PARK@example.com").await.unwrap();
    assert_eq!(found.map(|c| c.id), Some(mina.id));
    assert!(customers.find_by_email("nobody@example.com").await.unwrap().is_none());

    assert_matches!(
        customers.register_customer(registration("mina.park@example.com")).await,
        Err(ServiceError::Conflict(_))
    );
    assert_matches!(
        customers.register_customer(registration("not-an-email")).await,
        Err(ServiceError::ValidationError(_))
    );
}

#[tokio::test]
async fn logins_are_stamped() {
    let app = TestApp::new().await;
    let customers = &app.services.customers;
    let mina = app.add_customer("Mina", "Park", "mina@example.com").await;

    let logged_in = customers.record_login(mina.id).await.unwrap();
    assert!(logged_in.last_login.is_some());
    assert!(customers.get_customer(mina.id).await.unwrap().last_login.is_some());

    assert_matches!(customers.record_login(8_080).await, Err(ServiceError::NotFound(_)));
    assert_matches!(customers.get_customer(8_080).await, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn customers_with_orders_cannot_be_deleted() {
    let app = TestApp::new().await;
    let fx = app.seed().await;
    let buyer = app.add_customer("Lea", "Roth", "lea@example.com").await;
    let browser = app.add_customer("Max", "Vogel", "max@example.com").await;
    let product = app.add_product(&fx, "Kelly 28", Some("KL-28"), dec!(7000.00)).await;
    let item = app.add_listed_item(&product, "SKU-KELLY", dec!(11000.00)).await;

    let order = app
        .services
        .orders
        .place_order(PlaceOrderInput {
            customer_id: buyer.id,
            shipping_address: Some("Berlin".into()),
            billing_address: None,
            shipping_cost: dec!(0),
            lines: vec![OrderLineInput {
                inventory_item_id: item.id,
                selling_price: dec!(11000.00),
                discount_amount: dec!(0),
            }],
        })
        .await
        .unwrap();
    let fetched = app.services.orders.get_order(order.id).await.unwrap();
    assert_eq!(fetched.status, OrderStatus::PendingPayment);
    assert_eq!(fetched.customer_id, buyer.id);

    let customers = &app.services.customers;
    assert_matches!(
        customers.delete_customer(buyer.id).await,
        Err(ServiceError::Conflict(_))
    );
    customers.delete_customer(browser.id).await.unwrap();
    assert_matches!(
        customers.get_customer(browser.id).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn reference_data_lookups() {
    let app = TestApp::new().await;
    let fx = app.seed().await;
    let catalog = &app.services.catalog;

    let supplier = catalog.get_supplier(fx.supplier.id).await.unwrap();
    assert_eq!(supplier.name, "Maison Consign");
    assert_matches!(catalog.get_supplier(404).await, Err(ServiceError::NotFound(_)));

    let brand = catalog.find_brand_by_name("Hermès").await.unwrap();
    assert_eq!(brand.map(|b| b.id), Some(fx.brand.id));
    assert!(catalog.find_brand_by_name("Celine").await.unwrap().is_none());
}
