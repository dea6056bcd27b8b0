mod common;

use assert_matches::assert_matches;
use common::TestApp;
use resale_catalog::{
    entities::{AuthenticationStatus, InventoryStatus},
    services::{
        inventory::{ReceiveItemInput, RelistInput},
        orders::{OrderLineInput, PlaceOrderInput},
        products::RecordAuthenticationInput,
    },
    ServiceError,
};
use rust_decimal_macros::dec;

fn relist(sku: &str) -> RelistInput {
    RelistInput {
        sku: sku.into(),
        current_condition_id: None,
        listing_price: None,
        location: None,
    }
}

#[tokio::test]
async fn item_walks_the_lifecycle() {
    let app = TestApp::new().await;
    let fx = app.seed().await;
    let product = app.add_product(&fx, "Speedy 30", None, dec!(350.00)).await;
    let inventory = &app.services.inventory;

    let item = inventory
        .receive_item(ReceiveItemInput {
            product_id: product.id,
            sku: "SKU-SPEEDY".into(),
            date_received: None,
            current_condition_id: None,
            listing_price: None,
            location: Some("Back room".into()),
        })
        .await
        .unwrap();
    assert_eq!(item.status, InventoryStatus::Processing);
    assert_eq!(item.current_condition_id, product.initial_condition_id);
    assert!(item.date_listed.is_none());

    // Reserving needs the item on sale first
    assert_matches!(
        inventory.reserve_item(item.id).await,
        Err(ServiceError::InvalidStatus(_))
    );

    let listed = inventory.list_item(item.id, dec!(590.00)).await.unwrap();
    assert_eq!(listed.status, InventoryStatus::InStock);
    assert!(listed.date_listed.is_some());
    assert_eq!(listed.listing_price.map(|p| p.round_dp(2)), Some(dec!(590.00)));
    assert!(listed.last_status_update >= item.last_status_update);

    let reserved = inventory.reserve_item(item.id).await.unwrap();
    assert_eq!(reserved.status, InventoryStatus::Reserved);
    let released = inventory.release_reservation(item.id).await.unwrap();
    assert_eq!(released.status, InventoryStatus::InStock);
    assert_matches!(
        inventory.release_reservation(item.id).await,
        Err(ServiceError::InvalidStatus(_))
    );

    let repriced = inventory.update_listing_price(item.id, dec!(549.00)).await.unwrap();
    assert_eq!(repriced.listing_price.map(|p| p.round_dp(2)), Some(dec!(549.00)));
    let regraded = inventory
        .update_condition(item.id, fx.condition("Good").id)
        .await
        .unwrap();
    assert_eq!(regraded.current_condition_id, fx.condition("Good").id);

    let withdrawn = inventory.withdraw_item(item.id).await.unwrap();
    assert_eq!(withdrawn.status, InventoryStatus::Withdrawn);

    // Terminal items are frozen
    assert_matches!(
        inventory.transition(item.id, InventoryStatus::InStock).await,
        Err(ServiceError::InvalidStatus(_))
    );
    assert_matches!(
        inventory.update_listing_price(item.id, dec!(1.00)).await,
        Err(ServiceError::InvalidStatus(_))
    );
    assert_matches!(
        inventory.list_item(item.id, dec!(1.00)).await,
        Err(ServiceError::InvalidStatus(_))
    );
}

#[tokio::test]
async fn relisting_requires_every_earlier_unit_closed() {
    let app = TestApp::new().await;
    let fx = app.seed().await;
    let product = app.add_product(&fx, "Alma BB", None, dec!(420.00)).await;
    let first = app.add_listed_item(&product, "SKU-ALMA-1", dec!(700.00)).await;
    let inventory = &app.services.inventory;

    assert_matches!(
        inventory.relist_product(product.id, relist("SKU-ALMA-2")).await,
        Err(ServiceError::InvalidOperation(_))
    );

    inventory.withdraw_item(first.id).await.unwrap();
    let second = inventory
        .relist_product(product.id, relist("SKU-ALMA-2"))
        .await
        .unwrap();
    assert_eq!(second.status, InventoryStatus::Processing);

    let units = inventory.items_for_product(product.id).await.unwrap();
    assert_eq!(units.len(), 2);
    let processing = inventory
        .items_by_status(InventoryStatus::Processing)
        .await
        .unwrap();
    assert_eq!(processing.len(), 1);
    assert_eq!(processing[0].sku, "SKU-ALMA-2");
}

#[tokio::test]
async fn selling_and_returning_only_happen_through_orders() {
    let app = TestApp::new().await;
    let fx = app.seed().await;
    let buyer = app.add_customer("Iris", "Hale", "iris@example.com").await;
    let product = app.add_product(&fx, "Constance 24", Some("CN-24"), dec!(5200.00)).await;
    let item = app.add_listed_item(&product, "SKU-CONST", dec!(8400.00)).await;
    let inventory = &app.services.inventory;

    assert_matches!(
        inventory.transition(item.id, InventoryStatus::Sold).await,
        Err(ServiceError::InvalidOperation(_))
    );
    assert_eq!(
        inventory.get_item(item.id).await.unwrap().status,
        InventoryStatus::InStock
    );

    let order = app
        .services
        .orders
        .place_order(PlaceOrderInput {
            customer_id: buyer.id,
            shipping_address: None,
            billing_address: None,
            shipping_cost: dec!(0),
            lines: vec![OrderLineInput {
                inventory_item_id: item.id,
                selling_price: dec!(8400.00),
                discount_amount: dec!(0),
            }],
        })
        .await
        .unwrap();

    // The open order keeps the unit Sold, so the product cannot be put up again
    assert_matches!(
        inventory.transition(item.id, InventoryStatus::Returned).await,
        Err(ServiceError::InvalidOperation(_))
    );
    assert_matches!(
        inventory.relist_product(product.id, relist("SKU-CONST-2")).await,
        Err(ServiceError::InvalidOperation(_))
    );

    app.services.orders.cancel_order(order.id).await.unwrap();
    assert_eq!(
        inventory.get_item(item.id).await.unwrap().status,
        InventoryStatus::Returned
    );
    let relisted = inventory
        .relist_product(product.id, relist("SKU-CONST-2"))
        .await
        .unwrap();
    assert_eq!(relisted.status, InventoryStatus::Processing);
}

#[tokio::test]
async fn negative_prices_and_unknown_conditions_are_rejected() {
    let app = TestApp::new().await;
    let fx = app.seed().await;
    let product = app.add_product(&fx, "Pochette", None, dec!(150.00)).await;
    let item = app.add_listed_item(&product, "SKU-POCH", dec!(260.00)).await;
    let inventory = &app.services.inventory;

    assert_matches!(
        inventory.update_listing_price(item.id, dec!(-5.00)).await,
        Err(ServiceError::ValidationError(_))
    );
    assert_matches!(
        inventory.update_condition(item.id, 77_777).await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        inventory.get_item(55_555).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn authentication_history_is_append_only() {
    let app = TestApp::new().await;
    let fx = app.seed().await;
    let product = app.add_product(&fx, "Neverfull MM", Some("AR-1234"), dec!(600.00)).await;
    let products = &app.services.products;

    assert!(products.latest_authentication(product.id).await.unwrap().is_none());

    for (day, status) in [
        (3, AuthenticationStatus::Pending),
        (10, AuthenticationStatus::UnableToVerify),
        (20, AuthenticationStatus::Authenticated),
    ] {
        products
            .record_authentication(
                product.id,
                RecordAuthenticationInput {
                    authentication_date: Some(common::date(2024, 3, day)),
                    authenticator: "Entrupy".into(),
                    status,
                    cost: Some(dec!(25.00)),
                    notes: None,
                },
            )
            .await
            .unwrap();
    }

    let history = products.authentication_history(product.id).await.unwrap();
    let statuses: Vec<_> = history.iter().map(|h| h.status).collect();
    assert_eq!(
        statuses,
        vec![
            AuthenticationStatus::Pending,
            AuthenticationStatus::UnableToVerify,
            AuthenticationStatus::Authenticated,
        ]
    );
    let latest = products.latest_authentication(product.id).await.unwrap().unwrap();
    assert_eq!(latest.status, AuthenticationStatus::Authenticated);

    let missing = products
        .record_authentication(
            4_242,
            RecordAuthenticationInput {
                authentication_date: None,
                authenticator: "Entrupy".into(),
                status: AuthenticationStatus::Pending,
                cost: None,
                notes: None,
            },
        )
        .await;
    assert_matches!(missing, Err(ServiceError::NotFound(_)));

    let by_brand = products.products_by_brand(fx.brand.id).await.unwrap();
    assert_eq!(by_brand.len(), 1);
    let by_supplier = products.products_by_supplier(fx.supplier.id).await.unwrap();
    assert_eq!(by_supplier.len(), 1);
    assert!(products.products_by_category(fx.bags.id).await.unwrap().is_empty());
}
