//! Schema-level guarantees: foreign keys, uniqueness, check constraints and the view.

mod common;

use assert_matches::assert_matches;
use common::{date, TestApp};
use resale_catalog::{
    entities::{order_item, product, sales_order, supplier, OrderStatus, SupplierType},
    reports::ProductDetailsFilter,
    services::{
        catalog::CreateSupplierInput,
        inventory::ReceiveItemInput,
        orders::{OrderLineInput, PlaceOrderInput},
        products::IntakeProductInput,
    },
    ServiceError,
};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};

#[tokio::test]
async fn product_with_unknown_condition_is_rejected() {
    let app = TestApp::new().await;
    let fx = app.seed().await;

    let raw = product::ActiveModel {
        brand_id: Set(fx.brand.id),
        category_id: Set(fx.handbags.id),
        supplier_id: Set(fx.supplier.id),
        initial_condition_id: Set(9_999),
        name: Set("Kelly 28".into()),
        purchase_date: Set(date(2024, 1, 10)),
        purchase_price: Set(dec!(6500.00)),
        ..Default::default()
    }
    .insert(&*app.db)
    .await;
    assert!(raw.is_err(), "foreign key must reject unknown condition");

    let via_service = app
        .services
        .products
        .intake_product(IntakeProductInput {
            brand_id: fx.brand.id,
            category_id: fx.handbags.id,
            supplier_id: fx.supplier.id,
            initial_condition_id: 9_999,
            name: "Kelly 28".into(),
            material: None,
            color: None,
            size: None,
            serial_number: None,
            purchase_date: date(2024, 1, 10),
            purchase_price: dec!(6500.00),
            acquisition_notes: None,
        })
        .await;
    assert_matches!(via_service, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn supplier_email_must_look_like_an_address() {
    let app = TestApp::new().await;

    let raw = supplier::ActiveModel {
        name: Set("Vintage Finds".into()),
        supplier_type: Set(SupplierType::Business),
        contact_email: Set(Some("not-an-email".into())),
        registration_date: Set(date(2024, 1, 1)),
        ..Default::default()
    }
    .insert(&*app.db)
    .await;
    assert!(raw.is_err(), "check constraint must reject malformed email");

    let via_service = app
        .services
        .catalog
        .create_supplier(CreateSupplierInput {
            name: "Vintage Finds".into(),
            supplier_type: SupplierType::Business,
            contact_name: None,
            contact_email: Some("not-an-email".into()),
            phone: None,
            country: None,
            city: None,
            registration_date: None,
        })
        .await;
    assert_matches!(via_service, Err(ServiceError::ValidationError(_)));

    // No email at all is fine for suppliers
    let ok = supplier::ActiveModel {
        name: Set("Estate Sales Ltd".into()),
        supplier_type: Set(SupplierType::Individual),
        contact_email: Set(None),
        registration_date: Set(date(2024, 1, 1)),
        ..Default::default()
    }
    .insert(&*app.db)
    .await;
    assert!(ok.is_ok());
}

#[tokio::test]
async fn negative_purchase_price_is_rejected_by_the_schema() {
    let app = TestApp::new().await;
    let fx = app.seed().await;

    let raw = product::ActiveModel {
        brand_id: Set(fx.brand.id),
        category_id: Set(fx.handbags.id),
        supplier_id: Set(fx.supplier.id),
        initial_condition_id: Set(fx.condition("Good").id),
        name: Set("Evelyne".into()),
        purchase_date: Set(date(2024, 1, 10)),
        purchase_price: Set(dec!(-1.00)),
        ..Default::default()
    }
    .insert(&*app.db)
    .await;
    assert!(raw.is_err());
}

#[tokio::test]
async fn duplicate_sku_and_serial_are_conflicts() {
    let app = TestApp::new().await;
    let fx = app.seed().await;
    let birkin = app
        .add_product(&fx, "Birkin 30", Some("HB-0001"), dec!(9000.00))
        .await;
    app.add_listed_item(&birkin, "SKU-BIRKIN-1", dec!(12500.00)).await;

    let dup_sku = app
        .services
        .inventory
        .receive_item(ReceiveItemInput {
            product_id: birkin.id,
            sku: "SKU-BIRKIN-1".into(),
            date_received: None,
            current_condition_id: None,
            listing_price: None,
            location: None,
        })
        .await;
    assert_matches!(dup_sku, Err(ServiceError::Conflict(_)));

    let dup_serial = app
        .services
        .products
        .intake_product(IntakeProductInput {
            brand_id: fx.brand.id,
            category_id: fx.handbags.id,
            supplier_id: fx.supplier.id,
            initial_condition_id: fx.condition("Good").id,
            name: "Birkin 30 (copy)".into(),
            material: None,
            color: None,
            size: None,
            serial_number: Some("HB-0001".into()),
            purchase_date: date(2024, 1, 10),
            purchase_price: dec!(100.00),
            acquisition_notes: None,
        })
        .await;
    assert_matches!(dup_serial, Err(ServiceError::Conflict(_)));
}

#[tokio::test]
async fn an_inventory_item_is_sold_at_most_once() {
    let app = TestApp::new().await;
    let fx = app.seed().await;
    let product = app.add_product(&fx, "Lindy 26", None, dec!(3000.00)).await;
    let item = app.add_listed_item(&product, "SKU-LINDY", dec!(4200.00)).await;
    let buyer = app.add_customer("Ana", "Silva", "ana@example.com").await;
    let second_buyer = app.add_customer("Ben", "Okafor", "ben@example.com").await;

    let order = app
        .services
        .orders
        .place_order(PlaceOrderInput {
            customer_id: buyer.id,
            shipping_address: Some("1 Rua Augusta, Lisboa".into()),
            billing_address: None,
            shipping_cost: dec!(0),
            lines: vec![OrderLineInput {
                inventory_item_id: item.id,
                selling_price: dec!(4200.00),
                discount_amount: dec!(0),
            }],
        })
        .await
        .expect("first sale");

    // Second checkout of the same item
    let again = app
        .services
        .orders
        .place_order(PlaceOrderInput {
            customer_id: second_buyer.id,
            shipping_address: None,
            billing_address: None,
            shipping_cost: dec!(0),
            lines: vec![OrderLineInput {
                inventory_item_id: item.id,
                selling_price: dec!(4000.00),
                discount_amount: dec!(0),
            }],
        })
        .await;
    assert_matches!(again, Err(ServiceError::InvalidStatus(_)));

    // Bypassing the service, the unique index still refuses a second line
    let other_order = sales_order::ActiveModel {
        customer_id: Set(second_buyer.id),
        order_date: Set(chrono::Utc::now()),
        total_amount: Set(dec!(4000.00)),
        shipping_cost: Set(dec!(0)),
        status: Set(OrderStatus::PendingPayment),
        ..Default::default()
    }
    .insert(&*app.db)
    .await
    .expect("raw order");
    let second_line = order_item::ActiveModel {
        sales_order_id: Set(other_order.id),
        inventory_item_id: Set(item.id),
        selling_price: Set(dec!(4000.00)),
        discount_amount: Set(dec!(0)),
        ..Default::default()
    }
    .insert(&*app.db)
    .await;
    assert!(second_line.is_err());

    let lines = app.services.orders.order_items(order.id).await.unwrap();
    assert_eq!(lines.len(), 1);
}

#[tokio::test]
async fn referenced_rows_cannot_be_deleted() {
    let app = TestApp::new().await;
    let fx = app.seed().await;
    app.add_product(&fx, "Constance 24", None, dec!(5000.00)).await;
    let catalog = &app.services.catalog;

    assert_matches!(catalog.delete_brand(fx.brand.id).await, Err(ServiceError::Conflict(_)));
    assert_matches!(
        catalog.delete_category(fx.bags.id).await,
        Err(ServiceError::Conflict(_))
    );
    assert_matches!(
        catalog.delete_supplier(fx.supplier.id).await,
        Err(ServiceError::Conflict(_))
    );
    assert_matches!(catalog.delete_brand(424_242).await, Err(ServiceError::NotFound(_)));

    // Unreferenced rows go away
    let fair = fx.condition("Fair");
    catalog.delete_condition(fair.id).await.expect("unused condition");
    assert!(catalog.find_condition_by_label("Fair").await.unwrap().is_none());

    let loner = app.add_customer("Cleo", "Park", "cleo@example.com").await;
    app.services
        .customers
        .delete_customer(loner.id)
        .await
        .expect("customer without orders");
}

#[tokio::test]
async fn product_details_view_is_stable_between_reads() {
    let app = TestApp::new().await;
    let fx = app.seed().await;
    app.add_product(&fx, "Picotin 18", Some("PC-18"), dec!(2100.00)).await;
    app.add_product(&fx, "Herbag 31", None, dec!(1800.00)).await;

    let reports = &app.services.reports;
    let all = ProductDetailsFilter::default();
    let first = reports.product_details(&all).await.unwrap();
    let second = reports.product_details(&all).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].brand_name, "Hermès");
    assert_eq!(first[0].category_name, "Handbags");
    assert_eq!(first[0].brand_country.as_deref(), Some("France"));

    let none = reports
        .product_details(&ProductDetailsFilter {
            brand_name: Some("Chanel".into()),
            category_name: None,
        })
        .await
        .unwrap();
    assert!(none.is_empty());
}
