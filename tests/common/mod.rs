#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use resale_catalog::{
    db::{self, DbConfig},
    entities::{brand, category, customer, inventory_item, item_condition, product, supplier, SupplierType},
    services::{
        catalog::{CreateBrandInput, CreateSupplierInput},
        customers::RegisterCustomerInput,
        inventory::ReceiveItemInput,
        products::IntakeProductInput,
    },
    AppServices,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

/// Services over a fresh, fully migrated in-memory SQLite database.
pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub services: AppServices,
}

/// Reference rows most tests need.
pub struct Fixture {
    pub supplier: supplier::Model,
    pub brand: brand::Model,
    pub bags: category::Model,
    pub handbags: category::Model,
    pub conditions: Vec<item_condition::Model>,
}

impl Fixture {
    pub fn condition(&self, label: &str) -> &item_condition::Model {
        self.conditions
            .iter()
            .find(|c| c.label == label)
            .expect("seeded condition")
    }
}

impl TestApp {
    pub async fn new() -> Self {
        // One connection: every in-memory SQLite connection is its own database
        let config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&config)
            .await
            .expect("in-memory sqlite");
        db::run_migrations(&pool).await.expect("migrations");

        let db = Arc::new(pool);
        let services = AppServices::new(db.clone());
        Self { db, services }
    }

    pub async fn seed(&self) -> Fixture {
        let catalog = &self.services.catalog;
        let supplier = catalog
            .create_supplier(CreateSupplierInput {
                name: "Maison Consign".into(),
                supplier_type: SupplierType::ConsignmentPartner,
                contact_name: Some("Claire Dubois".into()),
                contact_email: Some("claire@maisonconsign.fr".into()),
                phone: None,
                country: Some("France".into()),
                city: Some("Paris".into()),
                registration_date: Some(date(2023, 5, 2)),
            })
            .await
            .expect("supplier");
        let brand = catalog
            .create_brand(CreateBrandInput {
                name: "Hermès".into(),
                country_of_origin: Some("France".into()),
            })
            .await
            .expect("brand");
        let bags = catalog.create_category("Bags", None).await.expect("bags");
        let handbags = catalog
            .create_category("Handbags", Some(bags.id))
            .await
            .expect("handbags");
        let conditions = catalog
            .ensure_default_conditions()
            .await
            .expect("conditions");

        Fixture {
            supplier,
            brand,
            bags,
            handbags,
            conditions,
        }
    }

    pub async fn add_product(
        &self,
        fx: &Fixture,
        name: &str,
        serial: Option<&str>,
        price: Decimal,
    ) -> product::Model {
        self.services
            .products
            .intake_product(IntakeProductInput {
                brand_id: fx.brand.id,
                category_id: fx.handbags.id,
                supplier_id: fx.supplier.id,
                initial_condition_id: fx.condition("Excellent").id,
                name: name.into(),
                material: Some("Leather".into()),
                color: Some("Black".into()),
                size: None,
                serial_number: serial.map(str::to_string),
                purchase_date: date(2024, 1, 15),
                purchase_price: price,
                acquisition_notes: None,
            })
            .await
            .expect("product intake")
    }

    /// Receives and lists an item so it is InStock.
    pub async fn add_listed_item(
        &self,
        product: &product::Model,
        sku: &str,
        price: Decimal,
    ) -> inventory_item::Model {
        let inventory = &self.services.inventory;
        let item = inventory
            .receive_item(ReceiveItemInput {
                product_id: product.id,
                sku: sku.into(),
                date_received: Some(date(2024, 2, 1)),
                current_condition_id: None,
                listing_price: None,
                location: Some("Shelf A".into()),
            })
            .await
            .expect("receive item");
        inventory.list_item(item.id, price).await.expect("list item")
    }

    pub async fn add_customer(&self, first: &str, last: &str, email: &str) -> customer::Model {
        self.services
            .customers
            .register_customer(RegisterCustomerInput {
                first_name: first.into(),
                last_name: last.into(),
                email: email.into(),
                phone: None,
                registration_date: Some(date(2024, 1, 1)),
            })
            .await
            .expect("customer")
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}
