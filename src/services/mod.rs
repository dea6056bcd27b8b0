// Reference data and the category tree
pub mod catalog;

// Acquisition and authentication
pub mod products;

// Inventory lifecycle
pub mod inventory;

// Customers and checkout
pub mod customers;
pub mod orders;

// Read-only analytics
pub mod reports;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Every service, sharing one connection pool.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: catalog::CatalogService,
    pub products: products::ProductService,
    pub inventory: inventory::InventoryService,
    pub customers: customers::CustomerService,
    pub orders: orders::OrderService,
    pub reports: reports::ReportService,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            catalog: catalog::CatalogService::new(db.clone()),
            products: products::ProductService::new(db.clone()),
            inventory: inventory::InventoryService::new(db.clone()),
            customers: customers::CustomerService::new(db.clone()),
            orders: orders::OrderService::new(db.clone()),
            reports: reports::ReportService::new(db),
        }
    }
}
