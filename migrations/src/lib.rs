pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_reference_tables;
mod m20240101_000002_create_products_tables;
mod m20240101_000003_create_inventory_items_table;
mod m20240101_000004_create_sales_tables;
mod m20240101_000005_add_lookup_indexes;
mod m20240101_000006_create_product_details_view;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_reference_tables::Migration),
            Box::new(m20240101_000002_create_products_tables::Migration),
            Box::new(m20240101_000003_create_inventory_items_table::Migration),
            Box::new(m20240101_000004_create_sales_tables::Migration),
            Box::new(m20240101_000005_add_lookup_indexes::Migration),
            Box::new(m20240101_000006_create_product_details_view::Migration),
        ]
    }
}
