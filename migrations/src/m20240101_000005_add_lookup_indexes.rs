use sea_orm_migration::prelude::*;

use super::m20240101_000002_create_products_tables::{AuthenticationLogs, Products};
use super::m20240101_000003_create_inventory_items_table::InventoryItems;
use super::m20240101_000004_create_sales_tables::{OrderItems, SalesOrders};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================
        // PRODUCTS TABLE INDEXES
        // ============================================

        manager
            .create_index(
                Index::create()
                    .name("idx_products_brand_id")
                    .table(Products::Table)
                    .col(Products::BrandId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_products_category_id")
                    .table(Products::Table)
                    .col(Products::CategoryId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_products_supplier_id")
                    .table(Products::Table)
                    .col(Products::SupplierId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // ============================================
        // INVENTORY_ITEMS TABLE INDEXES
        // ============================================

        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_items_status")
                    .table(InventoryItems::Table)
                    .col(InventoryItems::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_items_date_listed")
                    .table(InventoryItems::Table)
                    .col((InventoryItems::DateListed, IndexOrder::Desc))
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Foreign key index, used by re-listing and out-of-stock checks
        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_items_product_id")
                    .table(InventoryItems::Table)
                    .col(InventoryItems::ProductId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // ============================================
        // SALES_ORDERS TABLE INDEXES
        // ============================================

        manager
            .create_index(
                Index::create()
                    .name("idx_sales_orders_customer_id")
                    .table(SalesOrders::Table)
                    .col(SalesOrders::CustomerId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sales_orders_order_date")
                    .table(SalesOrders::Table)
                    .col((SalesOrders::OrderDate, IndexOrder::Desc))
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sales_orders_status")
                    .table(SalesOrders::Table)
                    .col(SalesOrders::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // ============================================
        // CHILD TABLE FOREIGN KEY INDEXES
        // ============================================

        manager
            .create_index(
                Index::create()
                    .name("idx_authentication_logs_product_id")
                    .table(AuthenticationLogs::Table)
                    .col(AuthenticationLogs::ProductId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_items_sales_order_id")
                    .table(OrderItems::Table)
                    .col(OrderItems::SalesOrderId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let indexes = [
            ("idx_order_items_sales_order_id", OrderItems::Table.to_string()),
            (
                "idx_authentication_logs_product_id",
                AuthenticationLogs::Table.to_string(),
            ),
            ("idx_sales_orders_status", SalesOrders::Table.to_string()),
            ("idx_sales_orders_order_date", SalesOrders::Table.to_string()),
            ("idx_sales_orders_customer_id", SalesOrders::Table.to_string()),
            ("idx_inventory_items_product_id", InventoryItems::Table.to_string()),
            ("idx_inventory_items_date_listed", InventoryItems::Table.to_string()),
            ("idx_inventory_items_status", InventoryItems::Table.to_string()),
            ("idx_products_supplier_id", Products::Table.to_string()),
            ("idx_products_category_id", Products::Table.to_string()),
            ("idx_products_brand_id", Products::Table.to_string()),
        ];

        for (name, table) in indexes {
            manager
                .drop_index(
                    Index::drop()
                        .name(name)
                        .table(Alias::new(table))
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }
}
