use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_reference_tables::Conditions;
use super::m20240101_000002_create_products_tables::Products;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InventoryItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InventoryItems::ProductId).integer().not_null())
                    .col(
                        ColumnDef::new(InventoryItems::Sku)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(InventoryItems::DateReceived).date().not_null())
                    .col(
                        ColumnDef::new(InventoryItems::CurrentConditionId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryItems::ListingPrice)
                            .decimal_len(12, 2)
                            .null()
                            .check(Expr::cust("listing_price IS NULL OR listing_price >= 0")),
                    )
                    .col(ColumnDef::new(InventoryItems::DateListed).date().null())
                    .col(
                        ColumnDef::new(InventoryItems::Status)
                            .string_len(32)
                            .not_null()
                            .default("Processing"),
                    )
                    .col(ColumnDef::new(InventoryItems::Location).string_len(100).null())
                    .col(
                        ColumnDef::new(InventoryItems::LastStatusUpdate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_items_product_id")
                            .from(InventoryItems::Table, InventoryItems::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_items_current_condition_id")
                            .from(InventoryItems::Table, InventoryItems::CurrentConditionId)
                            .to(Conditions::Table, Conditions::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InventoryItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum InventoryItems {
    Table,
    Id,
    ProductId,
    Sku,
    DateReceived,
    CurrentConditionId,
    ListingPrice,
    DateListed,
    Status,
    Location,
    LastStatusUpdate,
}
