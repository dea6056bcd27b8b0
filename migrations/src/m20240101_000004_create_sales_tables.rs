use sea_orm_migration::prelude::*;

use super::m20240101_000003_create_inventory_items_table::InventoryItems;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Customers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Customers::FirstName).string_len(100).not_null())
                    .col(ColumnDef::new(Customers::LastName).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Customers::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key()
                            .check(Expr::cust("email LIKE '%_@_%._%'")),
                    )
                    .col(ColumnDef::new(Customers::Phone).string_len(50).null())
                    .col(ColumnDef::new(Customers::RegistrationDate).date().not_null())
                    .col(
                        ColumnDef::new(Customers::LastLogin)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SalesOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SalesOrders::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SalesOrders::CustomerId).integer().not_null())
                    .col(
                        ColumnDef::new(SalesOrders::OrderDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalesOrders::TotalAmount)
                            .decimal_len(12, 2)
                            .not_null()
                            .check(Expr::cust("total_amount >= 0")),
                    )
                    .col(ColumnDef::new(SalesOrders::ShippingAddress).text().null())
                    .col(ColumnDef::new(SalesOrders::BillingAddress).text().null())
                    .col(
                        ColumnDef::new(SalesOrders::ShippingCost)
                            .decimal_len(10, 2)
                            .not_null()
                            .default(0)
                            .check(Expr::cust("shipping_cost >= 0")),
                    )
                    .col(
                        ColumnDef::new(SalesOrders::Status)
                            .string_len(32)
                            .not_null()
                            .default("PendingPayment"),
                    )
                    .col(ColumnDef::new(SalesOrders::TrackingNumber).string_len(100).null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sales_orders_customer_id")
                            .from(SalesOrders::Table, SalesOrders::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // inventory_item_id is unique: an inventory item is sold at most once
        manager
            .create_table(
                Table::create()
                    .table(OrderItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderItems::SalesOrderId).integer().not_null())
                    .col(
                        ColumnDef::new(OrderItems::InventoryItemId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(OrderItems::SellingPrice)
                            .decimal_len(12, 2)
                            .not_null()
                            .check(Expr::cust("selling_price >= 0")),
                    )
                    .col(
                        ColumnDef::new(OrderItems::DiscountAmount)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0)
                            .check(Expr::cust("discount_amount >= 0")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_items_sales_order_id")
                            .from(OrderItems::Table, OrderItems::SalesOrderId)
                            .to(SalesOrders::Table, SalesOrders::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_items_inventory_item_id")
                            .from(OrderItems::Table, OrderItems::InventoryItemId)
                            .to(InventoryItems::Table, InventoryItems::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SalesOrders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Customers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Customers {
    Table,
    Id,
    FirstName,
    LastName,
    Email,
    Phone,
    RegistrationDate,
    LastLogin,
}

#[derive(DeriveIden)]
pub enum SalesOrders {
    Table,
    Id,
    CustomerId,
    OrderDate,
    TotalAmount,
    ShippingAddress,
    BillingAddress,
    ShippingCost,
    Status,
    TrackingNumber,
}

#[derive(DeriveIden)]
pub enum OrderItems {
    Table,
    Id,
    SalesOrderId,
    InventoryItemId,
    SellingPrice,
    DiscountAmount,
}
