use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_reference_tables::{Brands, Categories, Conditions, Suppliers};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Products hold the acquisition record of a physical item
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Products::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Products::BrandId).integer().not_null())
                    .col(ColumnDef::new(Products::CategoryId).integer().not_null())
                    .col(ColumnDef::new(Products::SupplierId).integer().not_null())
                    .col(
                        ColumnDef::new(Products::InitialConditionId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Products::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Products::Material).string_len(100).null())
                    .col(ColumnDef::new(Products::Color).string_len(50).null())
                    .col(ColumnDef::new(Products::Size).string_len(50).null())
                    .col(
                        ColumnDef::new(Products::SerialNumber)
                            .string_len(100)
                            .null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Products::PurchaseDate).date().not_null())
                    .col(
                        ColumnDef::new(Products::PurchasePrice)
                            .decimal_len(12, 2)
                            .not_null()
                            .check(Expr::cust("purchase_price >= 0")),
                    )
                    .col(ColumnDef::new(Products::AcquisitionNotes).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_brand_id")
                            .from(Products::Table, Products::BrandId)
                            .to(Brands::Table, Brands::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_category_id")
                            .from(Products::Table, Products::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_supplier_id")
                            .from(Products::Table, Products::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_initial_condition_id")
                            .from(Products::Table, Products::InitialConditionId)
                            .to(Conditions::Table, Conditions::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Append-only authentication audit trail
        manager
            .create_table(
                Table::create()
                    .table(AuthenticationLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuthenticationLogs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AuthenticationLogs::ProductId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuthenticationLogs::AuthenticationDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuthenticationLogs::Authenticator)
                            .string_len(150)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuthenticationLogs::Status)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuthenticationLogs::Cost)
                            .decimal_len(10, 2)
                            .null()
                            .check(Expr::cust("cost IS NULL OR cost >= 0")),
                    )
                    .col(ColumnDef::new(AuthenticationLogs::Notes).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_authentication_logs_product_id")
                            .from(AuthenticationLogs::Table, AuthenticationLogs::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuthenticationLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Products {
    Table,
    Id,
    BrandId,
    CategoryId,
    SupplierId,
    InitialConditionId,
    Name,
    Material,
    Color,
    Size,
    SerialNumber,
    PurchaseDate,
    PurchasePrice,
    AcquisitionNotes,
}

#[derive(DeriveIden)]
pub enum AuthenticationLogs {
    Table,
    Id,
    ProductId,
    AuthenticationDate,
    Authenticator,
    Status,
    Cost,
    Notes,
}
