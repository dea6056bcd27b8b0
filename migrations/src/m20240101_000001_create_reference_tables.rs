use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Suppliers: individuals, consignment partners and businesses we acquire goods from
        manager
            .create_table(
                Table::create()
                    .table(Suppliers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Suppliers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Suppliers::Name).string_len(150).not_null())
                    .col(
                        ColumnDef::new(Suppliers::SupplierType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Suppliers::ContactName).string_len(150).null())
                    .col(
                        ColumnDef::new(Suppliers::ContactEmail)
                            .string_len(255)
                            .null()
                            .check(Expr::cust(
                                "contact_email IS NULL OR contact_email LIKE '%_@_%._%'",
                            )),
                    )
                    .col(ColumnDef::new(Suppliers::Phone).string_len(50).null())
                    .col(ColumnDef::new(Suppliers::Country).string_len(100).null())
                    .col(ColumnDef::new(Suppliers::City).string_len(100).null())
                    .col(ColumnDef::new(Suppliers::RegistrationDate).date().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Brands::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Brands::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Brands::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Brands::CountryOfOrigin).string_len(100).null())
                    .to_owned(),
            )
            .await?;

        // Categories form a tree through parent_id; roots have a NULL parent
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Categories::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Categories::ParentId).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_categories_parent_id")
                            .from(Categories::Table, Categories::ParentId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Conditions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Conditions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Conditions::Label)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Conditions::Description).text().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Conditions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Brands::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Suppliers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Suppliers {
    Table,
    Id,
    Name,
    SupplierType,
    ContactName,
    ContactEmail,
    Phone,
    Country,
    City,
    RegistrationDate,
}

#[derive(DeriveIden)]
pub enum Brands {
    Table,
    Id,
    Name,
    CountryOfOrigin,
}

#[derive(DeriveIden)]
pub enum Categories {
    Table,
    Id,
    Name,
    ParentId,
}

#[derive(DeriveIden)]
pub enum Conditions {
    Table,
    Id,
    Label,
    Description,
}
