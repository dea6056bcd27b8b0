use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Acquisition record of a physical item. Written once at intake, never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub brand_id: i32,
    pub category_id: i32,
    pub supplier_id: i32,
    pub initial_condition_id: i32,
    pub name: String,
    pub material: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    #[sea_orm(unique)]
    pub serial_number: Option<String>,
    pub purchase_date: NaiveDate,
    pub purchase_price: Decimal,
    pub acquisition_notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::brand::Entity",
        from = "Column::BrandId",
        to = "super::brand::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Brand,

    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Category,

    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Supplier,

    #[sea_orm(
        belongs_to = "super::item_condition::Entity",
        from = "Column::InitialConditionId",
        to = "super::item_condition::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    InitialCondition,

    #[sea_orm(has_many = "super::authentication_log::Entity")]
    AuthenticationLogs,

    #[sea_orm(has_many = "super::inventory_item::Entity")]
    InventoryItems,
}

impl Related<super::brand::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Brand.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::item_condition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InitialCondition.def()
    }
}

impl Related<super::authentication_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthenticationLogs.def()
    }
}

impl Related<super::inventory_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
