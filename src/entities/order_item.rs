use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Point-in-time sale of one inventory item. Immutable once written.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub sales_order_id: i32,
    #[sea_orm(unique)]
    pub inventory_item_id: i32,
    pub selling_price: Decimal,
    pub discount_amount: Decimal,
}

impl Model {
    pub fn net_price(&self) -> Decimal {
        self.selling_price - self.discount_amount
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sales_order::Entity",
        from = "Column::SalesOrderId",
        to = "super::sales_order::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    SalesOrder,

    #[sea_orm(
        belongs_to = "super::inventory_item::Entity",
        from = "Column::InventoryItemId",
        to = "super::inventory_item::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    InventoryItem,
}

impl Related<super::sales_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesOrder.def()
    }
}

impl Related<super::inventory_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
