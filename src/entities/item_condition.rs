use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Grading labels seeded by `CatalogService::ensure_default_conditions`, best first.
pub const DEFAULT_CONDITIONS: [(&str, &str); 5] = [
    ("Pristine", "Unworn, with all original packaging and tags"),
    ("Excellent", "Minimal signs of use, no visible flaws"),
    ("Very Good", "Light wear visible on close inspection"),
    ("Good", "Moderate wear such as scuffs or corner rubbing"),
    ("Fair", "Noticeable wear, repairs or discoloration"),
];

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "conditions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub label: String,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
    #[sea_orm(has_many = "super::inventory_item::Entity")]
    InventoryItems,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::inventory_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
