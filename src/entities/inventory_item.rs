use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

/// Lifecycle of a sellable unit.
///
/// ```text
/// Processing -> InStock -> Reserved -> Sold -> Returned
///      |           |  ^------'  |
///      +-----------+------------+--> Withdrawn
/// ```
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum InventoryStatus {
    #[sea_orm(string_value = "Processing")]
    Processing,
    #[sea_orm(string_value = "InStock")]
    InStock,
    #[sea_orm(string_value = "Reserved")]
    Reserved,
    #[sea_orm(string_value = "Sold")]
    Sold,
    #[sea_orm(string_value = "Returned")]
    Returned,
    #[sea_orm(string_value = "Withdrawn")]
    Withdrawn,
}

impl InventoryStatus {
    pub fn can_transition_to(self, next: InventoryStatus) -> bool {
        use InventoryStatus::*;
        matches!(
            (self, next),
            (Processing, InStock)
                | (Processing, Withdrawn)
                | (InStock, Reserved)
                | (InStock, Sold)
                | (InStock, Withdrawn)
                | (Reserved, Sold)
                | (Reserved, InStock)
                | (Reserved, Withdrawn)
                | (Sold, Returned)
        )
    }

    /// Item can still be priced, re-graded or sold.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Processing | Self::InStock | Self::Reserved)
    }

    /// No further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Returned | Self::Withdrawn)
    }
}

/// Mutable sale-readiness record of a product.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub product_id: i32,
    #[sea_orm(unique)]
    pub sku: String,
    pub date_received: NaiveDate,
    pub current_condition_id: i32,
    pub listing_price: Option<Decimal>,
    pub date_listed: Option<NaiveDate>,
    pub status: InventoryStatus,
    pub location: Option<String>,
    pub last_status_update: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Product,

    #[sea_orm(
        belongs_to = "super::item_condition::Entity",
        from = "Column::CurrentConditionId",
        to = "super::item_condition::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    CurrentCondition,

    #[sea_orm(has_one = "super::order_item::Entity")]
    OrderItem,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::item_condition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CurrentCondition.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        active_model.last_status_update = Set(Utc::now());
        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::InventoryStatus::{self, *};
    use rstest::rstest;
    use sea_orm::Iterable;

    #[rstest]
    #[case(Processing, InStock, true)]
    #[case(Processing, Sold, false)]
    #[case(InStock, Reserved, true)]
    #[case(InStock, Sold, true)]
    #[case(Reserved, InStock, true)]
    #[case(Reserved, Sold, true)]
    #[case(Sold, InStock, false)]
    #[case(Sold, Returned, true)]
    #[case(Returned, InStock, false)]
    #[case(Withdrawn, InStock, false)]
    fn transitions(
        #[case] from: InventoryStatus,
        #[case] to: InventoryStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for from in InventoryStatus::iter().filter(|s| s.is_terminal()) {
            assert!(InventoryStatus::iter().all(|to| !from.can_transition_to(to)));
        }
    }

    #[test]
    fn no_state_transitions_to_itself() {
        assert!(InventoryStatus::iter().all(|s| !s.can_transition_to(s)));
    }
}
