use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Enum representing the possible statuses of a sales order.
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
pub enum OrderStatus {
    #[sea_orm(string_value = "PendingPayment")]
    PendingPayment,
    #[sea_orm(string_value = "Processing")]
    Processing,
    #[sea_orm(string_value = "Shipped")]
    Shipped,
    #[sea_orm(string_value = "Delivered")]
    Delivered,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
    #[sea_orm(string_value = "Returned")]
    Returned,
}

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (PendingPayment, Processing)
                | (PendingPayment, Cancelled)
                | (Processing, Shipped)
                | (Processing, Cancelled)
                | (Shipped, Delivered)
                | (Shipped, Returned)
                | (Delivered, Returned)
        )
    }
}

/// The `sales_orders` table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub customer_id: i32,
    pub order_date: DateTimeUtc,
    /// Sum of line prices net of discounts, plus shipping.
    pub total_amount: Decimal,
    pub shipping_address: Option<String>,
    pub billing_address: Option<String>,
    pub shipping_cost: Decimal,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Customer,

    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::OrderStatus::{self, *};
    use rstest::rstest;

    #[rstest]
    #[case(PendingPayment, Processing, true)]
    #[case(PendingPayment, Shipped, false)]
    #[case(Processing, Cancelled, true)]
    #[case(Shipped, Cancelled, false)]
    #[case(Shipped, Returned, true)]
    #[case(Delivered, Returned, true)]
    #[case(Cancelled, Processing, false)]
    #[case(Returned, Delivered, false)]
    fn transitions(#[case] from: OrderStatus, #[case] to: OrderStatus, #[case] allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }
}
