use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Outcome of an authentication check.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum AuthenticationStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Authenticated")]
    Authenticated,
    #[sea_orm(string_value = "Counterfeit")]
    Counterfeit,
    #[sea_orm(string_value = "UnableToVerify")]
    UnableToVerify,
}

impl AuthenticationStatus {
    /// True for outcomes that block an item from sale.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Counterfeit | Self::UnableToVerify)
    }
}

/// Append-only audit entry. A product may be authenticated several times.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "authentication_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub product_id: i32,
    pub authentication_date: NaiveDate,
    pub authenticator: String,
    pub status: AuthenticationStatus,
    pub cost: Option<Decimal>,
    pub notes: Option<String>,
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
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
