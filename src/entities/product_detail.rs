//! Read-only entity over the `product_details` view.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_details")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_id: i32,
    pub product_name: String,
    pub brand_name: String,
    pub brand_country: Option<String>,
    pub category_name: String,
    pub material: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub serial_number: Option<String>,
    pub purchase_date: NaiveDate,
    pub purchase_price: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
