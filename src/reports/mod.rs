//! Report row types and the labeling rules used by the analytical queries.

use crate::entities::{InventoryStatus, OrderStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category_id: i32,
    pub category_name: String,
    pub product_count: u64,
    /// `None` for categories without products.
    pub average_purchase_price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerSpend {
    pub customer_id: i32,
    pub customer_name: String,
    pub email: String,
    pub order_count: u64,
    pub total_spent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandSales {
    pub brand_id: i32,
    pub brand_name: String,
    pub units_sold: u64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingSummary {
    pub inventory_item_id: i32,
    pub sku: String,
    pub product_name: String,
    pub brand_name: String,
    pub listing_price: Decimal,
    pub status: InventoryStatus,
    pub condition: String,
    pub grade: ConditionGrade,
}

/// A (name, email) pair from either customers or suppliers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, FromQueryResult)]
pub struct ContactEntry {
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetMode {
    /// `UNION`: duplicates removed.
    Distinct,
    /// `UNION ALL`: every row kept.
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabeledOrder {
    pub order_id: i32,
    pub customer_id: i32,
    pub order_date: DateTime<Utc>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub size: OrderSize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerContact {
    pub customer_id: i32,
    pub customer_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub product_id: i32,
    pub product_name: String,
    pub serial_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SellThrough {
    pub category_id: i32,
    pub category_name: String,
    pub total_items: u64,
    pub sold_items: u64,
    /// Sold share in percent, `None` when the category has no inventory.
    pub sell_through_pct: Option<Decimal>,
}

/// Optional name filters for the product details view.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductDetailsFilter {
    pub brand_name: Option<String>,
    pub category_name: Option<String>,
}

/// Ordered labeling rules: the first tier whose bound the value stays below wins,
/// anything past the last bound falls through to the fallback label.
#[derive(Debug, Clone)]
pub struct TierLadder<L> {
    tiers: Vec<(Decimal, L)>,
    fallback: L,
}

impl<L: Copy> TierLadder<L> {
    pub fn new(tiers: Vec<(Decimal, L)>, fallback: L) -> Self {
        Self { tiers, fallback }
    }

    pub fn label(&self, value: Decimal) -> L {
        self.tiers
            .iter()
            .find(|(upper, _)| value < *upper)
            .map(|(_, label)| *label)
            .unwrap_or(self.fallback)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
pub enum OrderSize {
    Small,
    Medium,
    Large,
}

impl OrderSize {
    pub fn ladder() -> TierLadder<OrderSize> {
        TierLadder::new(
            vec![
                (Decimal::from(50), OrderSize::Small),
                (Decimal::from(200), OrderSize::Medium),
            ],
            OrderSize::Large,
        )
    }

    pub fn for_total(total: Decimal) -> Self {
        Self::ladder().label(total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum ConditionGrade {
    #[strum(serialize = "Top Grade")]
    TopGrade,
    #[strum(serialize = "Standard")]
    Standard,
    #[strum(serialize = "Needs Attention")]
    NeedsAttention,
}

impl ConditionGrade {
    pub fn for_label(label: &str) -> Self {
        match label.trim() {
            "Pristine" | "Excellent" => Self::TopGrade,
            "Very Good" | "Good" => Self::Standard,
            _ => Self::NeedsAttention,
        }
    }
}

/// `part / whole * 100` rounded to two places; `None` when `whole` is zero.
pub fn percentage(part: u64, whole: u64) -> Option<Decimal> {
    if whole == 0 {
        return None;
    }
    let pct = Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole);
    Some(pct.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(0), OrderSize::Small)]
    #[case(dec!(49.99), OrderSize::Small)]
    #[case(dec!(50), OrderSize::Medium)]
    #[case(dec!(75.00), OrderSize::Medium)]
    #[case(dec!(199.99), OrderSize::Medium)]
    #[case(dec!(200), OrderSize::Large)]
    #[case(dec!(4800.00), OrderSize::Large)]
    fn order_size_boundaries(#[case] total: Decimal, #[case] expected: OrderSize) {
        assert_eq!(OrderSize::for_total(total), expected);
    }

    #[rstest]
    #[case("Pristine", ConditionGrade::TopGrade)]
    #[case("Excellent", ConditionGrade::TopGrade)]
    #[case("Very Good", ConditionGrade::Standard)]
    #[case("Good", ConditionGrade::Standard)]
    #[case("Fair", ConditionGrade::NeedsAttention)]
    #[case("", ConditionGrade::NeedsAttention)]
    fn condition_grades(#[case] label: &str, #[case] expected: ConditionGrade) {
        assert_eq!(ConditionGrade::for_label(label), expected);
    }

    #[test]
    fn grade_display_names() {
        assert_eq!(ConditionGrade::TopGrade.to_string(), "Top Grade");
        assert_eq!(ConditionGrade::NeedsAttention.to_string(), "Needs Attention");
    }

    #[test]
    fn ladder_uses_fallback_when_empty() {
        let ladder: TierLadder<char> = TierLadder::new(vec![], 'x');
        assert_eq!(ladder.label(dec!(1)), 'x');
    }

    #[test]
    fn percentage_guards_zero_divisor() {
        assert_eq!(percentage(3, 0), None);
        assert_eq!(percentage(0, 4), Some(dec!(0)));
        assert_eq!(percentage(1, 3), Some(dec!(33.33)));
        assert_eq!(percentage(2, 2), Some(dec!(100)));
    }
}
