use crate::{
    db::{record_transaction, rollback},
    entities::{
        customer,
        inventory_item::InventoryStatus,
        order_item,
        sales_order::{self, OrderStatus},
    },
    errors::ServiceError,
    services::{
        inventory::{apply_transition, find_item},
        products::validate_non_negative,
    },
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderLineInput {
    pub inventory_item_id: i32,
    #[validate(custom = "validate_non_negative")]
    pub selling_price: Decimal,
    #[serde(default)]
    #[validate(custom = "validate_non_negative")]
    pub discount_amount: Decimal,
}

impl OrderLineInput {
    fn net(&self) -> Decimal {
        self.selling_price - self.discount_amount
    }
}

/// Checkout request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PlaceOrderInput {
    pub customer_id: i32,
    pub shipping_address: Option<String>,
    pub billing_address: Option<String>,
    #[serde(default)]
    #[validate(custom = "validate_non_negative")]
    pub shipping_cost: Decimal,
    #[validate(length(min = 1))]
    pub lines: Vec<OrderLineInput>,
}

impl PlaceOrderInput {
    /// Sum of discounted line prices plus shipping.
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(OrderLineInput::net).sum::<Decimal>() + self.shipping_cost
    }
}

/// One row of a customer's order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct OrderHistoryEntry {
    pub order_id: i32,
    pub order_date: DateTime<Utc>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
}

/// Checkout and order lifecycle
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates the order, its lines and marks every item Sold, all in one transaction.
    #[instrument(skip(self, input), fields(customer_id = input.customer_id, lines = input.lines.len()))]
    pub async fn place_order(
        &self,
        input: PlaceOrderInput,
    ) -> Result<sales_order::Model, ServiceError> {
        input.validate()?;
        for line in &input.lines {
            line.validate()?;
        }
        if let Some(line) = input
            .lines
            .iter()
            .find(|l| l.discount_amount > l.selling_price)
        {
            return Err(ServiceError::ValidationError(format!(
                "Discount exceeds selling price for item {}",
                line.inventory_item_id
            )));
        }

        let txn = self.db.begin().await?;
        match checkout(&txn, &input).await {
            Ok(order) => {
                txn.commit().await?;
                record_transaction("place_order", true);
                info!(order_id = order.id, total = %order.total_amount, "Order placed");
                Ok(order)
            }
            Err(e) => {
                rollback(txn, "place_order").await;
                warn!(error = %e, "Checkout rolled back");
                Err(e)
            }
        }
    }

    pub async fn get_order(&self, order_id: i32) -> Result<sales_order::Model, ServiceError> {
        find_order(&*self.db, order_id).await
    }

    /// Applies an order status change. Cancellation and return also release the sold items.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: i32,
        status: OrderStatus,
    ) -> Result<sales_order::Model, ServiceError> {
        match status {
            OrderStatus::Cancelled => return self.cancel_order(order_id).await,
            OrderStatus::Returned => return self.return_order(order_id).await,
            _ => {}
        }

        let order = find_order(&*self.db, order_id).await?;
        let order = set_order_status(&*self.db, order, status).await?;
        info!(order_id, status = %order.status, "Order status updated");
        Ok(order)
    }

    #[instrument(skip(self))]
    pub async fn ship_order(
        &self,
        order_id: i32,
        tracking_number: &str,
    ) -> Result<sales_order::Model, ServiceError> {
        if tracking_number.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Tracking number must not be empty".to_string(),
            ));
        }

        let order = find_order(&*self.db, order_id).await?;
        ensure_order_transition(&order, OrderStatus::Shipped)?;

        let order = guarded_order_update(
            &*self.db,
            &order,
            sales_order::ActiveModel {
                status: Set(OrderStatus::Shipped),
                tracking_number: Set(Some(tracking_number.to_string())),
                ..Default::default()
            },
        )
        .await?;

        info!(order_id, tracking_number, "Order shipped");
        Ok(order)
    }

    pub async fn cancel_order(&self, order_id: i32) -> Result<sales_order::Model, ServiceError> {
        self.close_order(order_id, OrderStatus::Cancelled, "cancel_order")
            .await
    }

    pub async fn return_order(&self, order_id: i32) -> Result<sales_order::Model, ServiceError> {
        self.close_order(order_id, OrderStatus::Returned, "return_order")
            .await
    }

    /// Lines of an order, in insertion order.
    pub async fn order_items(&self, order_id: i32) -> Result<Vec<order_item::Model>, ServiceError> {
        find_order(&*self.db, order_id).await?;
        lines_of(&*self.db, order_id).await
    }

    /// Orders of a customer, newest first. Unknown customers simply have no history.
    #[instrument(skip(self))]
    pub async fn customer_order_history(
        &self,
        customer_id: i32,
    ) -> Result<Vec<OrderHistoryEntry>, ServiceError> {
        Ok(sales_order::Entity::find()
            .select_only()
            .column_as(sales_order::Column::Id, "order_id")
            .column(sales_order::Column::OrderDate)
            .column(sales_order::Column::TotalAmount)
            .column(sales_order::Column::Status)
            .filter(sales_order::Column::CustomerId.eq(customer_id))
            .order_by_desc(sales_order::Column::OrderDate)
            .order_by_desc(sales_order::Column::Id)
            .into_model::<OrderHistoryEntry>()
            .all(&*self.db)
            .await?)
    }

    async fn close_order(
        &self,
        order_id: i32,
        status: OrderStatus,
        operation: &'static str,
    ) -> Result<sales_order::Model, ServiceError> {
        let txn = self.db.begin().await?;
        match close_order_in(&txn, order_id, status).await {
            Ok(order) => {
                txn.commit().await?;
                record_transaction(operation, true);
                info!(order_id, status = %order.status, "Order closed");
                Ok(order)
            }
            Err(e) => {
                rollback(txn, operation).await;
                Err(e)
            }
        }
    }
}

async fn checkout(
    txn: &DatabaseTransaction,
    input: &PlaceOrderInput,
) -> Result<sales_order::Model, ServiceError> {
    customer::Entity::find_by_id(input.customer_id)
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", input.customer_id)))?;

    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(input.lines.len());
    for line in &input.lines {
        if !seen.insert(line.inventory_item_id) {
            return Err(ServiceError::ValidationError(format!(
                "Inventory item {} appears on more than one line",
                line.inventory_item_id
            )));
        }
        let item = find_item(txn, line.inventory_item_id).await?;
        if !item.status.can_transition_to(InventoryStatus::Sold) {
            return Err(ServiceError::InvalidStatus(format!(
                "Inventory item {} is {} and cannot be sold",
                item.id, item.status
            )));
        }
        items.push(item);
    }

    let order = sales_order::ActiveModel {
        customer_id: Set(input.customer_id),
        order_date: Set(Utc::now()),
        total_amount: Set(input.total()),
        shipping_address: Set(input.shipping_address.clone()),
        billing_address: Set(input.billing_address.clone()),
        shipping_cost: Set(input.shipping_cost),
        status: Set(OrderStatus::PendingPayment),
        tracking_number: Set(None),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    for (line, item) in input.lines.iter().zip(items) {
        order_item::ActiveModel {
            sales_order_id: Set(order.id),
            inventory_item_id: Set(line.inventory_item_id),
            selling_price: Set(line.selling_price),
            discount_amount: Set(line.discount_amount),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        apply_transition(txn, item, InventoryStatus::Sold).await?;
    }

    Ok(order)
}

async fn close_order_in(
    txn: &DatabaseTransaction,
    order_id: i32,
    status: OrderStatus,
) -> Result<sales_order::Model, ServiceError> {
    let order = find_order(txn, order_id).await?;
    let order = set_order_status(txn, order, status).await?;

    for line in lines_of(txn, order_id).await? {
        let item = find_item(txn, line.inventory_item_id).await?;
        if item.status == InventoryStatus::Sold {
            apply_transition(txn, item, InventoryStatus::Returned).await?;
        }
    }

    Ok(order)
}

async fn find_order<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
) -> Result<sales_order::Model, ServiceError> {
    sales_order::Entity::find_by_id(order_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
}

async fn lines_of<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
) -> Result<Vec<order_item::Model>, ServiceError> {
    Ok(order_item::Entity::find()
        .filter(order_item::Column::SalesOrderId.eq(order_id))
        .order_by_asc(order_item::Column::Id)
        .all(conn)
        .await?)
}

fn ensure_order_transition(
    order: &sales_order::Model,
    next: OrderStatus,
) -> Result<(), ServiceError> {
    if order.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(ServiceError::InvalidStatus(format!(
            "Order {} cannot move from {} to {}",
            order.id, order.status, next
        )))
    }
}

async fn set_order_status<C: ConnectionTrait>(
    conn: &C,
    order: sales_order::Model,
    next: OrderStatus,
) -> Result<sales_order::Model, ServiceError> {
    ensure_order_transition(&order, next)?;
    guarded_order_update(
        conn,
        &order,
        sales_order::ActiveModel {
            status: Set(next),
            ..Default::default()
        },
    )
    .await
}

/// Applies `changes` only if the order still has the status it was read with.
async fn guarded_order_update<C: ConnectionTrait>(
    conn: &C,
    order: &sales_order::Model,
    changes: sales_order::ActiveModel,
) -> Result<sales_order::Model, ServiceError> {
    let result = sales_order::Entity::update_many()
        .set(changes)
        .filter(sales_order::Column::Id.eq(order.id))
        .filter(sales_order::Column::Status.eq(order.status))
        .exec(conn)
        .await?;

    let current = find_order(conn, order.id).await?;
    if result.rows_affected == 0 {
        return Err(ServiceError::InvalidStatus(format!(
            "Order {} is now {}",
            order.id, current.status
        )));
    }
    Ok(current)
}
