use crate::{
    db::{record_transaction, rollback},
    entities::{
        inventory_item::{self, InventoryStatus},
        item_condition, product,
    },
    errors::ServiceError,
    services::products::validate_non_negative,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// A physical unit arriving for sale.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReceiveItemInput {
    pub product_id: i32,
    #[validate(length(min = 1, max = 50))]
    pub sku: String,
    /// Defaults to today.
    pub date_received: Option<NaiveDate>,
    /// Defaults to the product's initial condition.
    pub current_condition_id: Option<i32>,
    #[validate(custom = "validate_non_negative")]
    pub listing_price: Option<Decimal>,
    pub location: Option<String>,
}

/// A fresh unit for a product whose earlier units are all closed out.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RelistInput {
    #[validate(length(min = 1, max = 50))]
    pub sku: String,
    pub current_condition_id: Option<i32>,
    #[validate(custom = "validate_non_negative")]
    pub listing_price: Option<Decimal>,
    pub location: Option<String>,
}

/// Inventory item lifecycle.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates an item in `Processing`.
    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn receive_item(
        &self,
        input: ReceiveItemInput,
    ) -> Result<inventory_item::Model, ServiceError> {
        input.validate()?;
        insert_received(&*self.db, input).await
    }

    pub async fn get_item(&self, item_id: i32) -> Result<inventory_item::Model, ServiceError> {
        find_item(&*self.db, item_id).await
    }

    /// Prices a processed item and puts it on sale.
    #[instrument(skip(self))]
    pub async fn list_item(
        &self,
        item_id: i32,
        listing_price: Decimal,
    ) -> Result<inventory_item::Model, ServiceError> {
        validate_non_negative(&listing_price)
            .map_err(|_| ServiceError::ValidationError("Listing price must not be negative".into()))?;

        let item = find_item(&*self.db, item_id).await?;
        if item.status != InventoryStatus::Processing {
            return Err(ServiceError::InvalidStatus(format!(
                "Item {} cannot be listed from {}",
                item_id, item.status
            )));
        }

        let item = guarded_update(
            &*self.db,
            item_id,
            &[InventoryStatus::Processing],
            inventory_item::ActiveModel {
                listing_price: Set(Some(listing_price)),
                date_listed: Set(Some(Utc::now().date_naive())),
                status: Set(InventoryStatus::InStock),
                ..Default::default()
            },
        )
        .await?;

        info!(item_id, %listing_price, "Inventory item listed");
        Ok(item)
    }

    pub async fn reserve_item(&self, item_id: i32) -> Result<inventory_item::Model, ServiceError> {
        self.transition(item_id, InventoryStatus::Reserved).await
    }

    /// Puts a reserved item back on sale.
    pub async fn release_reservation(
        &self,
        item_id: i32,
    ) -> Result<inventory_item::Model, ServiceError> {
        let item = find_item(&*self.db, item_id).await?;
        if item.status != InventoryStatus::Reserved {
            return Err(ServiceError::InvalidStatus(format!(
                "Item {} is {}, not Reserved",
                item_id, item.status
            )));
        }
        apply_transition(&*self.db, item, InventoryStatus::InStock).await
    }

    pub async fn withdraw_item(&self, item_id: i32) -> Result<inventory_item::Model, ServiceError> {
        self.transition(item_id, InventoryStatus::Withdrawn).await
    }

    /// Moves an item to `next` if the lifecycle allows it.
    ///
    /// Selling and returning belong to the order flow, so `Sold` can be neither
    /// the target nor the source here.
    #[instrument(skip(self))]
    pub async fn transition(
        &self,
        item_id: i32,
        next: InventoryStatus,
    ) -> Result<inventory_item::Model, ServiceError> {
        let item = find_item(&*self.db, item_id).await?;
        if next == InventoryStatus::Sold || item.status == InventoryStatus::Sold {
            return Err(ServiceError::InvalidOperation(format!(
                "Inventory item {} can only move from {} to {} through an order",
                item_id, item.status, next
            )));
        }
        apply_transition(&*self.db, item, next).await
    }

    #[instrument(skip(self))]
    pub async fn update_listing_price(
        &self,
        item_id: i32,
        listing_price: Decimal,
    ) -> Result<inventory_item::Model, ServiceError> {
        validate_non_negative(&listing_price)
            .map_err(|_| ServiceError::ValidationError("Listing price must not be negative".into()))?;

        let item = self.active_item(item_id).await?;
        guarded_update(
            &*self.db,
            item_id,
            &[item.status],
            inventory_item::ActiveModel {
                listing_price: Set(Some(listing_price)),
                ..Default::default()
            },
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn update_condition(
        &self,
        item_id: i32,
        condition_id: i32,
    ) -> Result<inventory_item::Model, ServiceError> {
        let item = self.active_item(item_id).await?;
        ensure_condition(&*self.db, condition_id).await?;

        guarded_update(
            &*self.db,
            item_id,
            &[item.status],
            inventory_item::ActiveModel {
                current_condition_id: Set(condition_id),
                ..Default::default()
            },
        )
        .await
    }

    /// Opens a new sale cycle for a product once every earlier unit is Returned or Withdrawn.
    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn relist_product(
        &self,
        product_id: i32,
        input: RelistInput,
    ) -> Result<inventory_item::Model, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;
        match relist_in(&txn, product_id, input).await {
            Ok(item) => {
                txn.commit().await?;
                record_transaction("relist_product", true);
                info!(item_id = item.id, product_id, "Product relisted");
                Ok(item)
            }
            Err(e) => {
                rollback(txn, "relist_product").await;
                Err(e)
            }
        }
    }

    pub async fn items_by_status(
        &self,
        status: InventoryStatus,
    ) -> Result<Vec<inventory_item::Model>, ServiceError> {
        Ok(inventory_item::Entity::find()
            .filter(inventory_item::Column::Status.eq(status))
            .order_by_asc(inventory_item::Column::Id)
            .all(&*self.db)
            .await?)
    }

    pub async fn items_for_product(
        &self,
        product_id: i32,
    ) -> Result<Vec<inventory_item::Model>, ServiceError> {
        Ok(inventory_item::Entity::find()
            .filter(inventory_item::Column::ProductId.eq(product_id))
            .order_by_asc(inventory_item::Column::Id)
            .all(&*self.db)
            .await?)
    }

    async fn active_item(&self, item_id: i32) -> Result<inventory_item::Model, ServiceError> {
        let item = find_item(&*self.db, item_id).await?;
        if !item.status.is_active() {
            return Err(ServiceError::InvalidStatus(format!(
                "Item {} is {} and can no longer be changed",
                item_id, item.status
            )));
        }
        Ok(item)
    }
}

pub(crate) async fn find_item<C: ConnectionTrait>(
    conn: &C,
    item_id: i32,
) -> Result<inventory_item::Model, ServiceError> {
    inventory_item::Entity::find_by_id(item_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Inventory item {} not found", item_id)))
}

/// Validates and persists a status change. Works on a pool or inside a transaction.
pub(crate) async fn apply_transition<C: ConnectionTrait>(
    conn: &C,
    item: inventory_item::Model,
    next: InventoryStatus,
) -> Result<inventory_item::Model, ServiceError> {
    if !item.status.can_transition_to(next) {
        return Err(ServiceError::InvalidStatus(format!(
            "Inventory item {} cannot move from {} to {}",
            item.id, item.status, next
        )));
    }

    let (item_id, previous) = (item.id, item.status);
    let updated = guarded_update(
        conn,
        item_id,
        &[previous],
        inventory_item::ActiveModel {
            status: Set(next),
            ..Default::default()
        },
    )
    .await?;

    debug!(item_id, from = %previous, to = %next, "Inventory status changed");
    Ok(updated)
}

/// Writes `changes` only while the row is still in one of `expected`, so a
/// concurrent status change wins over a stale read instead of being overwritten.
async fn guarded_update<C: ConnectionTrait>(
    conn: &C,
    item_id: i32,
    expected: &[InventoryStatus],
    mut changes: inventory_item::ActiveModel,
) -> Result<inventory_item::Model, ServiceError> {
    changes.last_status_update = Set(Utc::now());
    let result = inventory_item::Entity::update_many()
        .set(changes)
        .filter(inventory_item::Column::Id.eq(item_id))
        .filter(inventory_item::Column::Status.is_in(expected.iter().copied()))
        .exec(conn)
        .await?;

    let item = find_item(conn, item_id).await?;
    if result.rows_affected == 0 {
        warn!(item_id, status = %item.status, "Inventory item changed underneath the update");
        return Err(ServiceError::InvalidStatus(format!(
            "Inventory item {} is now {}",
            item_id, item.status
        )));
    }
    Ok(item)
}

async fn insert_received<C: ConnectionTrait>(
    conn: &C,
    input: ReceiveItemInput,
) -> Result<inventory_item::Model, ServiceError> {
    let product = product::Entity::find_by_id(input.product_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", input.product_id)))?;

    let condition_id = match input.current_condition_id {
        Some(id) => {
            ensure_condition(conn, id).await?;
            id
        }
        None => product.initial_condition_id,
    };

    let item = inventory_item::ActiveModel {
        product_id: Set(product.id),
        sku: Set(input.sku),
        date_received: Set(input
            .date_received
            .unwrap_or_else(|| Utc::now().date_naive())),
        current_condition_id: Set(condition_id),
        listing_price: Set(input.listing_price),
        date_listed: Set(None),
        status: Set(InventoryStatus::Processing),
        location: Set(input.location),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    info!(item_id = item.id, product_id = product.id, "Inventory item received");
    Ok(item)
}

/// The product row is locked first so concurrent relists of one product serialize.
async fn relist_in(
    txn: &DatabaseTransaction,
    product_id: i32,
    input: RelistInput,
) -> Result<inventory_item::Model, ServiceError> {
    product::Entity::find_by_id(product_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

    let open = inventory_item::Entity::find()
        .filter(inventory_item::Column::ProductId.eq(product_id))
        .all(txn)
        .await?
        .into_iter()
        .find(|item| !item.status.is_terminal());

    if let Some(open) = open {
        return Err(ServiceError::InvalidOperation(format!(
            "Product {} still has item {} in {}",
            product_id, open.id, open.status
        )));
    }

    insert_received(
        txn,
        ReceiveItemInput {
            product_id,
            sku: input.sku,
            date_received: None,
            current_condition_id: input.current_condition_id,
            listing_price: input.listing_price,
            location: input.location,
        },
    )
    .await
}

async fn ensure_condition<C: ConnectionTrait>(conn: &C, condition_id: i32) -> Result<(), ServiceError> {
    item_condition::Entity::find_by_id(condition_id)
        .one(conn)
        .await?
        .map(|_| ())
        .ok_or_else(|| ServiceError::NotFound(format!("Condition {} not found", condition_id)))
}
