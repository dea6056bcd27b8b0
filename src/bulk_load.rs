//! Delimited-file ingestion for every catalog table.
//!
//! Columns are positional and follow the table's column order. A blank leading `id`
//! lets the database assign the key. Each file is loaded inside a single transaction,
//! so one bad record rejects the whole file.

use crate::{
    config::BulkLoadConfig,
    db::{record_transaction, rollback},
    entities::{
        authentication_log, brand, category, customer, inventory_item, item_condition,
        order_item, product, sales_order, supplier, AuthenticationStatus, InventoryStatus,
        OrderStatus, SupplierType,
    },
    errors::ServiceError,
    services::catalog::ensure_acyclic,
};
use chrono::{DateTime, NaiveDate, Utc};
use csv::{ReaderBuilder, StringRecord, Terminator};
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveValue::{self, NotSet},
    DatabaseConnection, DatabaseTransaction, EntityTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Tables accepted by the loader, named as in the schema.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CatalogTable {
    Suppliers,
    Brands,
    Categories,
    Conditions,
    Products,
    AuthenticationLogs,
    InventoryItems,
    Customers,
    SalesOrders,
    OrderItems,
}

/// How a delimited file is split into records and fields.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub delimiter: u8,
    /// `None` reads quote characters literally.
    pub quote: Option<u8>,
    /// `Terminator::CRLF` accepts any of `\r`, `\n` or `\r\n`.
    pub terminator: Terminator,
    /// Leading records to ignore, typically a header row.
    pub skip_rows: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: Some(b'"'),
            terminator: Terminator::CRLF,
            skip_rows: 1,
        }
    }
}

impl LoadOptions {
    fn reader_builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .terminator(self.terminator);
        match self.quote {
            Some(quote) => builder.quoting(true).quote(quote),
            None => builder.quoting(false),
        };
        builder
    }
}

impl TryFrom<&BulkLoadConfig> for LoadOptions {
    type Error = ServiceError;

    fn try_from(cfg: &BulkLoadConfig) -> Result<Self, Self::Error> {
        let delimiter = single_byte(&cfg.delimiter, "delimiter")?;
        let quote = match cfg.quote.as_str() {
            "" => None,
            q => Some(single_byte(q, "quote")?),
        };
        let terminator = match cfg.line_terminator.as_str() {
            "" | "\r\n" => Terminator::CRLF,
            t => Terminator::Any(single_byte(t, "line_terminator")?),
        };
        Ok(Self {
            delimiter,
            quote,
            terminator,
            skip_rows: cfg.skip_rows,
        })
    }
}

fn single_byte(value: &str, field: &str) -> Result<u8, ServiceError> {
    match value.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(ServiceError::ConfigError(format!(
            "bulk_load.{} must be a single ASCII character, got {:?}",
            field, value
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub table: CatalogTable,
    pub rows_loaded: u64,
    pub rows_skipped: u64,
}

pub struct BulkLoader {
    db: Arc<DatabaseConnection>,
    options: LoadOptions,
}

impl BulkLoader {
    pub fn new(db: Arc<DatabaseConnection>, options: LoadOptions) -> Self {
        Self { db, options }
    }

    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn load_path(
        &self,
        table: CatalogTable,
        path: impl AsRef<Path>,
    ) -> Result<LoadReport, ServiceError> {
        let reader = self.options.reader_builder().from_path(path.as_ref())?;
        let records = read_records(reader)?;
        self.load_records(table, records).await
    }

    #[instrument(skip(self, reader))]
    pub async fn load_reader<R: io::Read>(
        &self,
        table: CatalogTable,
        reader: R,
    ) -> Result<LoadReport, ServiceError> {
        let records = read_records(self.options.reader_builder().from_reader(reader))?;
        self.load_records(table, records).await
    }

    async fn load_records(
        &self,
        table: CatalogTable,
        records: Vec<StringRecord>,
    ) -> Result<LoadReport, ServiceError> {
        let start = Instant::now();
        let skip = self.options.skip_rows.min(records.len());
        let txn = self.db.begin().await?;

        if let Err(e) = insert_all(&txn, table, &records, skip).await {
            rollback(txn, "bulk_load").await;
            counter!("resale_catalog_bulk_load.rejected_files", 1, "table" => table.to_string());
            return Err(e);
        }

        txn.commit().await?;
        record_transaction("bulk_load", true);

        let report = LoadReport {
            table,
            rows_loaded: (records.len() - skip) as u64,
            rows_skipped: skip as u64,
        };
        counter!("resale_catalog_bulk_load.rows", report.rows_loaded, "table" => table.to_string());
        histogram!("resale_catalog_bulk_load.duration", start.elapsed().as_secs_f64());
        info!(
            %table,
            rows_loaded = report.rows_loaded,
            rows_skipped = report.rows_skipped,
            "Bulk load committed"
        );
        Ok(report)
    }
}

async fn insert_all(
    txn: &DatabaseTransaction,
    table: CatalogTable,
    records: &[StringRecord],
    skip: usize,
) -> Result<(), ServiceError> {
    for (index, record) in records.iter().enumerate().skip(skip) {
        if let Err(e) = insert_record(txn, table, record).await {
            warn!(
                %table,
                record = index + 1,
                constraint = e.is_constraint_violation(),
                "Rejecting bulk load file"
            );
            return Err(ServiceError::BulkLoadError(format!(
                "{} record {}: {}",
                table,
                index + 1,
                e
            )));
        }
    }

    // Parent links arrive as plain ids, so the tree is checked once every row is in
    if table == CatalogTable::Categories {
        ensure_acyclic(txn).await.map_err(|e| {
            warn!(%table, error = %e, "Rejecting bulk load file");
            ServiceError::BulkLoadError(format!("{}: {}", table, e))
        })?;
    }
    Ok(())
}

fn read_records<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<StringRecord>, ServiceError> {
    reader
        .records()
        .enumerate()
        .map(|(index, record)| {
            record.map_err(|e| {
                ServiceError::BulkLoadError(format!("record {}: {}", index + 1, e))
            })
        })
        .collect()
}

fn key(id: Option<i32>) -> ActiveValue<i32> {
    match id {
        Some(id) => Set(id),
        None => NotSet,
    }
}

async fn insert_record(
    txn: &DatabaseTransaction,
    table: CatalogTable,
    record: &StringRecord,
) -> Result<(), ServiceError> {
    match table {
        CatalogTable::Suppliers => {
            let r: SupplierRecord = record.deserialize(None)?;
            supplier::Entity::insert(supplier::ActiveModel {
                id: key(r.id),
                name: Set(r.name),
                supplier_type: Set(r.supplier_type),
                contact_name: Set(r.contact_name),
                contact_email: Set(r.contact_email),
                phone: Set(r.phone),
                country: Set(r.country),
                city: Set(r.city),
                registration_date: Set(r.registration_date),
            })
            .exec(txn)
            .await?;
        }
        CatalogTable::Brands => {
            let r: BrandRecord = record.deserialize(None)?;
            brand::Entity::insert(brand::ActiveModel {
                id: key(r.id),
                name: Set(r.name),
                country_of_origin: Set(r.country_of_origin),
            })
            .exec(txn)
            .await?;
        }
        CatalogTable::Categories => {
            let r: CategoryRecord = record.deserialize(None)?;
            category::Entity::insert(category::ActiveModel {
                id: key(r.id),
                name: Set(r.name),
                parent_id: Set(r.parent_id),
            })
            .exec(txn)
            .await?;
        }
        CatalogTable::Conditions => {
            let r: ConditionRecord = record.deserialize(None)?;
            item_condition::Entity::insert(item_condition::ActiveModel {
                id: key(r.id),
                label: Set(r.label),
                description: Set(r.description),
            })
            .exec(txn)
            .await?;
        }
        CatalogTable::Products => {
            let r: ProductRecord = record.deserialize(None)?;
            product::Entity::insert(product::ActiveModel {
                id: key(r.id),
                brand_id: Set(r.brand_id),
                category_id: Set(r.category_id),
                supplier_id: Set(r.supplier_id),
                initial_condition_id: Set(r.initial_condition_id),
                name: Set(r.name),
                material: Set(r.material),
                color: Set(r.color),
                size: Set(r.size),
                serial_number: Set(r.serial_number),
                purchase_date: Set(r.purchase_date),
                purchase_price: Set(r.purchase_price),
                acquisition_notes: Set(r.acquisition_notes),
            })
            .exec(txn)
            .await?;
        }
        CatalogTable::AuthenticationLogs => {
            let r: AuthenticationLogRecord = record.deserialize(None)?;
            authentication_log::Entity::insert(authentication_log::ActiveModel {
                id: key(r.id),
                product_id: Set(r.product_id),
                authentication_date: Set(r.authentication_date),
                authenticator: Set(r.authenticator),
                status: Set(r.status),
                cost: Set(r.cost),
                notes: Set(r.notes),
            })
            .exec(txn)
            .await?;
        }
        CatalogTable::InventoryItems => {
            let r: InventoryItemRecord = record.deserialize(None)?;
            inventory_item::Entity::insert(inventory_item::ActiveModel {
                id: key(r.id),
                product_id: Set(r.product_id),
                sku: Set(r.sku),
                date_received: Set(r.date_received),
                current_condition_id: Set(r.current_condition_id),
                listing_price: Set(r.listing_price),
                date_listed: Set(r.date_listed),
                status: Set(r.status),
                location: Set(r.location),
                last_status_update: Set(r.last_status_update.unwrap_or_else(Utc::now)),
            })
            .exec(txn)
            .await?;
        }
        CatalogTable::Customers => {
            let r: CustomerRecord = record.deserialize(None)?;
            customer::Entity::insert(customer::ActiveModel {
                id: key(r.id),
                first_name: Set(r.first_name),
                last_name: Set(r.last_name),
                email: Set(r.email.trim().to_lowercase()),
                phone: Set(r.phone),
                registration_date: Set(r.registration_date),
                last_login: Set(r.last_login),
            })
            .exec(txn)
            .await?;
        }
        CatalogTable::SalesOrders => {
            let r: SalesOrderRecord = record.deserialize(None)?;
            sales_order::Entity::insert(sales_order::ActiveModel {
                id: key(r.id),
                customer_id: Set(r.customer_id),
                order_date: Set(r.order_date),
                total_amount: Set(r.total_amount),
                shipping_address: Set(r.shipping_address),
                billing_address: Set(r.billing_address),
                shipping_cost: Set(r.shipping_cost),
                status: Set(r.status),
                tracking_number: Set(r.tracking_number),
            })
            .exec(txn)
            .await?;
        }
        CatalogTable::OrderItems => {
            let r: OrderItemRecord = record.deserialize(None)?;
            order_item::Entity::insert(order_item::ActiveModel {
                id: key(r.id),
                sales_order_id: Set(r.sales_order_id),
                inventory_item_id: Set(r.inventory_item_id),
                selling_price: Set(r.selling_price),
                discount_amount: Set(r.discount_amount),
            })
            .exec(txn)
            .await?;
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct SupplierRecord {
    id: Option<i32>,
    name: String,
    supplier_type: SupplierType,
    contact_name: Option<String>,
    contact_email: Option<String>,
    phone: Option<String>,
    country: Option<String>,
    city: Option<String>,
    registration_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct BrandRecord {
    id: Option<i32>,
    name: String,
    country_of_origin: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CategoryRecord {
    id: Option<i32>,
    name: String,
    parent_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ConditionRecord {
    id: Option<i32>,
    label: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProductRecord {
    id: Option<i32>,
    brand_id: i32,
    category_id: i32,
    supplier_id: i32,
    initial_condition_id: i32,
    name: String,
    material: Option<String>,
    color: Option<String>,
    size: Option<String>,
    serial_number: Option<String>,
    purchase_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::str")]
    purchase_price: Decimal,
    acquisition_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthenticationLogRecord {
    id: Option<i32>,
    product_id: i32,
    authentication_date: NaiveDate,
    authenticator: String,
    status: AuthenticationStatus,
    #[serde(with = "rust_decimal::serde::str_option")]
    cost: Option<Decimal>,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InventoryItemRecord {
    id: Option<i32>,
    product_id: i32,
    sku: String,
    date_received: NaiveDate,
    current_condition_id: i32,
    #[serde(with = "rust_decimal::serde::str_option")]
    listing_price: Option<Decimal>,
    date_listed: Option<NaiveDate>,
    status: InventoryStatus,
    location: Option<String>,
    /// Blank means "now".
    last_status_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct CustomerRecord {
    id: Option<i32>,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    registration_date: NaiveDate,
    last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct SalesOrderRecord {
    id: Option<i32>,
    customer_id: i32,
    order_date: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::str")]
    total_amount: Decimal,
    shipping_address: Option<String>,
    billing_address: Option<String>,
    #[serde(with = "rust_decimal::serde::str")]
    shipping_cost: Decimal,
    status: OrderStatus,
    tracking_number: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrderItemRecord {
    id: Option<i32>,
    sales_order_id: i32,
    inventory_item_id: i32,
    #[serde(with = "rust_decimal::serde::str")]
    selling_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    discount_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn table_names_round_trip_as_snake_case() {
        assert_eq!(
            CatalogTable::from_str("authentication_logs").unwrap(),
            CatalogTable::AuthenticationLogs
        );
        assert_eq!(CatalogTable::OrderItems.to_string(), "order_items");
        assert!(CatalogTable::from_str("widgets").is_err());
    }

    #[test]
    fn options_from_config() {
        let cfg = BulkLoadConfig {
            delimiter: "|".into(),
            quote: String::new(),
            line_terminator: ";".into(),
            skip_rows: 0,
        };
        let options = LoadOptions::try_from(&cfg).unwrap();
        assert_eq!(options.delimiter, b'|');
        assert_eq!(options.quote, None);
        assert!(matches!(options.terminator, Terminator::Any(b';')));
        assert_eq!(options.skip_rows, 0);

        let defaults = LoadOptions::try_from(&BulkLoadConfig::default()).unwrap();
        let built_in = LoadOptions::default();
        assert_eq!(defaults.delimiter, built_in.delimiter);
        assert_eq!(defaults.quote, built_in.quote);
        assert!(matches!(defaults.terminator, Terminator::CRLF));
        assert_eq!(defaults.skip_rows, built_in.skip_rows);
    }

    #[test]
    fn options_reject_multibyte_delimiter() {
        let cfg = BulkLoadConfig {
            delimiter: "::".into(),
            ..Default::default()
        };
        assert!(matches!(
            LoadOptions::try_from(&cfg),
            Err(ServiceError::ConfigError(_))
        ));
    }

    #[test]
    fn blank_id_and_optional_decimal_deserialize_as_none() {
        let record = StringRecord::from(vec![
            "", "3", "SKU-1", "2024-02-01", "2", "", "", "Processing", "", "",
        ]);
        let r: InventoryItemRecord = record.deserialize(None).unwrap();
        assert_eq!(r.id, None);
        assert_eq!(r.listing_price, None);
        assert_eq!(r.status, InventoryStatus::Processing);
        assert!(r.last_status_update.is_none());
    }
}
