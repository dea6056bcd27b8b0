use crate::{
    entities::{
        authentication_log, brand, category, customer,
        inventory_item::{self, InventoryStatus},
        item_condition, order_item, product, product_detail,
        sales_order::{self, OrderStatus},
        supplier,
    },
    errors::ServiceError,
    reports::{
        percentage, BrandSales, CategorySummary, ConditionGrade, ContactEntry, CustomerContact,
        CustomerSpend, LabeledOrder, ListingSummary, OrderSize, ProductDetailsFilter,
        ProductSummary, SellThrough, SetMode,
    },
};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Alias, Expr, Query, UnionType},
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Read-only analytics over the catalog. Aggregation happens in memory on loaded rows.
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DatabaseConnection>,
}

impl ReportService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Product count and average purchase price per category, empty categories included.
    #[instrument(skip(self))]
    pub async fn category_summary(&self) -> Result<Vec<CategorySummary>, ServiceError> {
        let categories = category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?;
        let products = product::Entity::find().all(&*self.db).await?;

        let mut totals: HashMap<i32, (u64, Decimal)> = HashMap::new();
        for p in &products {
            let entry = totals.entry(p.category_id).or_insert((0, Decimal::ZERO));
            entry.0 += 1;
            entry.1 += p.purchase_price;
        }

        Ok(categories
            .into_iter()
            .map(|c| {
                let (count, sum) = totals.get(&c.id).copied().unwrap_or((0, Decimal::ZERO));
                CategorySummary {
                    category_id: c.id,
                    category_name: c.name,
                    product_count: count,
                    average_purchase_price: (count > 0)
                        .then(|| (sum / Decimal::from(count)).round_dp(2)),
                }
            })
            .collect())
    }

    /// Orders and spend per customer, cancelled orders excluded, highest spend first.
    #[instrument(skip(self))]
    pub async fn customer_lifetime_spend(&self) -> Result<Vec<CustomerSpend>, ServiceError> {
        let orders = sales_order::Entity::find()
            .filter(sales_order::Column::Status.ne(OrderStatus::Cancelled))
            .all(&*self.db)
            .await?;

        let mut spend: HashMap<i32, (u64, Decimal)> = HashMap::new();
        for o in &orders {
            let entry = spend.entry(o.customer_id).or_insert((0, Decimal::ZERO));
            entry.0 += 1;
            entry.1 += o.total_amount;
        }

        let customers = customer::Entity::find().all(&*self.db).await?;
        let mut rows: Vec<CustomerSpend> = customers
            .into_iter()
            .filter_map(|c| {
                let (order_count, total_spent) = spend.get(&c.id).copied()?;
                Some(CustomerSpend {
                    customer_id: c.id,
                    customer_name: c.full_name(),
                    email: c.email,
                    order_count,
                    total_spent,
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            b.total_spent
                .cmp(&a.total_spent)
                .then(a.customer_id.cmp(&b.customer_id))
        });
        Ok(rows)
    }

    /// Brands ranked by units sold on orders that were neither cancelled nor returned.
    #[instrument(skip(self))]
    pub async fn top_brands_by_units_sold(&self, limit: usize) -> Result<Vec<BrandSales>, ServiceError> {
        let lines = order_item::Entity::find()
            .find_also_related(sales_order::Entity)
            .all(&*self.db)
            .await?;
        let items = by_id(inventory_item::Entity::find().all(&*self.db).await?, |i| i.id);
        let products = by_id(product::Entity::find().all(&*self.db).await?, |p| p.id);
        let brands = by_id(brand::Entity::find().all(&*self.db).await?, |b| b.id);

        let mut sales: HashMap<i32, (u64, Decimal)> = HashMap::new();
        for (line, order) in lines {
            let counts = matches!(
                order.map(|o| o.status),
                Some(status) if status != OrderStatus::Cancelled && status != OrderStatus::Returned
            );
            if !counts {
                continue;
            }
            let Some(product) = items
                .get(&line.inventory_item_id)
                .and_then(|item| products.get(&item.product_id))
            else {
                continue;
            };
            let entry = sales.entry(product.brand_id).or_insert((0, Decimal::ZERO));
            entry.0 += 1;
            entry.1 += line.net_price();
        }

        let mut rows: Vec<BrandSales> = sales
            .into_iter()
            .filter_map(|(brand_id, (units_sold, revenue))| {
                brands.get(&brand_id).map(|b| BrandSales {
                    brand_id,
                    brand_name: b.name.clone(),
                    units_sold,
                    revenue,
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            b.units_sold
                .cmp(&a.units_sold)
                .then(b.revenue.cmp(&a.revenue))
                .then(a.brand_name.cmp(&b.brand_name))
        });
        rows.truncate(limit);
        Ok(rows)
    }

    /// In-stock items with the highest listing prices.
    #[instrument(skip(self))]
    pub async fn most_expensive_listings(
        &self,
        limit: usize,
    ) -> Result<Vec<ListingSummary>, ServiceError> {
        let items = inventory_item::Entity::find()
            .filter(inventory_item::Column::Status.eq(InventoryStatus::InStock))
            .filter(inventory_item::Column::ListingPrice.is_not_null())
            .find_also_related(product::Entity)
            .all(&*self.db)
            .await?;
        let brands = by_id(brand::Entity::find().all(&*self.db).await?, |b| b.id);
        let conditions = by_id(item_condition::Entity::find().all(&*self.db).await?, |c| c.id);

        let mut rows: Vec<ListingSummary> = items
            .into_iter()
            .filter_map(|(item, product)| {
                let product = product?;
                let listing_price = item.listing_price?;
                let condition = conditions
                    .get(&item.current_condition_id)
                    .map(|c| c.label.clone())
                    .unwrap_or_default();
                Some(ListingSummary {
                    inventory_item_id: item.id,
                    sku: item.sku,
                    brand_name: brands
                        .get(&product.brand_id)
                        .map(|b| b.name.clone())
                        .unwrap_or_default(),
                    product_name: product.name,
                    listing_price,
                    status: item.status,
                    grade: ConditionGrade::for_label(&condition),
                    condition,
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            b.listing_price
                .cmp(&a.listing_price)
                .then(a.inventory_item_id.cmp(&b.inventory_item_id))
        });
        rows.truncate(limit);
        Ok(rows)
    }

    /// Customer and supplier contacts combined with `UNION` or `UNION ALL`.
    #[instrument(skip(self))]
    pub async fn contact_directory(&self, mode: SetMode) -> Result<Vec<ContactEntry>, ServiceError> {
        let mut customers = Query::select();
        customers
            .expr_as(
                Expr::cust("first_name || ' ' || last_name"),
                Alias::new("name"),
            )
            .expr_as(Expr::col(customer::Column::Email), Alias::new("email"))
            .from(customer::Entity);

        let mut suppliers = Query::select();
        suppliers
            .expr_as(Expr::col(supplier::Column::Name), Alias::new("name"))
            .expr_as(Expr::col(supplier::Column::ContactEmail), Alias::new("email"))
            .from(supplier::Entity);

        let union_type = match mode {
            SetMode::Distinct => UnionType::Distinct,
            SetMode::All => UnionType::All,
        };
        customers.union(union_type, suppliers);

        let backend = self.db.get_database_backend();
        let mut rows = ContactEntry::find_by_statement(backend.build(&customers))
            .all(&*self.db)
            .await?;
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.email.cmp(&b.email)));

        debug!(rows = rows.len(), ?mode, "Contact directory built");
        Ok(rows)
    }

    /// Every order labeled Small, Medium or Large by its total.
    #[instrument(skip(self))]
    pub async fn orders_by_size(&self) -> Result<Vec<LabeledOrder>, ServiceError> {
        let ladder = OrderSize::ladder();
        Ok(sales_order::Entity::find()
            .order_by_asc(sales_order::Column::Id)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|o| LabeledOrder {
                order_id: o.id,
                customer_id: o.customer_id,
                order_date: o.order_date,
                total_amount: o.total_amount,
                status: o.status,
                size: ladder.label(o.total_amount),
            })
            .collect())
    }

    /// Customers that never placed an order.
    #[instrument(skip(self))]
    pub async fn customers_without_orders(&self) -> Result<Vec<CustomerContact>, ServiceError> {
        Ok(customer::Entity::find()
            .left_join(sales_order::Entity)
            .filter(sales_order::Column::Id.is_null())
            .order_by_asc(customer::Column::Id)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|c| CustomerContact {
                customer_id: c.id,
                customer_name: c.full_name(),
                email: c.email,
            })
            .collect())
    }

    /// Products with no inventory item currently in stock.
    #[instrument(skip(self))]
    pub async fn out_of_stock_products(&self) -> Result<Vec<ProductSummary>, ServiceError> {
        let in_stock = Query::select()
            .column(inventory_item::Column::ProductId)
            .from(inventory_item::Entity)
            .and_where(inventory_item::Column::Status.eq(InventoryStatus::InStock))
            .to_owned();

        Ok(product::Entity::find()
            .filter(product::Column::Id.not_in_subquery(in_stock))
            .order_by_asc(product::Column::Id)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(ProductSummary::from)
            .collect())
    }

    /// Products that were never sent for authentication.
    #[instrument(skip(self))]
    pub async fn unauthenticated_products(&self) -> Result<Vec<ProductSummary>, ServiceError> {
        Ok(product::Entity::find()
            .left_join(authentication_log::Entity)
            .filter(authentication_log::Column::Id.is_null())
            .order_by_asc(product::Column::Id)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(ProductSummary::from)
            .collect())
    }

    /// Products whose most recent authentication was Counterfeit or UnableToVerify.
    #[instrument(skip(self))]
    pub async fn failed_authentication_products(
        &self,
    ) -> Result<Vec<ProductSummary>, ServiceError> {
        let logs = authentication_log::Entity::find()
            .order_by_asc(authentication_log::Column::AuthenticationDate)
            .order_by_asc(authentication_log::Column::Id)
            .all(&*self.db)
            .await?;

        // Later rows overwrite earlier ones, leaving the latest outcome per product
        let mut latest = HashMap::new();
        for log in logs {
            latest.insert(log.product_id, log.status);
        }

        let products = product::Entity::find()
            .order_by_asc(product::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(products
            .into_iter()
            .filter(|p| latest.get(&p.id).is_some_and(|s| s.is_failure()))
            .map(ProductSummary::from)
            .collect())
    }

    /// Share of inventory items sold per category.
    #[instrument(skip(self))]
    pub async fn sell_through_by_category(&self) -> Result<Vec<SellThrough>, ServiceError> {
        let categories = category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?;
        let products = by_id(product::Entity::find().all(&*self.db).await?, |p| p.id);
        let items = inventory_item::Entity::find().all(&*self.db).await?;

        let mut counts: HashMap<i32, (u64, u64)> = HashMap::new();
        for item in &items {
            let Some(product) = products.get(&item.product_id) else {
                continue;
            };
            let entry = counts.entry(product.category_id).or_insert((0, 0));
            entry.0 += 1;
            if item.status == InventoryStatus::Sold {
                entry.1 += 1;
            }
        }

        Ok(categories
            .into_iter()
            .map(|c| {
                let (total_items, sold_items) = counts.get(&c.id).copied().unwrap_or((0, 0));
                SellThrough {
                    category_id: c.id,
                    category_name: c.name,
                    total_items,
                    sold_items,
                    sell_through_pct: percentage(sold_items, total_items),
                }
            })
            .collect())
    }

    /// Rows of the `product_details` view, re-read on every call.
    #[instrument(skip(self))]
    pub async fn product_details(
        &self,
        filter: &ProductDetailsFilter,
    ) -> Result<Vec<product_detail::Model>, ServiceError> {
        let mut query = product_detail::Entity::find();
        if let Some(brand_name) = &filter.brand_name {
            query = query.filter(product_detail::Column::BrandName.eq(brand_name.as_str()));
        }
        if let Some(category_name) = &filter.category_name {
            query = query.filter(product_detail::Column::CategoryName.eq(category_name.as_str()));
        }
        Ok(query
            .order_by_asc(product_detail::Column::ProductId)
            .all(&*self.db)
            .await?)
    }
}

impl From<product::Model> for ProductSummary {
    fn from(p: product::Model) -> Self {
        Self {
            product_id: p.id,
            product_name: p.name,
            serial_number: p.serial_number,
        }
    }
}

fn by_id<T>(rows: Vec<T>, key: impl Fn(&T) -> i32) -> HashMap<i32, T> {
    rows.into_iter().map(|row| (key(&row), row)).collect()
}
