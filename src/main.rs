use std::{path::PathBuf, str::FromStr, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use resale_catalog::{
    bulk_load::{BulkLoader, CatalogTable, LoadOptions},
    config::{self, AppConfig},
    db::{self, DbPool},
    reports::{ProductDetailsFilter, SetMode},
    services::AppServices,
};
use serde::Serialize;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize().await?;

    match cli.command {
        Commands::Migrate { reset } => handle_migrate(&context, reset).await?,
        Commands::Load {
            table,
            file,
            delimiter,
            skip_rows,
        } => handle_load(&context, table, file, delimiter, skip_rows, cli.json).await?,
        Commands::OrderHistory { customer } => {
            handle_order_history(&context, customer, cli.json).await?
        }
        Commands::Report {
            kind,
            limit,
            brand,
            category,
        } => {
            let filter = ProductDetailsFilter {
                brand_name: brand,
                category_name: category,
            };
            handle_report(&context, kind, limit, filter, cli.json).await?
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(
    name = "resale-catalog",
    about = "Catalog, checkout and reporting for second-hand luxury fashion",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate {
        #[arg(long, action = ArgAction::SetTrue, help = "Revert every migration first")]
        reset: bool,
    },
    /// Load a delimited file into one table
    Load {
        #[arg(long, value_parser = parse_table, help = "Target table, e.g. inventory_items")]
        table: CatalogTable,
        #[arg(long, help = "Path to the delimited file")]
        file: PathBuf,
        #[arg(long, help = "Field delimiter (defaults to configuration)")]
        delimiter: Option<char>,
        #[arg(long, help = "Leading records to skip (defaults to configuration)")]
        skip_rows: Option<usize>,
    },
    /// Orders of one customer, newest first
    OrderHistory {
        #[arg(long, help = "Customer id")]
        customer: i32,
    },
    /// Run an analytical report
    Report {
        #[arg(value_enum)]
        kind: ReportKind,
        #[arg(long, help = "Row limit for top-N reports (defaults to configuration)")]
        limit: Option<usize>,
        #[arg(long, help = "Brand name filter for product-details")]
        brand: Option<String>,
        #[arg(long, help = "Category name filter for product-details")]
        category: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReportKind {
    CategorySummary,
    LifetimeSpend,
    TopBrands,
    ExpensiveListings,
    Contacts,
    ContactsAll,
    OrderSizes,
    CustomersWithoutOrders,
    OutOfStock,
    Unauthenticated,
    FailedAuthentication,
    SellThrough,
    ProductDetails,
}

fn parse_table(value: &str) -> std::result::Result<CatalogTable, String> {
    CatalogTable::from_str(value).map_err(|_| format!("unknown table '{}'", value))
}

struct CliContext {
    config: AppConfig,
    db: Arc<DbPool>,
    services: AppServices,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;
        if config.auto_migrate {
            db::run_migrations(&db_pool)
                .await
                .context("failed to apply migrations")?;
        }
        let db = Arc::new(db_pool);
        let services = AppServices::new(db.clone());

        Ok(Self {
            config,
            db,
            services,
        })
    }

    fn top_n(&self, limit: Option<usize>) -> usize {
        limit.unwrap_or(self.config.report_top_n as usize)
    }
}

async fn handle_migrate(context: &CliContext, reset: bool) -> Result<()> {
    if reset {
        db::reset_schema(&context.db)
            .await
            .context("failed to revert migrations")?;
    }
    db::run_migrations(&context.db)
        .await
        .context("failed to apply migrations")?;
    println!("Schema is up to date");
    Ok(())
}

async fn handle_load(
    context: &CliContext,
    table: CatalogTable,
    file: PathBuf,
    delimiter: Option<char>,
    skip_rows: Option<usize>,
    json: bool,
) -> Result<()> {
    let mut options = LoadOptions::try_from(&context.config.bulk_load)?;
    if let Some(delimiter) = delimiter {
        if !delimiter.is_ascii() {
            return Err(anyhow!("delimiter must be a single ASCII character"));
        }
        options.delimiter = delimiter as u8;
    }
    if let Some(skip_rows) = skip_rows {
        options.skip_rows = skip_rows;
    }

    let loader = BulkLoader::new(context.db.clone(), options);
    let report = loader
        .load_path(table, &file)
        .await
        .with_context(|| format!("failed to load {}", file.display()))?;

    info!(%table, rows = report.rows_loaded, "Load finished");
    if json {
        print_json(&report)?;
    } else {
        println!(
            "Loaded {} rows into {} ({} skipped)",
            report.rows_loaded, report.table, report.rows_skipped
        );
    }
    Ok(())
}

async fn handle_order_history(context: &CliContext, customer: i32, json: bool) -> Result<()> {
    let history = context
        .services
        .orders
        .customer_order_history(customer)
        .await
        .context("failed to read order history")?;

    print_rows(&history, json, |entry| {
        format!(
            "- Order {} • {} • {} • {}",
            entry.order_id,
            entry.order_date.format("%Y-%m-%d %H:%M"),
            entry.status,
            entry.total_amount
        )
    })
}

async fn handle_report(
    context: &CliContext,
    kind: ReportKind,
    limit: Option<usize>,
    filter: ProductDetailsFilter,
    json: bool,
) -> Result<()> {
    let reports = &context.services.reports;

    match kind {
        ReportKind::CategorySummary => print_rows(&reports.category_summary().await?, json, |r| {
            format!(
                "- {} • {} products • avg {}",
                r.category_name,
                r.product_count,
                r.average_purchase_price
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "n/a".to_string())
            )
        }),
        ReportKind::LifetimeSpend => {
            print_rows(&reports.customer_lifetime_spend().await?, json, |r| {
                format!(
                    "- {} <{}> • {} orders • {}",
                    r.customer_name, r.email, r.order_count, r.total_spent
                )
            })
        }
        ReportKind::TopBrands => print_rows(
            &reports.top_brands_by_units_sold(context.top_n(limit)).await?,
            json,
            |r| format!("- {} • {} units • {}", r.brand_name, r.units_sold, r.revenue),
        ),
        ReportKind::ExpensiveListings => print_rows(
            &reports.most_expensive_listings(context.top_n(limit)).await?,
            json,
            |r| {
                format!(
                    "- {} • {} {} • {} • {}",
                    r.sku, r.brand_name, r.product_name, r.grade, r.listing_price
                )
            },
        ),
        ReportKind::Contacts | ReportKind::ContactsAll => {
            let mode = match kind {
                ReportKind::ContactsAll => SetMode::All,
                _ => SetMode::Distinct,
            };
            print_rows(&reports.contact_directory(mode).await?, json, |r| {
                format!("- {} <{}>", r.name, r.email.as_deref().unwrap_or("-"))
            })
        }
        ReportKind::OrderSizes => print_rows(&reports.orders_by_size().await?, json, |r| {
            format!("- Order {} • {} • {}", r.order_id, r.total_amount, r.size)
        }),
        ReportKind::CustomersWithoutOrders => {
            print_rows(&reports.customers_without_orders().await?, json, |r| {
                format!("- {} {} <{}>", r.customer_id, r.customer_name, r.email)
            })
        }
        ReportKind::OutOfStock => print_rows(&reports.out_of_stock_products().await?, json, |r| {
            format!("- {} {}", r.product_id, r.product_name)
        }),
        ReportKind::Unauthenticated => {
            print_rows(&reports.unauthenticated_products().await?, json, |r| {
                format!("- {} {}", r.product_id, r.product_name)
            })
        }
        ReportKind::FailedAuthentication => {
            print_rows(&reports.failed_authentication_products().await?, json, |r| {
                format!(
                    "- {} {} ({})",
                    r.product_id,
                    r.product_name,
                    r.serial_number.as_deref().unwrap_or("no serial")
                )
            })
        }
        ReportKind::SellThrough => {
            print_rows(&reports.sell_through_by_category().await?, json, |r| {
                format!(
                    "- {} • {}/{} sold • {}",
                    r.category_name,
                    r.sold_items,
                    r.total_items,
                    r.sell_through_pct
                        .map(|p| format!("{}%", p))
                        .unwrap_or_else(|| "n/a".to_string())
                )
            })
        }
        ReportKind::ProductDetails => {
            print_rows(&reports.product_details(&filter).await?, json, |r| {
                format!(
                    "- {} {} • {} • {} • {}",
                    r.product_id, r.product_name, r.brand_name, r.category_name, r.purchase_price
                )
            })
        }
    }
}

fn print_rows<T: Serialize>(rows: &[T], json: bool, render: impl Fn(&T) -> String) -> Result<()> {
    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No rows.");
    }
    for row in rows {
        println!("{}", render(row));
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
