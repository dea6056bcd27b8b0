//! Entity definitions for the catalog schema.

pub mod authentication_log;
pub mod brand;
pub mod category;
pub mod customer;
pub mod inventory_item;
pub mod item_condition;
pub mod order_item;
pub mod product;
pub mod product_detail;
pub mod sales_order;
pub mod supplier;

pub use authentication_log::AuthenticationStatus;
pub use inventory_item::InventoryStatus;
pub use sales_order::OrderStatus;
pub use supplier::SupplierType;
