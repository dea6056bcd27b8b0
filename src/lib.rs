//! Resale catalog library
//!
//! Schema, services and reports for a second-hand luxury fashion catalog.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod bulk_load;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod reports;
pub mod services;

pub use errors::ServiceError;
pub use services::AppServices;
