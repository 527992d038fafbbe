//! Rene shop catalog
//!
//! Record types and services for a small shop: categories, products with
//! sizes and photos, customers and their orders, plus product price
//! conversion into other currencies.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod currency;
pub mod db;
pub mod entities;
pub mod errors;
pub mod migrator;
pub mod services;
pub mod storage;

pub use errors::{AppError, ServiceError};
