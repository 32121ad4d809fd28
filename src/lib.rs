//! Bestseller listing scraper: category discovery, paginated extraction and
//! incremental persistence for an e-commerce storefront.

pub mod bestseller_finder;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod scraper;
pub mod scrapers;
pub mod session;
pub mod sink;
pub mod traits;

pub use bestseller_finder::{BestsellerFinder, RunSummary};
pub use error::{ConfigError, FetchError, RunError};
pub use models::{Category, Record};
