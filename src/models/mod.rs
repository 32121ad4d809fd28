//! Data models for bestseller categories and scraped product records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bestseller category discovered on the storefront landing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub url: String,
}

impl Category {
    /// Slug stamped onto every record harvested from this category.
    ///
    /// This is the trailing path segment of the listing URL, percent-decoded.
    /// Query strings and fragments are ignored.
    pub fn slug(&self) -> String {
        let path = self
            .url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');
        let segment = path.rsplit('/').next().unwrap_or_default();

        urlencoding::decode(segment).map_or_else(|_| segment.to_string(), |s| s.into_owned())
    }
}

/// A product accepted from a bestseller listing.
///
/// Field order is the persisted column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub rating: String,
    pub review_count: u64,
    pub discount_percent: u32,
    pub category: String,
    pub collected_at: DateTime<Utc>,
}

/// Column headers written by the tabular sink, in persisted order
pub const RECORD_COLUMNS: [&str; 8] = [
    "id",
    "name",
    "price",
    "rating",
    "review_count",
    "discount_percent",
    "category",
    "collected_at",
];
