use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use super::extract::{Card, clean_text, extract, parse_count, parse_discount, parse_price};
use crate::error::ConfigError;
use crate::models::{Category, Record};
use crate::traits::{Locator, SiteSelectors};

/// Why a card did not become a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("card has no product id")]
    MissingId,

    #[error("card {id} has no name element")]
    MissingName { id: String },

    #[error("card {id} has an empty name")]
    EmptyName { id: String },

    #[error("card {id} has no usable price")]
    Unpriced { id: String },
}

/// Builds records from listing cards
#[derive(Debug, Clone)]
pub struct RecordAssembler {
    id_attr: String,
    name: Locator,
    price: Locator,
    discount: Locator,
    rating: Locator,
    review_count: Locator,
}

impl RecordAssembler {
    pub fn new(selectors: &SiteSelectors) -> Result<Self, ConfigError> {
        Ok(Self {
            id_attr: selectors.product_id_attr.clone(),
            name: Locator::parse("name", &selectors.name)?,
            price: Locator::parse("price", &selectors.price)?,
            discount: Locator::parse("discount", &selectors.discount)?,
            rating: Locator::parse("rating", &selectors.rating)?,
            review_count: Locator::parse("review count", &selectors.review_count)?,
        })
    }

    pub fn id_attr(&self) -> &str {
        &self.id_attr
    }

    /// Assembles a record from `card`, or `None` if the card is rejected.
    ///
    /// Rejections are expected (ads, placeholders, unpriced items) and only
    /// logged at debug level.
    pub fn assemble(&self, card: &Card<'_>, category: &Category) -> Option<Record> {
        match self.try_assemble(card, category, Utc::now()) {
            Ok(record) => Some(record),
            Err(rejection) => {
                debug!(%rejection, "skipping card");
                None
            }
        }
    }

    pub fn try_assemble(
        &self,
        card: &Card<'_>,
        category: &Category,
        collected_at: DateTime<Utc>,
    ) -> Result<Record, Rejection> {
        let id = card.token(&self.id_attr).ok_or(Rejection::MissingId)?.to_string();

        let name = extract(card, &self.name, clean_text)
            .into_option()
            .ok_or_else(|| Rejection::MissingName { id: id.clone() })?;

        // Optional fields degrade to their defaults independently
        let price = extract(card, &self.price, parse_price).value;
        let discount_percent = extract(card, &self.discount, parse_discount).value;
        let rating = extract(card, &self.rating, clean_text).value;
        let review_count = extract(card, &self.review_count, parse_count).value;

        if name.is_empty() {
            return Err(Rejection::EmptyName { id });
        }
        if price <= 0.0 {
            return Err(Rejection::Unpriced { id });
        }

        Ok(Record {
            id,
            name,
            price,
            rating,
            review_count,
            discount_percent,
            category: category.slug(),
            collected_at,
        })
    }
}
