//! Extraction and pagination engine for bestseller listings

pub mod assemble;
pub mod categories;
pub mod extract;
pub mod walker;

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::error::ConfigError;
use crate::traits::{Locator, PageSource, ScraperConfig};

pub use assemble::{RecordAssembler, Rejection};
pub use extract::{Card, Extracted};
pub use walker::PageHarvest;

/// Randomized pause imposed between page fetches and between categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolitenessDelay {
    min: Duration,
    max: Duration,
}

impl PolitenessDelay {
    pub fn new(min: Duration, max: Duration) -> Self {
        if max < min {
            Self { min: max, max: min }
        } else {
            Self { min, max }
        }
    }

    /// No pause at all. Only reachable through explicit configuration.
    pub fn disabled() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.max.is_zero()
    }

    /// Draws one delay uniformly from the configured range.
    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let millis = rand::rng().random_range(self.min.as_millis()..=self.max.as_millis());
        Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
    }

    pub async fn pause(&self) {
        if self.is_disabled() {
            return;
        }
        tokio::time::sleep(self.sample()).await;
    }
}

/// Request pacing for one scraper
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub delay: PolitenessDelay,
    /// Upper bound on waiting for listing content to render
    pub wait_timeout: Duration,
}

/// Page-level locators, compiled once per scraper
#[derive(Debug, Clone)]
pub(crate) struct PageLocators {
    pub category_group: Locator,
    pub category_link: Locator,
    pub category_fallback: Locator,
    pub product_card: Locator,
    pub next_page: Locator,
    pub next_page_disabled: Locator,
}

/// Walks bestseller categories of one storefront through a page source
#[derive(Clone)]
pub struct BestsellerScraper {
    source: Arc<dyn PageSource>,
    config: ScraperConfig,
    locators: PageLocators,
    assembler: RecordAssembler,
    pacing: Pacing,
    enforce_min_discount: bool,
}

impl BestsellerScraper {
    /// Create a scraper, compiling every selector in `config`.
    ///
    /// # Errors
    /// * `ConfigError::InvalidSelector` - A selector in the profile does not parse
    pub fn new(
        source: Arc<dyn PageSource>,
        config: ScraperConfig,
        pacing: Pacing,
    ) -> Result<Self, ConfigError> {
        let selectors = &config.selectors;
        let locators = PageLocators {
            category_group: Locator::parse("category group", &selectors.category_group)?,
            category_link: Locator::parse("category link", &selectors.category_link)?,
            category_fallback: Locator::parse("category fallback", &selectors.category_fallback)?,
            product_card: Locator::parse("product card", &selectors.product_card)?,
            next_page: Locator::parse("next page", &selectors.next_page)?,
            next_page_disabled: Locator::parse(
                "disabled next page",
                &selectors.next_page_disabled,
            )?,
        };
        let assembler = RecordAssembler::new(selectors)?;

        Ok(Self {
            source,
            config,
            locators,
            assembler,
            pacing,
            enforce_min_discount: false,
        })
    }

    /// Drop records whose discount is below the walk's `min_discount`.
    ///
    /// Off by default: `min_discount` is then carried but not compared.
    #[must_use]
    pub fn with_min_discount_filter(mut self, enforce: bool) -> Self {
        self.enforce_min_discount = enforce;
        self
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    pub fn source(&self) -> &Arc<dyn PageSource> {
        &self.source
    }
}
