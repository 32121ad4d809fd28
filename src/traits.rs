//! Traits and interfaces for storefront-agnostic scraping

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Url;
use scraper::{Html, Selector};
use tokio::time::Instant;

use crate::error::{ConfigError, FetchError};
use crate::models::Record;

/// How often the default wait re-reads the current page
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Configuration for a storefront's bestseller pages
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Display name for the storefront
    pub name: String,
    /// Base URL for the storefront, used to resolve relative links
    pub base_url: String,
    /// Landing page listing the bestseller categories
    pub bestseller_url: String,
    /// Path fragment every category listing URL must contain
    pub bestseller_marker: String,
    /// Query parameter carrying the 1-based page number
    pub page_param: String,
    /// Sign-in entry page
    pub sign_in_url: String,
    /// Form field names used by the sign-in flow
    pub email_field: String,
    pub password_field: String,
    /// CSS selectors for extracting data
    pub selectors: SiteSelectors,
}

impl ScraperConfig {
    /// Builds the URL of page `page` of a category listing.
    ///
    /// An existing page parameter is replaced rather than duplicated.
    pub fn page_url(&self, category_url: &str, page: u32) -> String {
        let Ok(mut url) = Url::parse(category_url) else {
            return format!("{category_url}?{}={page}", self.page_param);
        };

        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| *key != self.page_param)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair(&self.page_param, &page.to_string());

        url.to_string()
    }

    /// Resolves a possibly relative link against the storefront base URL.
    pub fn absolute_url(&self, href: &str) -> Option<String> {
        if href.starts_with("http") {
            return Some(href.to_string());
        }
        let base = Url::parse(&self.base_url).ok()?;
        base.join(href).ok().map(String::from)
    }
}

/// CSS selectors for the parts of a bestseller page
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    /// Category group container on the landing page
    pub category_group: String,
    /// Link within a category group container
    pub category_link: String,
    /// Looser category link pattern used when the group containers yield nothing
    pub category_fallback: String,
    /// Container selector for individual product cards
    pub product_card: String,
    /// Attribute on the card carrying the stable product id
    pub product_id_attr: String,
    /// Name selector within a card
    pub name: String,
    /// Price selector within a card
    pub price: String,
    /// Discount selector within a card
    pub discount: String,
    /// Rating selector within a card
    pub rating: String,
    /// Review count selector within a card
    pub review_count: String,
    /// Next page control
    pub next_page: String,
    /// Next page control in its disabled state
    pub next_page_disabled: String,
    /// Account link that opens the sign-in flow
    pub sign_in_link: String,
    /// Sign-in form on the credential pages
    pub sign_in_form: String,
    /// Greeting shown only to signed-in sessions
    pub account_greeting: String,
}

/// A compiled CSS selector that remembers its source text
#[derive(Debug, Clone)]
pub struct Locator {
    css: String,
    selector: Selector,
}

impl Locator {
    /// Compiles `css`, naming `field` in the error if it is not a valid selector.
    pub fn parse(field: &'static str, css: &str) -> Result<Self, ConfigError> {
        let selector = Selector::parse(css).map_err(|e| ConfigError::InvalidSelector {
            field,
            reason: format!("{e:?}"),
        })?;

        Ok(Self {
            css: css.to_string(),
            selector,
        })
    }

    pub fn css(&self) -> &str {
        &self.css
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Whether at least one element in `html` matches.
    pub fn matches_in(&self, html: &str) -> bool {
        let document = Html::parse_document(html);
        document.select(&self.selector).next().is_some()
    }
}

/// Page-fetching capability consumed by the scraping core.
///
/// Implemented once per environment: a live HTTP session, or a test double
/// serving canned documents.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Navigates to `url` and returns the markup as first rendered
    async fn get(&self, url: &str) -> Result<String, FetchError>;

    /// Markup of the current page as rendered right now
    async fn current(&self) -> Result<String, FetchError>;

    /// Blocks until `locator` matches on the current page or `timeout` elapses.
    ///
    /// # Returns
    /// * `Result<String, FetchError>` - The ready markup, or `WaitTimeout`
    async fn wait_until_present(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<String, FetchError> {
        let started = Instant::now();

        loop {
            let html = self.current().await?;
            if locator.matches_in(&html) {
                return Ok(html);
            }

            let waited = started.elapsed();
            if waited >= timeout {
                return Err(FetchError::WaitTimeout {
                    locator: locator.css().to_string(),
                    waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                });
            }

            tokio::time::sleep(WAIT_POLL_INTERVAL.min(timeout - waited)).await;
        }
    }
}

/// Login capability gating whether a run may scrape at all
#[async_trait]
pub trait SessionGate: Send + Sync {
    /// Attempts to sign in; never surfaces the credentials or an error
    async fn login(&self, email: &str, password: &str) -> bool;

    /// Whether the current session is signed in
    async fn is_authenticated(&self) -> bool;
}

/// Incremental persistence for the run's accumulated records
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Short label used in logs
    fn name(&self) -> &str;

    /// Persists `records`, the full accumulated sequence so far.
    ///
    /// Repeated calls with a growing sequence must never duplicate rows.
    async fn flush(&mut self, records: &[Record]) -> Result<()>;
}
