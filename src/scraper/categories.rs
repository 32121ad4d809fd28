//! Category discovery on the bestseller landing page

use scraper::{ElementRef, Html};
use tracing::{error, info, warn};

use super::BestsellerScraper;
use super::extract::{clean_text, element_text};
use crate::models::Category;

/// Label of the expander link that sits among real categories
const SEE_MORE_LABEL: &str = "See More";

/// Whether a candidate link is a real bestseller category
pub fn is_category(name: &str, url: &str, marker: &str) -> bool {
    !name.is_empty() && !url.is_empty() && url.contains(marker) && name != SEE_MORE_LABEL
}

impl BestsellerScraper {
    /// Finds up to `limit` categories on the landing page.
    ///
    /// Group containers are tried first; the looser tree-item pattern is only
    /// used when they yield nothing. An empty result is returned rather than
    /// an error so the caller decides whether the run can continue.
    pub async fn discover(&self, limit: usize) -> Vec<Category> {
        info!(url = %self.config.bestseller_url, "navigating to bestseller landing page");

        if let Err(e) = self.source.get(&self.config.bestseller_url).await {
            error!(error = %e, "failed to load bestseller landing page");
            return Vec::new();
        }

        let timeout = self.pacing.wait_timeout;

        let primary = match self
            .source
            .wait_until_present(&self.locators.category_group, timeout)
            .await
        {
            Ok(html) => self.primary_categories(&html, limit),
            Err(e) => {
                warn!(error = %e, "category groups did not appear");
                Vec::new()
            }
        };
        if !primary.is_empty() {
            info!(count = primary.len(), "discovered categories");
            return primary;
        }

        info!("falling back to tree-item category links");
        let fallback = match self
            .source
            .wait_until_present(&self.locators.category_fallback, timeout)
            .await
        {
            Ok(html) => self.fallback_categories(&html, limit),
            Err(e) => {
                warn!(error = %e, "fallback category links did not appear");
                Vec::new()
            }
        };

        if fallback.is_empty() {
            error!("no categories found with any method");
        } else {
            info!(count = fallback.len(), "discovered categories");
        }
        fallback
    }

    /// First link of each category group container.
    pub fn primary_categories(&self, html: &str, limit: usize) -> Vec<Category> {
        let document = Html::parse_document(html);

        document
            .select(self.locators.category_group.selector())
            .filter_map(|group| group.select(self.locators.category_link.selector()).next())
            .filter_map(|link| self.candidate(link))
            .take(limit)
            .collect()
    }

    /// Every link matching the loose fallback pattern.
    pub fn fallback_categories(&self, html: &str, limit: usize) -> Vec<Category> {
        let document = Html::parse_document(html);

        document
            .select(self.locators.category_fallback.selector())
            .filter_map(|link| self.candidate(link))
            .take(limit)
            .collect()
    }

    fn candidate(&self, link: ElementRef<'_>) -> Option<Category> {
        let name = clean_text(&element_text(link));
        let url = link
            .value()
            .attr("href")
            .and_then(|href| self.config.absolute_url(href.trim()))
            .unwrap_or_default();

        if !is_category(&name, &url, &self.config.bestseller_marker) {
            return None;
        }

        info!(category = %name, "added category");
        Some(Category { name, url })
    }
}
