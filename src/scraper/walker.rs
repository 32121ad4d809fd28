//! Pagination over one category's product grid

use scraper::Html;
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::BestsellerScraper;
use super::extract::Card;
use crate::error::FetchError;
use crate::models::{Category, Record};
use crate::sink::RunAccumulator;

/// Safety limit to prevent endless pagination on a misbehaving storefront
const MAX_PAGES: u32 = 400;

/// What one rendered page yielded
#[derive(Debug, Default)]
pub struct PageHarvest {
    /// Cards carrying a product id; placeholders are not counted
    pub cards: usize,
    /// Accepted records, in page order
    pub records: Vec<Record>,
    /// Whether an enabled next-page control is present
    pub has_next: bool,
}

impl BestsellerScraper {
    /// Walks `category` page by page, returning the records it accepted.
    ///
    /// Each page's batch is appended to `run` and flushed before the next
    /// fetch. A fetch failure or a wait timeout ends the walk early; records
    /// already collected are kept.
    pub async fn walk(
        &self,
        category: &Category,
        max_records: usize,
        min_discount: u32,
        run: &mut RunAccumulator,
    ) -> Vec<Record> {
        let span = info_span!("category", name = %category.name);
        self.walk_pages(category, max_records, min_discount, run)
            .instrument(span)
            .await
    }

    async fn walk_pages(
        &self,
        category: &Category,
        max_records: usize,
        min_discount: u32,
        run: &mut RunAccumulator,
    ) -> Vec<Record> {
        let mut collected: Vec<Record> = Vec::new();
        let mut page = 1;

        loop {
            if page > MAX_PAGES {
                warn!(page, "reached maximum page limit, stopping pagination");
                break;
            }
            if collected.len() >= max_records {
                info!(max_records, "record target reached, stopping pagination");
                break;
            }
            if page > 1 {
                self.pacing.delay.pause().await;
            }

            let url = self.config.page_url(&category.url, page);
            info!(page, %url, "fetching category page");

            if let Err(e) = self.source.get(&url).await {
                error!(page, error = %e, "failed to load page, ending walk");
                break;
            }

            let html = match self
                .source
                .wait_until_present(&self.locators.product_card, self.pacing.wait_timeout)
                .await
            {
                Ok(html) => html,
                Err(e @ FetchError::WaitTimeout { .. }) => {
                    warn!(page, error = %e, "no products rendered, ending walk");
                    break;
                }
                Err(e) => {
                    error!(page, error = %e, "failed to read page, ending walk");
                    break;
                }
            };

            let harvest = self.harvest(&html, category, min_discount);
            info!(
                page,
                cards = harvest.cards,
                accepted = harvest.records.len(),
                "harvested page"
            );

            collected.extend(harvest.records.iter().cloned());
            run.append_and_flush(harvest.records).await;
            info!(total = collected.len(), "products collected so far");

            if harvest.cards == 0 {
                info!(page, "page has no product cards, stopping pagination");
                break;
            }
            if !harvest.has_next {
                info!(page, "no next page, stopping pagination");
                break;
            }

            page += 1;
        }

        info!(records = collected.len(), "finished category");
        collected
    }

    /// Extracts every card on a rendered page and checks for a next page.
    pub fn harvest(&self, html: &str, category: &Category, min_discount: u32) -> PageHarvest {
        let document = Html::parse_document(html);
        let mut harvest = PageHarvest::default();

        for element in document.select(self.locators.product_card.selector()) {
            let card = Card::new(element);
            if card.token(self.assembler.id_attr()).is_none() {
                continue;
            }
            harvest.cards += 1;

            let Some(record) = self.assembler.assemble(&card, category) else {
                continue;
            };

            if self.enforce_min_discount && record.discount_percent < min_discount {
                debug!(
                    id = %record.id,
                    discount = record.discount_percent,
                    min_discount,
                    "discount below minimum, skipping"
                );
                continue;
            }

            harvest.records.push(record);
        }

        harvest.has_next = document
            .select(self.locators.next_page.selector())
            .next()
            .is_some()
            && document
                .select(self.locators.next_page_disabled.selector())
                .next()
                .is_none();

        harvest
    }
}
