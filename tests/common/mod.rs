//! Shared fixtures: a canned-document page source, a fixed session gate and
//! small HTML builders shaped like bestseller listings.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use bestseller_finder::FetchError;
use bestseller_finder::models::Record;
use bestseller_finder::scraper::{BestsellerScraper, Pacing, PolitenessDelay};
use bestseller_finder::scrapers::amazon;
use bestseller_finder::traits::{PageSource, RecordSink, SessionGate};

pub const BASE: &str = "https://www.amazon.in";

/// Serves fixed markup per URL and counts every navigation
#[derive(Default)]
pub struct CannedPages {
    pages: HashMap<String, Option<String>>,
    current: Mutex<Option<String>>,
    requested: Mutex<Vec<String>>,
    fetches: AtomicUsize,
}

impl CannedPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), Some(html.into()));
        self
    }

    /// Navigating to `url` fails as a server error would
    pub fn failing(mut self, url: &str) -> Self {
        self.pages.insert(url.to_string(), None);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for CannedPages {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(url.to_string());

        match self.pages.get(url) {
            Some(Some(html)) => {
                *self.current.lock().unwrap() = Some(html.clone());
                Ok(html.clone())
            }
            Some(None) => Err(FetchError::UnexpectedStatus {
                status: 503,
                url: url.to_string(),
            }),
            None => Err(FetchError::UnexpectedStatus {
                status: 404,
                url: url.to_string(),
            }),
        }
    }

    async fn current(&self) -> Result<String, FetchError> {
        self.current.lock().unwrap().clone().ok_or(FetchError::NoPage)
    }
}

/// Session gate with a fixed answer
pub struct FixedGate {
    pub accept: bool,
    pub attempts: AtomicUsize,
}

impl FixedGate {
    pub fn new(accept: bool) -> Self {
        Self {
            accept,
            attempts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SessionGate for FixedGate {
    async fn login(&self, _email: &str, _password: &str) -> bool {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.accept
    }

    async fn is_authenticated(&self) -> bool {
        self.accept && self.attempts.load(Ordering::SeqCst) > 0
    }
}

/// Remembers the length of every sequence it is asked to flush
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub flushed: Arc<Mutex<Vec<usize>>>,
}

#[async_trait]
impl RecordSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    async fn flush(&mut self, records: &[Record]) -> Result<()> {
        self.flushed.lock().unwrap().push(records.len());
        Ok(())
    }
}

pub fn quick_pacing() -> Pacing {
    Pacing {
        delay: PolitenessDelay::disabled(),
        wait_timeout: Duration::from_millis(50),
    }
}

pub fn scraper_over(source: Arc<CannedPages>) -> BestsellerScraper {
    BestsellerScraper::new(source, amazon::config(), quick_pacing()).unwrap()
}

pub fn category_url(slug: &str) -> String {
    format!("{BASE}/gp/bestsellers/{slug}")
}

pub fn page_url(slug: &str, page: u32) -> String {
    format!("{BASE}/gp/bestsellers/{slug}?pg={page}")
}

pub fn card(asin: &str, name: &str, price: &str) -> String {
    format!(
        r#"<div data-asin="{asin}">
             <span class="a-text-normal">{name}</span>
             <span class="a-price-whole">{price}</span>
             <span class="a-icon-alt">4.2 out of 5 stars</span>
             <span class="a-size-base">1,024</span>
           </div>"#
    )
}

pub fn discounted_card(asin: &str, name: &str, price: &str, discount: &str) -> String {
    format!(
        r#"<div data-asin="{asin}">
             <span class="a-text-normal">{name}</span>
             <span class="a-price-whole">{price}</span>
             <span class="a-savings">{discount}</span>
           </div>"#
    )
}

/// `count` priced cards with ids `{prefix}1..={prefix}{count}`
pub fn cards(prefix: &str, count: usize) -> Vec<String> {
    (1..=count)
        .map(|i| card(&format!("{prefix}{i}"), &format!("Item {prefix}{i}"), "₹499"))
        .collect()
}

pub fn listing(cards: &[String], next: bool) -> String {
    let pagination = if next {
        r#"<ul class="a-pagination"><li class="a-last"><a href="?pg=next">Next page</a></li></ul>"#
    } else {
        r#"<ul class="a-pagination"><li class="a-disabled a-last">Next page</li></ul>"#
    };
    format!(
        "<html><body><div id=\"gridItemRoot\">{}</div>{pagination}</body></html>",
        cards.join("\n")
    )
}

pub fn landing(groups: &[(&str, &str)]) -> String {
    let body: String = groups
        .iter()
        .map(|(name, href)| {
            format!(
                r#"<div class="_p13n-zg-nav-tree-all_style_zg-browse-group__88fbz"><a href="{href}">{name}</a></div>"#
            )
        })
        .collect();
    format!("<html><body>{body}</body></html>")
}

pub fn tree_landing(links: &[(&str, &str)]) -> String {
    let body: String = links
        .iter()
        .map(|(name, href)| format!(r#"<div role="treeitem"><a href="{href}">{name}</a></div>"#))
        .collect();
    format!("<html><body>{body}</body></html>")
}
