//! Pagination behaviour of `BestsellerScraper::walk` over canned pages.

mod common;

use std::sync::Arc;
use std::time::Duration;

use bestseller_finder::models::Category;
use bestseller_finder::scraper::{BestsellerScraper, Pacing, PolitenessDelay};
use bestseller_finder::scrapers::amazon;
use bestseller_finder::sink::RunAccumulator;

use common::{
    CannedPages, RecordingSink, card, cards, category_url, discounted_card, listing, page_url,
    scraper_over,
};

fn books() -> Category {
    Category {
        name: "Books".to_string(),
        url: category_url("books"),
    }
}

fn no_sinks() -> RunAccumulator {
    RunAccumulator::new(Vec::new())
}

#[tokio::test]
async fn single_page_without_next_control_is_fetched_once() {
    let source = Arc::new(
        CannedPages::new().page(&page_url("books", 1), listing(&cards("A", 3), false)),
    );
    let scraper = scraper_over(source.clone());
    let mut run = no_sinks();

    let records = scraper.walk(&books(), 50, 50, &mut run).await;

    assert_eq!(records.len(), 3);
    assert_eq!(source.fetch_count(), 1, "no second fetch expected");
    assert_eq!(run.len(), 3);
    assert!(records.iter().all(|r| r.category == "books"));
}

#[tokio::test]
async fn fetch_failure_keeps_records_from_earlier_pages() {
    let source = Arc::new(
        CannedPages::new()
            .page(&page_url("books", 1), listing(&cards("A", 4), true))
            .failing(&page_url("books", 2)),
    );
    let scraper = scraper_over(source.clone());
    let mut run = no_sinks();

    let records = scraper.walk(&books(), 50, 50, &mut run).await;

    assert_eq!(records.len(), 4);
    assert_eq!(source.fetch_count(), 2);
    assert_eq!(run.len(), 4);
}

#[tokio::test]
async fn stops_fetching_once_record_target_is_reached() {
    let source = Arc::new(
        CannedPages::new()
            .page(&page_url("books", 1), listing(&cards("A", 3), true))
            .page(&page_url("books", 2), listing(&cards("B", 3), true))
            .page(&page_url("books", 3), listing(&cards("C", 3), true)),
    );
    let scraper = scraper_over(source.clone());
    let mut run = no_sinks();

    let records = scraper.walk(&books(), 5, 50, &mut run).await;

    assert_eq!(source.fetch_count(), 2, "page 3 must not be requested");
    // The page that crosses the target is kept whole
    assert_eq!(records.len(), 6);
}

#[tokio::test]
async fn zero_record_target_fetches_nothing() {
    let source = Arc::new(
        CannedPages::new().page(&page_url("books", 1), listing(&cards("A", 3), false)),
    );
    let scraper = scraper_over(source.clone());
    let mut run = no_sinks();

    let records = scraper.walk(&books(), 0, 50, &mut run).await;

    assert!(records.is_empty());
    assert_eq!(source.fetch_count(), 0);
    assert!(run.is_empty());
}

#[tokio::test]
async fn follows_pages_in_order_until_next_control_disappears() {
    let source = Arc::new(
        CannedPages::new()
            .page(&page_url("books", 1), listing(&cards("A", 2), true))
            .page(&page_url("books", 2), listing(&cards("B", 2), true))
            .page(&page_url("books", 3), listing(&cards("C", 1), false)),
    );
    let scraper = scraper_over(source.clone());
    let mut run = no_sinks();

    let records = scraper.walk(&books(), 50, 50, &mut run).await;

    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["A1", "A2", "B1", "B2", "C1"]);
    assert_eq!(
        source.requested(),
        vec![page_url("books", 1), page_url("books", 2), page_url("books", 3)]
    );
}

#[tokio::test]
async fn wait_timeout_ends_walk_without_error() {
    let empty = "<html><body><p>No results</p></body></html>";
    let source = Arc::new(
        CannedPages::new()
            .page(&page_url("books", 1), listing(&cards("A", 2), true))
            .page(&page_url("books", 2), empty),
    );
    let scraper = scraper_over(source.clone());
    let mut run = no_sinks();

    let records = scraper.walk(&books(), 50, 50, &mut run).await;

    assert_eq!(records.len(), 2);
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn page_of_placeholders_stops_pagination() {
    let placeholders = vec![
        r#"<div data-asin=""><span class="a-text-normal">Sponsored</span></div>"#.to_string(),
        r#"<div data-asin=" "></div>"#.to_string(),
    ];
    let source = Arc::new(
        CannedPages::new()
            .page(&page_url("books", 1), listing(&placeholders, true))
            .page(&page_url("books", 2), listing(&cards("B", 2), false)),
    );
    let scraper = scraper_over(source.clone());
    let mut run = no_sinks();

    let records = scraper.walk(&books(), 50, 50, &mut run).await;

    assert!(records.is_empty());
    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test]
async fn rejected_cards_are_dropped_but_pagination_continues() {
    let page_one = vec![
        card("A1", "Pen", "₹10"),
        card("A2", "Unpriced", "Currently unavailable"),
        r#"<div data-asin="A3"><span class="a-price-whole">99</span></div>"#.to_string(),
        r#"<div data-asin=""><span class="a-text-normal">Ad</span><span class="a-price-whole">5</span></div>"#.to_string(),
    ];
    let page_two = vec![card("B1", "Too", "N/A")];
    let source = Arc::new(
        CannedPages::new()
            .page(&page_url("books", 1), listing(&page_one, true))
            .page(&page_url("books", 2), listing(&page_two, false)),
    );
    let scraper = scraper_over(source.clone());

    let harvest = scraper.harvest(&listing(&page_one, true), &books(), 0);
    assert_eq!(harvest.cards, 3);
    assert_eq!(harvest.records.len(), 1);
    assert!(harvest.has_next);

    let mut run = no_sinks();
    let records = scraper.walk(&books(), 50, 50, &mut run).await;

    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["A1"]);
    assert_eq!(source.fetch_count(), 2, "a page with only rejected cards still paginates");
}

#[tokio::test]
async fn running_total_is_flushed_after_every_page() {
    let source = Arc::new(
        CannedPages::new()
            .page(&page_url("books", 1), listing(&cards("A", 2), true))
            .page(&page_url("books", 2), listing(&cards("B", 3), false)),
    );
    let scraper = scraper_over(source);
    let sink = RecordingSink::default();
    let mut run = RunAccumulator::new(vec![Box::new(sink.clone())]);

    scraper.walk(&books(), 50, 50, &mut run).await;

    assert_eq!(*sink.flushed.lock().unwrap(), vec![2, 5]);
}

#[tokio::test]
async fn accumulator_keeps_records_from_earlier_categories() {
    let source = Arc::new(
        CannedPages::new()
            .page(&page_url("books", 1), listing(&cards("A", 2), false))
            .page(&page_url("toys", 1), listing(&cards("T", 1), false)),
    );
    let scraper = scraper_over(source);
    let mut run = no_sinks();
    let toys = Category {
        name: "Toys".to_string(),
        url: category_url("toys"),
    };

    let first = scraper.walk(&books(), 50, 50, &mut run).await;
    let second = scraper.walk(&toys, 50, 50, &mut run).await;

    assert_eq!((first.len(), second.len()), (2, 1));
    let categories: Vec<&str> = run.records().iter().map(|r| r.category.as_str()).collect();
    assert_eq!(categories, vec!["books", "books", "toys"]);
}

#[tokio::test]
async fn min_discount_is_carried_but_not_compared_by_default() {
    let page = vec![
        discounted_card("A1", "Lamp", "₹900", "10% off"),
        discounted_card("A2", "Desk", "₹4,500", "60% off"),
    ];
    let source = Arc::new(CannedPages::new().page(&page_url("books", 1), listing(&page, false)));

    let lenient = scraper_over(source.clone());
    let mut run = no_sinks();
    assert_eq!(lenient.walk(&books(), 50, 50, &mut run).await.len(), 2);

    let strict = scraper_over(source).with_min_discount_filter(true);
    let mut run = no_sinks();
    let records = strict.walk(&books(), 50, 50, &mut run).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "A2");
    assert_eq!(records[0].discount_percent, 60);
}

#[tokio::test]
async fn politeness_delay_separates_page_fetches() {
    let source = Arc::new(
        CannedPages::new()
            .page(&page_url("books", 1), listing(&cards("A", 1), true))
            .page(&page_url("books", 2), listing(&cards("B", 1), true))
            .page(&page_url("books", 3), listing(&cards("C", 1), false)),
    );
    let pacing = Pacing {
        delay: PolitenessDelay::new(Duration::from_millis(40), Duration::from_millis(40)),
        wait_timeout: Duration::from_millis(50),
    };
    let scraper = BestsellerScraper::new(source.clone(), amazon::config(), pacing).unwrap();
    let mut run = no_sinks();

    let started = tokio::time::Instant::now();
    scraper.walk(&books(), 50, 50, &mut run).await;

    assert_eq!(source.fetch_count(), 3);
    assert!(started.elapsed() >= Duration::from_millis(80));
}
