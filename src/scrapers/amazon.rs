//! Amazon India bestseller profile

use crate::traits::{ScraperConfig, SiteSelectors};

/// Builds the scraper configuration for amazon.in bestseller listings
pub fn config() -> ScraperConfig {
    ScraperConfig {
        name: "Amazon.in".to_string(),
        base_url: "https://www.amazon.in".to_string(),
        bestseller_url: "https://www.amazon.in/gp/bestsellers".to_string(),
        bestseller_marker: "bestsellers".to_string(),
        page_param: "pg".to_string(),
        sign_in_url: "https://www.amazon.in".to_string(),
        email_field: "email".to_string(),
        password_field: "password".to_string(),
        selectors: SiteSelectors {
            category_group: "div._p13n-zg-nav-tree-all_style_zg-browse-group__88fbz".to_string(),
            category_link: "a".to_string(),
            category_fallback: "div[role='treeitem'] a".to_string(),
            product_card: "div[data-asin]".to_string(),
            product_id_attr: "data-asin".to_string(),
            name: "span.a-text-normal".to_string(),
            price: "span.a-price-whole".to_string(),
            discount: "span.a-savings".to_string(),
            rating: "span.a-icon-alt".to_string(),
            review_count: "span.a-size-base".to_string(),
            next_page: "li.a-last a".to_string(),
            next_page_disabled: "li.a-disabled.a-last".to_string(),
            sign_in_link: "#nav-link-accountList".to_string(),
            sign_in_form: "form[name='signIn']".to_string(),
            account_greeting: "#nav-link-accountList-nav-line-1".to_string(),
        },
    }
}

/// Same profile with every URL rooted at `base_url`.
///
/// Lets a local mirror (or a test server) stand in for the live storefront.
pub fn config_for(base_url: &str) -> ScraperConfig {
    let base = base_url.trim_end_matches('/');
    ScraperConfig {
        base_url: base.to_string(),
        bestseller_url: format!("{base}/gp/bestsellers"),
        sign_in_url: base.to_string(),
        ..config()
    }
}
