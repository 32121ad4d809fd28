//! Best-effort field extraction from listing cards.
//!
//! A missing or malformed field never aborts record assembly: absence yields
//! `found == false` with the field's default value, and unparseable content
//! yields the default as well.

use scraper::ElementRef;

use crate::traits::Locator;

/// Outcome of extracting one field from a card
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted<T> {
    pub value: T,
    /// Whether the field's locator matched inside the card
    pub found: bool,
}

impl<T> Extracted<T> {
    pub fn into_option(self) -> Option<T> {
        self.found.then_some(self.value)
    }
}

/// One rendered listing entry
#[derive(Debug, Clone, Copy)]
pub struct Card<'a> {
    element: ElementRef<'a>,
}

impl<'a> Card<'a> {
    pub fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    /// The card's identifying token, if present and non-blank.
    pub fn token(&self, attr: &str) -> Option<&'a str> {
        self.element
            .value()
            .attr(attr)
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// First sub-element matching `locator`.
    pub fn find(&self, locator: &Locator) -> Option<ElementRef<'a>> {
        self.element.select(locator.selector()).next()
    }

    pub fn has(&self, locator: &Locator) -> bool {
        self.find(locator).is_some()
    }
}

/// Text content of an element, all descendant text nodes concatenated
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Looks up `locator` within `card` and parses its text with `parser`.
pub fn extract<T, F>(card: &Card<'_>, locator: &Locator, parser: F) -> Extracted<T>
where
    T: Default,
    F: FnOnce(&str) -> T,
{
    match card.find(locator) {
        Some(element) => Extracted {
            value: parser(&element_text(element)),
            found: true,
        },
        None => Extracted {
            value: T::default(),
            found: false,
        },
    }
}

/// Collapses whitespace runs to single spaces and trims the ends
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Code points of the zero digit in the non-ASCII decimal scripts listings
/// are rendered in. Each block runs zero through nine contiguously.
const DECIMAL_ZEROS: [u32; 12] = [
    0x0660, // Arabic-Indic
    0x06F0, // Extended Arabic-Indic
    0x0966, // Devanagari
    0x09E6, // Bengali
    0x0A66, // Gurmukhi
    0x0AE6, // Gujarati
    0x0B66, // Oriya
    0x0BE6, // Tamil
    0x0C66, // Telugu
    0x0CE6, // Kannada
    0x0D66, // Malayalam
    0xFF10, // Fullwidth
];

/// Value of `c` as a decimal digit, in ASCII or one of `DECIMAL_ZEROS`.
fn decimal_value(c: char) -> Option<u32> {
    if let Some(value) = c.to_digit(10) {
        return Some(value);
    }
    let code = u32::from(c);
    DECIMAL_ZEROS
        .iter()
        .find(|zero| (**zero..**zero + 10).contains(&code))
        .map(|zero| code - zero)
}

/// Every decimal digit in `raw`, concatenated in order as ASCII
fn digits(raw: &str) -> String {
    raw.chars()
        .filter_map(decimal_value)
        .filter_map(|value| char::from_digit(value, 10))
        .collect()
}

/// Price as the integer formed by all digits in the text.
///
/// No decimal-point or locale handling: `"₹1,299"` is `1299.0` and
/// `"1,299.50"` is `129950.0`. No digits gives `0.0`.
pub fn parse_price(raw: &str) -> f64 {
    digits(raw).parse().unwrap_or(0.0)
}

/// Count as the integer formed by all digits in the text, `0` if none or
/// if the digits overflow.
pub fn parse_count(raw: &str) -> u64 {
    digits(raw).parse().unwrap_or(0)
}

/// Discount percentage from the digits in the text.
///
/// Unlike price and count, the concatenated digits are not taken verbatim:
/// `"Save ₹500 (50%)"` concatenates to `50050`, which is not a percentage,
/// so anything outside `0..=100` is treated as malformed and yields `0`.
pub fn parse_discount(raw: &str) -> u32 {
    digits(raw)
        .parse()
        .ok()
        .filter(|percent| *percent <= 100)
        .unwrap_or(0)
}
