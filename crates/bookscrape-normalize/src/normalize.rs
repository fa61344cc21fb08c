//! Normalization from a scraped [`RawBook`] to a storage-ready [`NormalizedBook`].
//!
//! Value grammars live in [`crate::parse`]; this module decides which rule
//! applies to which field and where lenient fallbacks kick in. Nothing here
//! logs or performs I/O, so a book can be normalized from any thread.

use bookscrape_core::{AppConfig, BookField, NormalizedBook, RawBook, DEFAULT_CURRENCY_SYMBOLS};

use crate::error::NormalizeError;
use crate::parse::{
    categorical_text, parse_availability, parse_currency, parse_review_count, parse_star_rating,
    trimmed_text, verbatim_text,
};

/// Settings for [`normalize_book`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    currency_symbols: Vec<String>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY_SYMBOLS)
    }
}

impl NormalizeOptions {
    /// Builds options recognizing the given currency markers.
    ///
    /// Blank entries and duplicates are dropped. Symbols are kept longest
    /// first so a multi-character marker such as `"US$"` is stripped before
    /// its `"$"` suffix.
    #[must_use]
    pub fn new<I, S>(currency_symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut symbols: Vec<String> = currency_symbols
            .into_iter()
            .map(Into::into)
            .filter(|s| !s.trim().is_empty())
            .collect();
        symbols.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
        symbols.dedup();
        Self {
            currency_symbols: symbols,
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(config.currency_symbols.iter().cloned())
    }

    #[must_use]
    pub fn currency_symbols(&self) -> &[String] {
        &self.currency_symbols
    }
}

/// A lenient default that replaced a present but unstructured raw value.
///
/// Both defaults store `0`, which is indistinguishable from a genuine zero
/// once persisted; callers that care should inspect these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// `availability` had no parenthesized count; stored as `0`.
    AvailabilityClauseMissing,
    /// `stars` had no rating word or an unknown one; stored as `0`.
    StarRatingUnrecognized,
}

impl Fallback {
    #[must_use]
    pub fn field(self) -> BookField {
        match self {
            Fallback::AvailabilityClauseMissing => BookField::Availability,
            Fallback::StarRatingUnrecognized => BookField::Stars,
        }
    }
}

/// A normalized book together with the fallbacks used to produce it.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeOutcome {
    pub book: NormalizedBook,
    pub fallbacks: Vec<Fallback>,
}

/// Normalizes a raw [`RawBook`] into a [`NormalizedBook`].
///
/// Absent fields stay absent. See [`normalize_book_with_fallbacks`] to learn
/// which fields were defaulted.
///
/// # Errors
///
/// Returns the first [`NormalizeError`] hit while parsing a price,
/// availability count or review count.
pub fn normalize_book(
    raw: &RawBook,
    options: &NormalizeOptions,
) -> Result<NormalizedBook, NormalizeError> {
    normalize_book_with_fallbacks(raw, options).map(|outcome| outcome.book)
}

/// Normalizes a raw book and reports which lenient defaults were applied.
///
/// # Errors
///
/// Returns [`NormalizeError::MalformedCurrency`] for an unparseable price
/// field, [`NormalizeError::MalformedAvailability`] for a stock clause without
/// a count, and [`NormalizeError::MalformedReviewCount`] for a non-integer
/// review count.
pub fn normalize_book_with_fallbacks(
    raw: &RawBook,
    options: &NormalizeOptions,
) -> Result<NormalizeOutcome, NormalizeError> {
    let mut fallbacks = Vec::new();
    let symbols = options.currency_symbols();

    let price = |field: BookField| {
        raw.get(field)
            .map(|value| parse_currency(field, value, symbols))
            .transpose()
    };

    let price_excl_tax = price(BookField::PriceExclTax)?;
    let price_incl_tax = price(BookField::PriceInclTax)?;
    let tax = price(BookField::Tax)?;
    let price_value = price(BookField::Price)?;

    let availability = match raw.availability.as_ref() {
        Some(value) => Some(parse_availability(value)?.unwrap_or_else(|| {
            fallbacks.push(Fallback::AvailabilityClauseMissing);
            0
        })),
        None => None,
    };

    let num_reviews = raw.num_reviews.as_ref().map(parse_review_count).transpose()?;

    let stars = raw.stars.as_ref().map(|value| {
        parse_star_rating(value).unwrap_or_else(|| {
            fallbacks.push(Fallback::StarRatingUnrecognized);
            0
        })
    });

    let book = NormalizedBook {
        url: raw.url.as_ref().map(trimmed_text),
        title: raw.title.as_ref().map(trimmed_text),
        upc: raw.upc.as_ref().map(trimmed_text),
        product_type: raw.product_type.as_ref().map(categorical_text),
        price_excl_tax,
        price_incl_tax,
        tax,
        price: price_value,
        availability,
        num_reviews,
        stars,
        category: raw.category.as_ref().map(categorical_text),
        description: raw.description.as_ref().map(verbatim_text),
    };

    Ok(NormalizeOutcome { book, fallbacks })
}

#[cfg(test)]
mod tests {
    use bookscrape_core::RawValue;
    use rust_decimal::Decimal;

    use super::*;

    fn make_raw_book() -> RawBook {
        RawBook {
            url: Some(RawValue::text(
                " https://books.toscrape.com/catalogue/a-light-in-the-attic_1000/index.html ",
            )),
            title: Some(RawValue::text("A Light in the Attic\n")),
            upc: Some(RawValue::text(" a897fe39b1053632 ")),
            product_type: Some(RawValue::text(" Books ")),
            price_excl_tax: Some(RawValue::text("£51.77")),
            price_incl_tax: Some(RawValue::text("£51.77")),
            tax: Some(RawValue::text("£0.00")),
            price: Some(RawValue::text("£51.77")),
            availability: Some(RawValue::text("In stock (22 available)")),
            num_reviews: Some(RawValue::text("0")),
            stars: Some(RawValue::text("star-rating Three")),
            category: Some(RawValue::text(" Poetry ")),
            description: Some(RawValue::text("  It's hard to imagine a world without A Light in the Attic. ")),
        }
    }

    #[test]
    fn normalize_book_converts_every_field() {
        let book = normalize_book(&make_raw_book(), &NormalizeOptions::default()).unwrap();
        assert_eq!(
            book.url.as_deref(),
            Some("https://books.toscrape.com/catalogue/a-light-in-the-attic_1000/index.html")
        );
        assert_eq!(book.title.as_deref(), Some("A Light in the Attic"));
        assert_eq!(book.upc.as_deref(), Some("a897fe39b1053632"));
        assert_eq!(book.product_type.as_deref(), Some("books"));
        assert_eq!(book.price_excl_tax, Some(Decimal::new(5177, 2)));
        assert_eq!(book.price_incl_tax, Some(Decimal::new(5177, 2)));
        assert_eq!(book.tax, Some(Decimal::ZERO));
        assert_eq!(book.price, Some(Decimal::new(5177, 2)));
        assert_eq!(book.availability, Some(22));
        assert_eq!(book.num_reviews, Some(0));
        assert_eq!(book.stars, Some(3));
        assert_eq!(book.category.as_deref(), Some("poetry"));
        assert_eq!(
            book.description.as_deref(),
            Some("  It's hard to imagine a world without A Light in the Attic. ")
        );
    }

    #[test]
    fn normalize_book_leaves_absent_fields_absent() {
        let book = normalize_book(&RawBook::default(), &NormalizeOptions::default()).unwrap();
        assert_eq!(book, NormalizedBook::default());
    }

    #[test]
    fn normalize_book_does_not_touch_input() {
        let raw = make_raw_book();
        let before = raw.clone();
        normalize_book(&raw, &NormalizeOptions::default()).unwrap();
        assert_eq!(raw, before);
    }

    #[test]
    fn normalize_book_reports_failing_price_field() {
        let mut raw = make_raw_book();
        raw.tax = Some(RawValue::text("£n/a"));
        let err = normalize_book(&raw, &NormalizeOptions::default()).unwrap_err();
        assert_eq!(err.field(), BookField::Tax);
        assert!(err.to_string().contains("tax"));
    }

    #[test]
    fn normalize_book_rejects_malformed_review_count() {
        let mut raw = make_raw_book();
        raw.num_reviews = Some(RawValue::text("lots"));
        let err = normalize_book(&raw, &NormalizeOptions::default()).unwrap_err();
        assert!(matches!(err, NormalizeError::MalformedReviewCount { ref value } if value == "lots"));
    }

    #[test]
    fn fallbacks_are_reported_for_defaulted_fields() {
        let mut raw = make_raw_book();
        raw.availability = Some(RawValue::text("Out of stock"));
        raw.stars = Some(RawValue::text("star-rating Unknown"));
        let outcome = normalize_book_with_fallbacks(&raw, &NormalizeOptions::default()).unwrap();
        assert_eq!(outcome.book.availability, Some(0));
        assert_eq!(outcome.book.stars, Some(0));
        assert_eq!(
            outcome.fallbacks,
            vec![
                Fallback::AvailabilityClauseMissing,
                Fallback::StarRatingUnrecognized
            ]
        );
    }

    #[test]
    fn genuine_zero_is_not_a_fallback() {
        let mut raw = make_raw_book();
        raw.availability = Some(RawValue::text("Out of stock (0 available)"));
        raw.stars = Some(RawValue::text("star-rating Zero"));
        let outcome = normalize_book_with_fallbacks(&raw, &NormalizeOptions::default()).unwrap();
        assert_eq!(outcome.book.availability, Some(0));
        assert_eq!(outcome.book.stars, Some(0));
        assert!(outcome.fallbacks.is_empty());
    }

    #[test]
    fn fallback_field_names_the_defaulted_column() {
        assert_eq!(
            Fallback::AvailabilityClauseMissing.field(),
            BookField::Availability
        );
        assert_eq!(Fallback::StarRatingUnrecognized.field(), BookField::Stars);
    }

    #[test]
    fn options_order_symbols_longest_first_and_dedup() {
        let options = NormalizeOptions::new(["$", "US$", "", "£", "$"]);
        assert_eq!(options.currency_symbols(), ["US$", "$", "£"]);
    }

    #[test]
    fn options_multi_character_symbol_is_stripped_whole() {
        let options = NormalizeOptions::new(["$", "US$"]);
        let raw = RawBook {
            price: Some(RawValue::text("US$12.00")),
            ..RawBook::default()
        };
        let book = normalize_book(&raw, &options).unwrap();
        assert_eq!(book.price, Some(Decimal::new(1200, 2)));
    }

    #[test]
    fn options_restrict_recognized_symbols() {
        let options = NormalizeOptions::new(["€"]);
        let raw = RawBook {
            price: Some(RawValue::text("£12.00")),
            ..RawBook::default()
        };
        let err = normalize_book(&raw, &options).unwrap_err();
        assert!(matches!(err, NormalizeError::MalformedCurrency { .. }));
    }
}
