use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The thirteen business fields shared by raw and normalized book records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookField {
    Url,
    Title,
    Upc,
    ProductType,
    PriceExclTax,
    PriceInclTax,
    Tax,
    Price,
    Availability,
    NumReviews,
    Stars,
    Category,
    Description,
}

impl BookField {
    /// Every field, in `books` column order.
    pub const ALL: [BookField; 13] = [
        BookField::Url,
        BookField::Title,
        BookField::Upc,
        BookField::ProductType,
        BookField::PriceExclTax,
        BookField::PriceInclTax,
        BookField::Tax,
        BookField::Price,
        BookField::Availability,
        BookField::NumReviews,
        BookField::Stars,
        BookField::Category,
        BookField::Description,
    ];

    /// Column / item-key name, e.g. `"price_excl_tax"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BookField::Url => "url",
            BookField::Title => "title",
            BookField::Upc => "upc",
            BookField::ProductType => "product_type",
            BookField::PriceExclTax => "price_excl_tax",
            BookField::PriceInclTax => "price_incl_tax",
            BookField::Tax => "tax",
            BookField::Price => "price",
            BookField::Availability => "availability",
            BookField::NumReviews => "num_reviews",
            BookField::Stars => "stars",
            BookField::Category => "category",
            BookField::Description => "description",
        }
    }
}

impl fmt::Display for BookField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single scraped value as the extractor emitted it.
///
/// JSON `null` and missing keys are represented by the surrounding `Option`,
/// not by a variant here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl RawValue {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        RawValue::Text(value.into())
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Text(s) => f.write_str(s),
            RawValue::Integer(n) => write!(f, "{n}"),
            RawValue::Float(n) => write!(f, "{n}"),
        }
    }
}

/// A book item exactly as scraped from a catalog page. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBook {
    pub url: Option<RawValue>,
    pub title: Option<RawValue>,
    pub upc: Option<RawValue>,
    pub product_type: Option<RawValue>,
    pub price_excl_tax: Option<RawValue>,
    pub price_incl_tax: Option<RawValue>,
    pub tax: Option<RawValue>,
    pub price: Option<RawValue>,
    pub availability: Option<RawValue>,
    pub num_reviews: Option<RawValue>,
    pub stars: Option<RawValue>,
    pub category: Option<RawValue>,
    pub description: Option<RawValue>,
}

impl RawBook {
    /// Returns the raw value stored under `field`, if any.
    #[must_use]
    pub fn get(&self, field: BookField) -> Option<&RawValue> {
        match field {
            BookField::Url => self.url.as_ref(),
            BookField::Title => self.title.as_ref(),
            BookField::Upc => self.upc.as_ref(),
            BookField::ProductType => self.product_type.as_ref(),
            BookField::PriceExclTax => self.price_excl_tax.as_ref(),
            BookField::PriceInclTax => self.price_incl_tax.as_ref(),
            BookField::Tax => self.tax.as_ref(),
            BookField::Price => self.price.as_ref(),
            BookField::Availability => self.availability.as_ref(),
            BookField::NumReviews => self.num_reviews.as_ref(),
            BookField::Stars => self.stars.as_ref(),
            BookField::Category => self.category.as_ref(),
            BookField::Description => self.description.as_ref(),
        }
    }
}

/// A book item with every field coerced to its storage type.
///
/// Absent raw fields stay `None`. `availability` and `stars` are the only
/// fields that may hold a defaulted `0` for a present-but-unstructured raw
/// value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBook {
    pub url: Option<String>,
    pub title: Option<String>,
    pub upc: Option<String>,
    /// Lowercased, e.g. `"books"`.
    pub product_type: Option<String>,
    pub price_excl_tax: Option<Decimal>,
    pub price_incl_tax: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub price: Option<Decimal>,
    /// Units in stock, parsed from `"In stock (19 available)"`.
    pub availability: Option<i32>,
    pub num_reviews: Option<i32>,
    /// Rating in `0..=5`.
    pub stars: Option<i16>,
    /// Lowercased, e.g. `"fiction"`.
    pub category: Option<String>,
    /// Passed through untrimmed.
    pub description: Option<String>,
}

/// Re-presents a normalized book as raw input.
///
/// Decimals become their text form and integers stay integers, so feeding
/// the result back through normalization reproduces the same book.
impl From<NormalizedBook> for RawBook {
    fn from(book: NormalizedBook) -> Self {
        let decimal = |d: Option<Decimal>| d.map(|d| RawValue::Text(d.to_string()));
        RawBook {
            url: book.url.map(RawValue::Text),
            title: book.title.map(RawValue::Text),
            upc: book.upc.map(RawValue::Text),
            product_type: book.product_type.map(RawValue::Text),
            price_excl_tax: decimal(book.price_excl_tax),
            price_incl_tax: decimal(book.price_incl_tax),
            tax: decimal(book.tax),
            price: decimal(book.price),
            availability: book.availability.map(|n| RawValue::Integer(i64::from(n))),
            num_reviews: book.num_reviews.map(|n| RawValue::Integer(i64::from(n))),
            stars: book.stars.map(|n| RawValue::Integer(i64::from(n))),
            category: book.category.map(RawValue::Text),
            description: book.description.map(RawValue::Text),
        }
    }
}
