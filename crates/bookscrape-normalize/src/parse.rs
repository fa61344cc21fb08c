//! Field-level parsers for scraped book values.
//!
//! Each parser takes one present [`RawValue`]; absent fields never reach this
//! module. Lenient parsers return `None` when their fallback applies and let
//! [`crate::normalize`] substitute the default.

use std::str::FromStr;

use bookscrape_core::{BookField, RawValue};
use rust_decimal::Decimal;

use crate::error::NormalizeError;

/// Renders a text field with surrounding whitespace removed.
///
/// Numeric raw values are rendered in their display form.
pub(crate) fn trimmed_text(value: &RawValue) -> String {
    match value {
        RawValue::Text(s) => s.trim().to_owned(),
        other => other.to_string(),
    }
}

/// Renders a text field without touching its whitespace.
pub(crate) fn verbatim_text(value: &RawValue) -> String {
    match value {
        RawValue::Text(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Trimmed and lowercased, for categorical fields like `category`.
pub(crate) fn categorical_text(value: &RawValue) -> String {
    trimmed_text(value).to_lowercase()
}

/// Parses a price such as `"£51.77"` into a decimal.
///
/// Every occurrence of every symbol in `symbols` is removed before parsing;
/// callers pass symbols longest first so `"US$"` wins over `"$"`.
pub(crate) fn parse_currency(
    field: BookField,
    value: &RawValue,
    symbols: &[String],
) -> Result<Decimal, NormalizeError> {
    let malformed = |reason: String| NormalizeError::MalformedCurrency {
        field,
        value: value.to_string(),
        reason,
    };

    match value {
        RawValue::Text(text) => {
            let mut amount = text.trim().to_owned();
            for symbol in symbols {
                if amount.contains(symbol.as_str()) {
                    amount = amount.replace(symbol.as_str(), "");
                }
            }
            Decimal::from_str(amount.trim()).map_err(|e| malformed(e.to_string()))
        }
        RawValue::Integer(n) => Ok(Decimal::from(*n)),
        RawValue::Float(n) => Decimal::try_from(*n).map_err(|e| malformed(e.to_string())),
    }
}

/// Parses the stock count out of `"In stock (19 available)"`.
///
/// Returns `Ok(None)` when the phrase has no parenthesized clause.
pub(crate) fn parse_availability(value: &RawValue) -> Result<Option<i32>, NormalizeError> {
    let malformed = || NormalizeError::MalformedAvailability {
        value: value.to_string(),
    };

    match value {
        RawValue::Text(text) => {
            let Some((_, clause)) = text.split_once('(') else {
                return Ok(None);
            };
            clause
                .split_whitespace()
                .next()
                .map(|token| token.trim_end_matches(')'))
                .and_then(|token| token.parse::<u32>().ok())
                .and_then(|count| i32::try_from(count).ok())
                .map(Some)
                .ok_or_else(malformed)
        }
        RawValue::Integer(n) => non_negative_i32(*n).map(Some).ok_or_else(malformed),
        RawValue::Float(_) => Err(malformed()),
    }
}

/// Parses a review count given as `"23"` or `23`.
pub(crate) fn parse_review_count(value: &RawValue) -> Result<i32, NormalizeError> {
    let malformed = || NormalizeError::MalformedReviewCount {
        value: value.to_string(),
    };

    match value {
        RawValue::Text(text) => text
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(non_negative_i32)
            .ok_or_else(malformed),
        RawValue::Integer(n) => non_negative_i32(*n).ok_or_else(malformed),
        RawValue::Float(n) => {
            if !n.is_finite() || n.fract().abs() > 0.0 {
                return Err(malformed());
            }
            #[allow(clippy::cast_possible_truncation)]
            let whole = *n as i64;
            non_negative_i32(whole).ok_or_else(malformed)
        }
    }
}

/// Maps the rating word at the end of `"star-rating Three"` to `3`.
///
/// Returns `None` for a single-token phrase, a word outside `zero..=five`,
/// or a number outside `0..=5`.
pub(crate) fn parse_star_rating(value: &RawValue) -> Option<i16> {
    match value {
        RawValue::Text(text) => {
            let tokens: Vec<&str> = text.split_whitespace().collect();
            if tokens.len() < 2 {
                return None;
            }
            tokens
                .last()
                .and_then(|word| star_word_value(&word.to_lowercase()))
        }
        RawValue::Integer(n) => i16::try_from(*n).ok().filter(|n| (0..=5).contains(n)),
        RawValue::Float(_) => None,
    }
}

fn star_word_value(word: &str) -> Option<i16> {
    match word {
        "zero" => Some(0),
        "one" => Some(1),
        "two" => Some(2),
        "three" => Some(3),
        "four" => Some(4),
        "five" => Some(5),
        _ => None,
    }
}

fn non_negative_i32(n: i64) -> Option<i32> {
    i32::try_from(n).ok().filter(|n| *n >= 0)
}
