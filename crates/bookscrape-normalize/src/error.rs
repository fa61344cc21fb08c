use bookscrape_core::BookField;
use thiserror::Error;

/// A present field whose raw text does not fit its grammar and has no
/// fallback. Fatal to the record, never to the run.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("malformed currency in {field}: \"{value}\" ({reason})")]
    MalformedCurrency {
        field: BookField,
        value: String,
        reason: String,
    },

    #[error("malformed review count: \"{value}\"")]
    MalformedReviewCount { value: String },

    #[error("malformed availability count: \"{value}\"")]
    MalformedAvailability { value: String },
}

impl NormalizeError {
    /// The field whose raw value was rejected.
    #[must_use]
    pub fn field(&self) -> BookField {
        match self {
            NormalizeError::MalformedCurrency { field, .. } => *field,
            NormalizeError::MalformedReviewCount { .. } => BookField::NumReviews,
            NormalizeError::MalformedAvailability { .. } => BookField::Availability,
        }
    }
}
