pub mod error;
pub mod normalize;
mod parse;

pub use error::NormalizeError;
pub use normalize::{
    normalize_book, normalize_book_with_fallbacks, Fallback, NormalizeOptions, NormalizeOutcome,
};
