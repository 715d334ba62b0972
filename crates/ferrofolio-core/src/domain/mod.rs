//! # Domain Models
//!
//! Canonical value types shared by the quote client, fetch strategies,
//! the valuator and the benchmark runner.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Upper-cased ticker |
//! | [`Holding`] | Symbol and held quantity |
//! | [`Portfolio`] | Ordered, unique-keyed holdings |
//! | [`PriceQuote`] | One symbol's price with a [`QuoteStatus`] |
//! | [`PriceTable`] | Symbol-keyed quotes for one valuation |
//!
//! Quantities are validated at construction: finite and non-negative.

mod models;
mod quote;
mod symbol;

pub use models::{
    validate_currency_code, Holding, Portfolio, RANDOM_QUANTITY_MAX, RANDOM_QUANTITY_MIN,
};
pub use quote::{PriceQuote, PriceTable, QuoteStatus};
pub use symbol::Symbol;
