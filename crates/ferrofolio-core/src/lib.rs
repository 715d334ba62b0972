//! Core contracts for ferrofolio.
//!
//! This crate contains:
//! - Canonical domain models and validation
//! - The quote service client and its transport seam
//! - Fetch strategies (sequential, concurrent, batched)
//! - Portfolio valuation and strategy benchmarking
//!
//! ```text
//!  Portfolio ──symbols──▶ FetchStrategy::resolve ──▶ PriceTable
//!                               │                        │
//!                        Arc<dyn QuoteSource>            ▼
//!                               │                 valuation::value
//!                        Arc<dyn HttpClient>             │
//!                                                        ▼
//!                                                 ValuationResult
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ferrofolio_core::{FetchStrategy, QuoteClient, QuoteClientConfig, QuoteSource};
//!
//! let source: Arc<dyn QuoteSource> =
//!     Arc::new(QuoteClient::with_reqwest(QuoteClientConfig::from_env()?));
//! let prices = FetchStrategy::Concurrent
//!     .resolve(&source, &portfolio.symbols())
//!     .await?;
//! let result = ferrofolio_core::value(&portfolio, &prices);
//! ```

pub mod benchmark;
pub mod config;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod portfolio_file;
pub mod quote_client;
pub mod strategy;
pub mod valuation;

pub use benchmark::{
    compare, default_universe, random_portfolios, BenchmarkRunner, SpeedupRow, TimingSample,
    DEFAULT_SIZES, DEFAULT_UNIVERSE,
};
pub use config::QuoteClientConfig;
pub use domain::{
    validate_currency_code, Holding, Portfolio, PriceQuote, PriceTable, QuoteStatus, Symbol,
};
pub use error::{ConfigError, CoreError, FetchError, ValidationError};
pub use http_client::{
    FixtureHttpClient, HttpClient, HttpError, HttpErrorKind, HttpMethod, HttpRequest, HttpResponse,
    ReqwestHttpClient,
};
pub use portfolio_file::{load_portfolios, parse_portfolios};
pub use quote_client::{QuoteClient, QuoteSource};
pub use strategy::{FetchStrategy, StrategyKind};
pub use valuation::{value, LineItem, ValuationResult};
