//! Timing of fetch strategies over portfolios of varying size.
//!
//! Portfolios are valued one at a time, in the order given; only the
//! symbols inside one portfolio are fetched concurrently. A portfolio whose
//! `resolve` fails outright is logged and skipped, and the run carries on.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::FetchError;
use crate::quote_client::QuoteSource;
use crate::strategy::{FetchStrategy, StrategyKind};
use crate::valuation::{self, ValuationResult};
use crate::{Portfolio, Symbol, ValidationError};

/// Candidate symbols screened before building random portfolios.
pub const DEFAULT_UNIVERSE: [&str; 20] = [
    "BTC", "ETH", "XRP", "BNB", "SOL", "DOGE", "ADA", "TRX", "SUI", "LINK", "AVAX", "XLM", "HBAR",
    "SHIB", "LEO", "TON", "BCH", "DOT", "LTC", "HYPE",
];

/// Portfolio sizes used when none are given.
pub const DEFAULT_SIZES: [usize; 5] = [3, 5, 10, 15, 20];

/// Elapsed time of one fetch-and-value cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingSample {
    /// Position of the portfolio in the input sequence.
    pub portfolio: usize,
    pub portfolio_size: usize,
    pub strategy: StrategyKind,
    pub elapsed_seconds: f64,
}

/// Per-portfolio comparison of two strategies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedupRow {
    pub portfolio: usize,
    pub portfolio_size: usize,
    pub baseline_seconds: f64,
    pub candidate_seconds: f64,
    /// `baseline / candidate`; absent when the candidate took no measurable time.
    pub speedup: Option<f64>,
}

pub struct BenchmarkRunner {
    source: Arc<dyn QuoteSource>,
}

impl BenchmarkRunner {
    pub fn new(source: Arc<dyn QuoteSource>) -> Self {
        Self { source }
    }

    /// Fetch and value one portfolio, returning the result and wall time.
    pub async fn time_valuation(
        &self,
        portfolio: &Portfolio,
        strategy: FetchStrategy,
    ) -> Result<(ValuationResult, Duration), FetchError> {
        let started = Instant::now();
        let prices = strategy.resolve(&self.source, &portfolio.symbols()).await?;
        let result = valuation::value(portfolio, &prices);
        Ok((result, started.elapsed()))
    }

    pub async fn run(
        &self,
        portfolios: &[Portfolio],
        strategy: FetchStrategy,
    ) -> Vec<TimingSample> {
        let mut samples = Vec::with_capacity(portfolios.len());

        for (index, portfolio) in portfolios.iter().enumerate() {
            match self.time_valuation(portfolio, strategy).await {
                Ok((result, elapsed)) => {
                    info!(
                        strategy = %strategy,
                        size = portfolio.len(),
                        total = result.total(),
                        elapsed_seconds = elapsed.as_secs_f64(),
                        "portfolio valued"
                    );
                    samples.push(TimingSample {
                        portfolio: index,
                        portfolio_size: portfolio.len(),
                        strategy: strategy.kind(),
                        elapsed_seconds: elapsed.as_secs_f64(),
                    });
                }
                Err(error) => {
                    warn!(
                        strategy = %strategy,
                        portfolio = index,
                        size = portfolio.len(),
                        code = error.code(),
                        error = %error,
                        "skipping benchmark sample"
                    );
                }
            }
        }

        samples
    }

    /// Run every strategy over the same portfolios, strategy by strategy.
    pub async fn run_all(
        &self,
        portfolios: &[Portfolio],
        strategies: &[FetchStrategy],
    ) -> Vec<TimingSample> {
        let mut samples = Vec::with_capacity(portfolios.len() * strategies.len());
        for strategy in strategies {
            samples.extend(self.run(portfolios, *strategy).await);
        }
        samples
    }

    /// Keep the candidates the service prices, one `fetch_one` per symbol
    /// over a single session.
    pub async fn screen_symbols(&self, candidates: &[Symbol]) -> Result<Vec<Symbol>, FetchError> {
        let session = self.source.open_session();
        let mut accepted = Vec::with_capacity(candidates.len());
        for symbol in candidates {
            let quote = session.fetch_one(symbol).await?;
            if quote.is_found() {
                accepted.push(symbol.clone());
            } else {
                warn!(
                    symbol = %symbol,
                    status = %quote.status,
                    "symbol rejected by screening"
                );
            }
        }
        Ok(accepted)
    }
}

/// Pair samples from two strategies by portfolio position.
///
/// Portfolios skipped by either run are left out.
pub fn compare(baseline: &[TimingSample], candidate: &[TimingSample]) -> Vec<SpeedupRow> {
    baseline
        .iter()
        .filter_map(|base| {
            let other = candidate
                .iter()
                .find(|sample| sample.portfolio == base.portfolio)?;
            let speedup = (other.elapsed_seconds > 0.0)
                .then(|| base.elapsed_seconds / other.elapsed_seconds);
            Some(SpeedupRow {
                portfolio: base.portfolio,
                portfolio_size: base.portfolio_size,
                baseline_seconds: base.elapsed_seconds,
                candidate_seconds: other.elapsed_seconds,
                speedup,
            })
        })
        .collect()
}

/// One random portfolio per entry of `sizes`, drawn from `universe`.
pub fn random_portfolios(
    sizes: &[usize],
    universe: &[Symbol],
    rng: &mut fastrand::Rng,
) -> Result<Vec<Portfolio>, ValidationError> {
    sizes
        .iter()
        .map(|size| Portfolio::random(*size, universe, rng))
        .collect()
}

pub fn default_universe() -> Vec<Symbol> {
    DEFAULT_UNIVERSE
        .iter()
        .filter_map(|raw| Symbol::parse(raw).ok())
        .collect()
}
