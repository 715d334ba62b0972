//! Behavior-driven tests for the benchmark runner
//!
//! These tests verify the shape of a benchmark run: one sample per portfolio,
//! in input order, with failed portfolios skipped instead of aborting the run.

use std::sync::Arc;
use std::time::Duration;

use ferrofolio_core::quote_client::QuoteFuture;
use ferrofolio_core::{
    compare, default_universe, random_portfolios, BenchmarkRunner, FetchError, PriceQuote,
    PriceTable, QuoteSource, StrategyKind, Symbol,
};
use ferrofolio_tests::{fixture_source, portfolio, sym, FetchStrategy, FixtureHttpClient};

fn priced_universe() -> FixtureHttpClient {
    FixtureHttpClient::new("USD").with_prices([
        ("BTC", 60_000.0),
        ("ETH", 3_000.0),
        ("SOL", 150.0),
        ("ADA", 0.5),
        ("DOT", 6.0),
        ("LTC", 70.0),
        ("XRP", 0.5),
        ("TON", 6.5),
    ])
}

/// Refuses connections for any request naming a poisoned symbol.
struct PartiallyReachable {
    inner: Arc<dyn QuoteSource>,
    poisoned: Symbol,
}

impl QuoteSource for PartiallyReachable {
    fn open_session(&self) -> Arc<dyn QuoteSource> {
        Arc::new(Self {
            inner: self.inner.open_session(),
            poisoned: self.poisoned.clone(),
        })
    }

    fn fetch_one<'a>(&'a self, symbol: &'a Symbol) -> QuoteFuture<'a, PriceQuote> {
        Box::pin(async move {
            if *symbol == self.poisoned {
                return Err(FetchError::transport_fatal("connection refused"));
            }
            self.inner.fetch_one(symbol).await
        })
    }

    fn fetch_batch<'a>(&'a self, symbols: &'a [Symbol]) -> QuoteFuture<'a, PriceTable> {
        Box::pin(async move {
            if symbols.contains(&self.poisoned) {
                return Err(FetchError::transport_fatal("connection refused"));
            }
            self.inner.fetch_batch(symbols).await
        })
    }
}

// =============================================================================
// Benchmark: Sample shape
// =============================================================================

#[tokio::test]
async fn benchmark_emits_one_sample_per_portfolio_in_order() {
    // Given: Random portfolios of sizes 3, 5 and 8 over a priced universe
    let (_, source) = fixture_source(priced_universe());
    let universe = ["BTC", "ETH", "SOL", "ADA", "DOT", "LTC", "XRP", "TON"].map(sym);
    let mut rng = fastrand::Rng::with_seed(5);
    let portfolios = random_portfolios(&[3, 5, 8], &universe, &mut rng)
        .expect("universe fits");
    let runner = BenchmarkRunner::new(source);

    // When: The concurrent strategy is timed
    let samples = runner.run(&portfolios, FetchStrategy::Concurrent).await;

    // Then: Three samples come back, matching the input sizes and order
    let sizes = samples
        .iter()
        .map(|sample| sample.portfolio_size)
        .collect::<Vec<_>>();
    assert_eq!(sizes, vec![3, 5, 8]);
    assert!(samples.iter().all(|sample| {
        sample.elapsed_seconds >= 0.0 && sample.strategy == StrategyKind::Concurrent
    }));
}

#[tokio::test]
async fn fatal_fetch_skips_only_the_affected_portfolio() {
    // Given: Three portfolios, the middle one holding an unreachable symbol
    let (http, inner) = fixture_source(priced_universe());
    let source: Arc<dyn QuoteSource> = Arc::new(PartiallyReachable {
        inner,
        poisoned: sym("DOT"),
    });
    let portfolios = vec![
        portfolio(&[("BTC", 1.0)]),
        portfolio(&[("ETH", 1.0), ("DOT", 2.0)]),
        portfolio(&[("SOL", 1.0), ("ADA", 1.0), ("LTC", 1.0)]),
    ];
    let runner = BenchmarkRunner::new(source);

    // When: The run proceeds sequentially
    let samples = runner.run(&portfolios, FetchStrategy::Sequential).await;

    // Then: The failing portfolio is absent and the others keep their position
    let positions = samples
        .iter()
        .map(|sample| (sample.portfolio, sample.portfolio_size))
        .collect::<Vec<_>>();
    assert_eq!(positions, vec![(0, 1), (2, 3)]);

    // And: The failed valuation released its session like the others
    assert_eq!(http.sessions_opened(), 3);
    assert_eq!(http.sessions_closed(), 3);
}

#[tokio::test]
async fn run_all_groups_samples_by_strategy() {
    // Given: Two portfolios and two strategies
    let (_, source) = fixture_source(priced_universe());
    let portfolios = vec![
        portfolio(&[("BTC", 1.0), ("ETH", 1.0)]),
        portfolio(&[("SOL", 1.0), ("ADA", 1.0), ("XRP", 1.0)]),
    ];
    let runner = BenchmarkRunner::new(source);

    // When: Both strategies are timed
    let samples = runner
        .run_all(
            &portfolios,
            &[FetchStrategy::Sequential, FetchStrategy::BatchedSequential],
        )
        .await;

    // Then: All sequential samples precede the batched ones
    let order = samples
        .iter()
        .map(|sample| (sample.strategy, sample.portfolio))
        .collect::<Vec<_>>();
    assert_eq!(
        order,
        vec![
            (StrategyKind::Sequential, 0),
            (StrategyKind::Sequential, 1),
            (StrategyKind::BatchedSequential, 0),
            (StrategyKind::BatchedSequential, 1),
        ]
    );
}

// =============================================================================
// Benchmark: Comparison and screening
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_fetching_beats_sequential_on_a_slow_service() {
    // Given: A service with noticeable latency and a five-asset portfolio
    let (_, source) = fixture_source(priced_universe().with_latency(Duration::from_millis(40)));
    let portfolios = vec![portfolio(&[
        ("BTC", 1.0),
        ("ETH", 1.0),
        ("SOL", 1.0),
        ("ADA", 1.0),
        ("DOT", 1.0),
    ])];
    let runner = BenchmarkRunner::new(source);

    // When: Sequential and concurrent runs are compared
    let baseline = runner.run(&portfolios, FetchStrategy::Sequential).await;
    let candidate = runner.run(&portfolios, FetchStrategy::Concurrent).await;
    let rows = compare(&baseline, &candidate);

    // Then: The concurrent run is faster
    assert_eq!(rows.len(), 1);
    let speedup = rows[0].speedup.expect("candidate took measurable time");
    assert!(speedup > 1.0, "speedup was {speedup}");
}

#[tokio::test]
async fn screening_keeps_only_priced_symbols() {
    // Given: A service that prices only part of the default universe
    let (http, source) = fixture_source(
        FixtureHttpClient::new("USD")
            .with_prices([("BTC", 1.0), ("ETH", 2.0), ("SOL", 3.0)])
            .with_null_price("DOGE"),
    );
    let runner = BenchmarkRunner::new(source);
    let candidates = default_universe();

    // When: The universe is screened
    let accepted = runner.screen_symbols(&candidates).await.expect("reachable");

    // Then: Only found symbols survive, one request per candidate
    assert_eq!(accepted, vec![sym("BTC"), sym("ETH"), sym("SOL")]);
    assert_eq!(http.calls(), candidates.len());

    // And: Every request went through one session that is now closed
    assert_eq!(http.sessions_opened(), 1);
    assert_eq!(http.sessions_closed(), 1);
}
