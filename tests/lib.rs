// Shared fixtures for behavior tests
use std::sync::Arc;

pub use ferrofolio_core::{
    FetchError, FetchStrategy, FixtureHttpClient, Portfolio, PriceTable, QuoteClient,
    QuoteClientConfig, QuoteSource, QuoteStatus, Symbol,
};

pub fn sym(raw: &str) -> Symbol {
    Symbol::parse(raw).expect("valid symbol")
}

pub fn portfolio(entries: &[(&str, f64)]) -> Portfolio {
    let mut portfolio = Portfolio::new();
    for (symbol, quantity) in entries {
        portfolio
            .insert(sym(symbol), *quantity)
            .expect("valid holding");
    }
    portfolio
}

/// Quote client over an in-process fixture; the fixture handle is returned
/// so tests can inspect the requests it received.
pub fn fixture_source(http: FixtureHttpClient) -> (Arc<FixtureHttpClient>, Arc<dyn QuoteSource>) {
    let http = Arc::new(http);
    let config = QuoteClientConfig::new("test-key").expect("valid config");
    let client: Arc<dyn QuoteSource> = Arc::new(QuoteClient::new(http.clone(), config));
    (http, client)
}

pub fn every_strategy() -> Vec<FetchStrategy> {
    vec![
        FetchStrategy::Sequential,
        FetchStrategy::Concurrent,
        FetchStrategy::BatchedSequential,
        FetchStrategy::batched_concurrent(2).expect("non-zero batch size"),
    ]
}
