mod bench;
mod compare;
mod quote;
mod value;

use std::sync::Arc;
use std::time::Duration;

use ferrofolio_core::{
    default_universe, load_portfolios, random_portfolios, BenchmarkRunner, FixtureHttpClient,
    Portfolio, QuoteClient, QuoteClientConfig, QuoteSource, DEFAULT_SIZES,
};
use tracing::{debug, info};

use crate::cli::{Cli, Command, PortfolioArgs};
use crate::error::CliError;
use crate::output::Report;

/// Prices served by `--mock`.
const DEMO_PRICES: [(&str, f64); 20] = [
    ("BTC", 67_250.0),
    ("ETH", 3_480.0),
    ("XRP", 0.52),
    ("BNB", 585.0),
    ("SOL", 148.5),
    ("DOGE", 0.12),
    ("ADA", 0.45),
    ("TRX", 0.13),
    ("SUI", 1.05),
    ("LINK", 14.2),
    ("AVAX", 27.8),
    ("XLM", 0.1),
    ("HBAR", 0.07),
    ("SHIB", 0.000_018),
    ("LEO", 5.9),
    ("TON", 6.4),
    ("BCH", 385.0),
    ("DOT", 6.1),
    ("LTC", 72.3),
    ("HYPE", 24.6),
];

/// Simulated round trip for `--mock`, so strategies differ measurably.
const MOCK_LATENCY: Duration = Duration::from_millis(40);

pub async fn run(cli: &Cli) -> Result<Report, CliError> {
    let source = build_source(cli)?;

    match &cli.command {
        Command::Quote(args) => quote::run(args, &source).await,
        Command::Value(args) => value::run(args, &source).await,
        Command::Bench(args) => bench::run(args, source).await,
        Command::Compare(args) => compare::run(args, source).await,
    }
}

fn build_source(cli: &Cli) -> Result<Arc<dyn QuoteSource>, CliError> {
    let mut config = if cli.mock {
        QuoteClientConfig::new("mock")?
    } else {
        QuoteClientConfig::from_env()?
    };
    if let Some(endpoint) = &cli.endpoint {
        config = config.with_endpoint(endpoint.as_str())?;
    }
    if let Some(currency) = &cli.currency {
        config = config.with_currency(currency)?;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config = config.with_timeout_ms(timeout_ms);
    }
    debug!(config = ?config, mock = cli.mock, "quote client configured");

    let client = if cli.mock {
        let http = FixtureHttpClient::new(config.currency())
            .with_prices(DEMO_PRICES)
            .with_latency(MOCK_LATENCY);
        QuoteClient::new(Arc::new(http), config)
    } else {
        QuoteClient::with_reqwest(config)
    };
    Ok(Arc::new(client))
}

/// Portfolios from a file, or random ones drawn from the screened universe.
async fn select_portfolios(
    args: &PortfolioArgs,
    source: &Arc<dyn QuoteSource>,
) -> Result<Vec<Portfolio>, CliError> {
    if let Some(path) = &args.file {
        let portfolios = load_portfolios(path)?;
        if portfolios.is_empty() {
            return Err(CliError::Command(format!(
                "no holdings found in '{}'",
                path.display()
            )));
        }
        return Ok(portfolios);
    }

    let sizes = args.random.clone().unwrap_or_else(|| DEFAULT_SIZES.to_vec());
    let runner = BenchmarkRunner::new(Arc::clone(source));
    let universe = runner.screen_symbols(&default_universe()).await?;
    info!(available = universe.len(), "screened symbol universe");

    let mut rng = match args.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    Ok(random_portfolios(&sizes, &universe, &mut rng)?)
}

fn portfolio_name(index: usize, portfolio: &Portfolio) -> String {
    portfolio
        .label()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("portfolio {}", index + 1))
}
