use std::sync::Arc;

use ferrofolio_core::{BenchmarkRunner, FetchStrategy, QuoteSource, StrategyKind};
use serde_json::json;
use tracing::info;

use super::select_portfolios;
use crate::cli::BenchArgs;
use crate::error::CliError;
use crate::output::{self, Report};

const DEFAULT_STRATEGIES: [StrategyKind; 2] = [StrategyKind::Sequential, StrategyKind::Concurrent];

pub async fn run(args: &BenchArgs, source: Arc<dyn QuoteSource>) -> Result<Report, CliError> {
    let kinds = if args.strategies.is_empty() {
        DEFAULT_STRATEGIES.to_vec()
    } else {
        args.strategies.clone()
    };
    let strategies = kinds
        .into_iter()
        .map(|kind| FetchStrategy::from_kind(kind, args.batch_size))
        .collect::<Result<Vec<_>, _>>()?;

    let portfolios = select_portfolios(&args.portfolios, &source).await?;
    let runner = BenchmarkRunner::new(source);
    let samples = runner.run_all(&portfolios, &strategies).await;
    info!(
        portfolios = portfolios.len(),
        samples = samples.len(),
        "benchmark finished"
    );

    let mut report = Report::new(
        json!({ "samples": samples }),
        vec!["strategy", "num_assets", "time_seconds"],
    );
    for sample in &samples {
        report.push_row(vec![
            sample.strategy.to_string(),
            sample.portfolio_size.to_string(),
            format!("{:.4}", sample.elapsed_seconds),
        ]);
    }

    if let Some(path) = &args.output {
        output::write_csv_file(&report, path)?;
        info!(path = %path.display(), "timings written");
    }
    Ok(report)
}
