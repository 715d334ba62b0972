use std::sync::Arc;

use ferrofolio_core::{compare, BenchmarkRunner, FetchStrategy, QuoteSource};
use serde_json::json;

use super::select_portfolios;
use crate::cli::CompareArgs;
use crate::error::CliError;
use crate::output::Report;

pub async fn run(args: &CompareArgs, source: Arc<dyn QuoteSource>) -> Result<Report, CliError> {
    let baseline = FetchStrategy::from_kind(args.baseline, args.batch_size)?;
    let candidate = FetchStrategy::from_kind(args.candidate, args.batch_size)?;

    let portfolios = select_portfolios(&args.portfolios, &source).await?;
    let runner = BenchmarkRunner::new(source);
    let baseline_samples = runner.run(&portfolios, baseline).await;
    let candidate_samples = runner.run(&portfolios, candidate).await;
    let rows = compare(&baseline_samples, &candidate_samples);

    let mut report = Report::new(
        json!({
            "baseline": baseline.kind(),
            "candidate": candidate.kind(),
            "rows": rows,
        }),
        vec![
            "num_assets",
            "baseline_seconds",
            "candidate_seconds",
            "speedup",
        ],
    );
    for row in &rows {
        report.push_row(vec![
            row.portfolio_size.to_string(),
            format!("{:.4}", row.baseline_seconds),
            format!("{:.4}", row.candidate_seconds),
            row.speedup
                .map(|speedup| format!("{speedup:.2}x"))
                .unwrap_or_else(|| String::from("n/a")),
        ]);
    }
    Ok(report)
}
