use std::sync::Arc;

use ferrofolio_core::{load_portfolios, value, FetchStrategy, QuoteSource};
use serde_json::json;

use super::portfolio_name;
use crate::cli::ValueArgs;
use crate::error::CliError;
use crate::output::Report;

pub async fn run(args: &ValueArgs, source: &Arc<dyn QuoteSource>) -> Result<Report, CliError> {
    let strategy = FetchStrategy::from_kind(args.strategy.strategy, args.strategy.batch_size)?;
    let mut portfolios = load_portfolios(&args.file)?;
    if let Some(group) = &args.group {
        portfolios.retain(|portfolio| portfolio.label() == Some(group.as_str()));
        if portfolios.is_empty() {
            return Err(CliError::Command(format!(
                "no group labelled '{group}' in '{}'",
                args.file.display()
            )));
        }
    }

    let mut valued = Vec::with_capacity(portfolios.len());
    let mut report = Report::new(
        json!(null),
        vec![
            "portfolio",
            "symbol",
            "quantity",
            "price",
            "line_value",
            "status",
        ],
    );

    for (index, portfolio) in portfolios.iter().enumerate() {
        let name = portfolio_name(index, portfolio);
        let prices = strategy.resolve(source, &portfolio.symbols()).await?;
        let result = value(portfolio, &prices);

        for line in result.breakdown() {
            report.push_row(vec![
                name.clone(),
                line.symbol.to_string(),
                line.quantity.to_string(),
                line.price.to_string(),
                format!("{:.2}", line.line_value),
                line.status.to_string(),
            ]);
        }
        report.push_row(vec![
            name.clone(),
            String::from("TOTAL"),
            String::new(),
            String::new(),
            format!("{:.2}", result.total()),
            String::new(),
        ]);

        valued.push(json!({
            "portfolio": name,
            "total": result.total(),
            "breakdown": result.breakdown(),
        }));
    }

    report.data = json!({ "strategy": strategy.kind(), "portfolios": valued });
    Ok(report)
}
