use std::sync::Arc;

use ferrofolio_core::{FetchStrategy, QuoteSource, Symbol};
use serde_json::json;

use crate::cli::QuoteArgs;
use crate::error::CliError;
use crate::output::Report;

pub async fn run(args: &QuoteArgs, source: &Arc<dyn QuoteSource>) -> Result<Report, CliError> {
    let symbols = args
        .symbols
        .iter()
        .map(|raw| Symbol::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let strategy = FetchStrategy::from_kind(args.strategy.strategy, args.strategy.batch_size)?;

    let table = strategy.resolve(source, &symbols).await?;

    let mut report = Report::new(
        json!({ "strategy": strategy.kind(), "quotes": table.quotes().collect::<Vec<_>>() }),
        vec!["symbol", "price", "status"],
    );
    for quote in table.quotes() {
        report.push_row(vec![
            quote.symbol.to_string(),
            quote.price.to_string(),
            quote.status.to_string(),
        ]);
    }
    Ok(report)
}
