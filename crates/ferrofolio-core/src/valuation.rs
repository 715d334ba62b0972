//! Portfolio valuation over an already-fetched [`PriceTable`].

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Portfolio, PriceTable, QuoteStatus, Symbol};

/// One row of a valuation breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub symbol: Symbol,
    pub quantity: f64,
    pub price: f64,
    pub line_value: f64,
    pub status: QuoteStatus,
}

/// Total value and per-holding breakdown in portfolio order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    total: f64,
    breakdown: Vec<LineItem>,
}

impl ValuationResult {
    /// The total is derived from `breakdown`, so it always equals the sum of
    /// its line values.
    pub fn from_breakdown(breakdown: Vec<LineItem>) -> Self {
        let total = breakdown.iter().map(|line| line.line_value).sum();
        Self { total, breakdown }
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn breakdown(&self) -> &[LineItem] {
        &self.breakdown
    }

    /// Lines that were priced at zero because no usable quote existed.
    pub fn unpriced(&self) -> impl Iterator<Item = &LineItem> + '_ {
        self.breakdown
            .iter()
            .filter(|line| line.status != QuoteStatus::Found)
    }
}

/// Value `portfolio` against `prices`.
///
/// Symbols missing from the table, or quoted as not found or malformed,
/// contribute `0.0`. No network access happens here.
pub fn value(portfolio: &Portfolio, prices: &PriceTable) -> ValuationResult {
    let breakdown = portfolio
        .iter()
        .map(|(symbol, quantity)| {
            let status = prices.status(symbol);
            let price = match status {
                QuoteStatus::Found => prices.price(symbol),
                QuoteStatus::NotFound | QuoteStatus::Malformed => {
                    warn!(symbol = %symbol, status = %status, "holding valued at zero");
                    0.0
                }
            };

            LineItem {
                symbol: symbol.clone(),
                quantity,
                price,
                line_value: quantity * price,
                status,
            }
        })
        .collect();

    ValuationResult::from_breakdown(breakdown)
}
