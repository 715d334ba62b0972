use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::Symbol;

/// Outcome of looking up one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Found,
    NotFound,
    Malformed,
}

impl QuoteStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Found => "found",
            Self::NotFound => "not_found",
            Self::Malformed => "malformed",
        }
    }
}

impl Display for QuoteStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Price for a single symbol from one fetch cycle.
///
/// Only `Found` quotes carry a non-zero price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: Symbol,
    pub price: f64,
    pub status: QuoteStatus,
}

impl PriceQuote {
    pub fn found(symbol: Symbol, price: f64) -> Self {
        Self {
            symbol,
            price,
            status: QuoteStatus::Found,
        }
    }

    pub fn not_found(symbol: Symbol) -> Self {
        Self {
            symbol,
            price: 0.0,
            status: QuoteStatus::NotFound,
        }
    }

    pub fn malformed(symbol: Symbol) -> Self {
        Self {
            symbol,
            price: 0.0,
            status: QuoteStatus::Malformed,
        }
    }

    pub const fn is_found(&self) -> bool {
        matches!(self.status, QuoteStatus::Found)
    }
}

/// Symbol-keyed quotes assembled for one valuation.
///
/// Lookups never fail: an absent symbol prices at `0.0`, the same as a
/// `NotFound` quote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    quotes: BTreeMap<Symbol, PriceQuote>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a quote keyed by its own symbol, replacing any prior entry.
    pub fn insert(&mut self, quote: PriceQuote) {
        self.quotes.insert(quote.symbol.clone(), quote);
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&PriceQuote> {
        self.quotes.get(symbol)
    }

    /// Price for `symbol`, or `0.0` when it was not found, malformed or absent.
    pub fn price(&self, symbol: &Symbol) -> f64 {
        self.get(symbol).map_or(0.0, |quote| quote.price)
    }

    /// Status for `symbol`; absent symbols report `NotFound`.
    pub fn status(&self, symbol: &Symbol) -> QuoteStatus {
        self.get(symbol)
            .map_or(QuoteStatus::NotFound, |quote| quote.status)
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn quotes(&self) -> impl Iterator<Item = &PriceQuote> + '_ {
        self.quotes.values()
    }

    pub fn count(&self, status: QuoteStatus) -> usize {
        self.quotes
            .values()
            .filter(|quote| quote.status == status)
            .count()
    }
}

impl Extend<PriceQuote> for PriceTable {
    fn extend<T: IntoIterator<Item = PriceQuote>>(&mut self, iter: T) {
        for quote in iter {
            self.insert(quote);
        }
    }
}

impl FromIterator<PriceQuote> for PriceTable {
    fn from_iter<T: IntoIterator<Item = PriceQuote>>(iter: T) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

impl IntoIterator for PriceTable {
    type Item = PriceQuote;
    type IntoIter = std::collections::btree_map::IntoValues<Symbol, PriceQuote>;

    fn into_iter(self) -> Self::IntoIter {
        self.quotes.into_values()
    }
}
