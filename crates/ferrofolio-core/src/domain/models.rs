use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Symbol, ValidationError};

/// Lower bound (inclusive) of randomly generated holding quantities.
pub const RANDOM_QUANTITY_MIN: f64 = 0.5;
/// Upper bound (exclusive) of randomly generated holding quantities.
pub const RANDOM_QUANTITY_MAX: f64 = 5.0;

/// One position in a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: Symbol,
    pub quantity: f64,
}

impl Holding {
    pub fn new(symbol: Symbol, quantity: f64) -> Result<Self, ValidationError> {
        validate_non_negative("quantity", quantity)?;
        Ok(Self { symbol, quantity })
    }
}

/// Ordered mapping from symbol to held quantity.
///
/// Keys are unique. Insertion order is kept for breakdown display and does
/// not affect the valuation total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    label: Option<String>,
    holdings: IndexMap<Symbol, f64>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            holdings: IndexMap::new(),
        }
    }

    /// Insert or replace a holding. Returns the previous quantity, if any.
    pub fn insert(
        &mut self,
        symbol: Symbol,
        quantity: f64,
    ) -> Result<Option<f64>, ValidationError> {
        validate_non_negative("quantity", quantity)?;
        Ok(self.holdings.insert(symbol, quantity))
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Number of holdings; this is the portfolio size used by benchmarks.
    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn quantity(&self, symbol: &Symbol) -> Option<f64> {
        self.holdings.get(symbol).copied()
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.holdings.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, f64)> + '_ {
        self.holdings
            .iter()
            .map(|(symbol, quantity)| (symbol, *quantity))
    }

    /// Sample `size` distinct symbols from `universe` with quantities drawn
    /// uniformly from `[RANDOM_QUANTITY_MIN, RANDOM_QUANTITY_MAX)`.
    pub fn random(
        size: usize,
        universe: &[Symbol],
        rng: &mut fastrand::Rng,
    ) -> Result<Self, ValidationError> {
        let mut pool = universe.to_vec();
        pool.sort();
        pool.dedup();
        if size > pool.len() {
            return Err(ValidationError::UniverseTooSmall {
                requested: size,
                available: pool.len(),
            });
        }

        rng.shuffle(&mut pool);
        let mut portfolio = Self::with_label(format!("random {size}"));
        for symbol in pool.into_iter().take(size) {
            let quantity =
                RANDOM_QUANTITY_MIN + rng.f64() * (RANDOM_QUANTITY_MAX - RANDOM_QUANTITY_MIN);
            portfolio.holdings.insert(symbol, quantity);
        }
        Ok(portfolio)
    }
}

pub fn validate_currency_code(input: &str) -> Result<String, ValidationError> {
    let normalized = input.trim().to_ascii_uppercase();
    let is_valid = normalized.len() == 3 && normalized.chars().all(|ch| ch.is_ascii_alphabetic());

    if !is_valid {
        return Err(ValidationError::InvalidCurrency {
            value: input.to_owned(),
        });
    }

    Ok(normalized)
}

pub(crate) fn validate_non_negative(
    field: &'static str,
    value: f64,
) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
