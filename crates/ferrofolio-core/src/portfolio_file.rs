//! Plain-text portfolio files.
//!
//! ```text
//! # Portfolio 1: 3 assets
//! BTC 0.5
//! eth 2
//! SOL 10
//!
//! # Portfolio 2: 1 asset
//! ADA 1000
//! ```
//!
//! A `# <label>: ...` line opens a new portfolio named by the text before the
//! first `:`; anything after it is free-form. Any other `#` line is a comment
//! and leaves the current group alone. Holdings before the first header form
//! an unlabelled portfolio. Blank lines are ignored and groups with no
//! holdings are dropped.

use std::fs;
use std::path::Path;

use crate::error::CoreError;
use crate::{Holding, Portfolio, Symbol, ValidationError};

pub fn parse_portfolios(text: &str) -> Result<Vec<Portfolio>, ValidationError> {
    let mut portfolios = Vec::new();
    let mut current = Portfolio::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(comment) = trimmed.strip_prefix('#') {
            if let Some(label) = group_label(comment) {
                let finished = std::mem::replace(&mut current, Portfolio::with_label(label));
                if !finished.is_empty() {
                    portfolios.push(finished);
                }
            }
            continue;
        }

        let holding = parse_holding(line, trimmed)?;
        current
            .insert(holding.symbol, holding.quantity)
            .map_err(|source| invalid_at(line, source))?;
    }

    if !current.is_empty() {
        portfolios.push(current);
    }
    Ok(portfolios)
}

pub fn load_portfolios(path: impl AsRef<Path>) -> Result<Vec<Portfolio>, CoreError> {
    let text = fs::read_to_string(path)?;
    Ok(parse_portfolios(&text)?)
}

/// Label of a `# <label>: ...` header; `None` for a plain comment.
fn group_label(comment: &str) -> Option<&str> {
    let (label, _) = comment.split_once(':')?;
    let label = label.trim();
    (!label.is_empty()).then_some(label)
}

fn invalid_at(line: usize, source: ValidationError) -> ValidationError {
    ValidationError::InvalidHolding {
        line,
        source: Box::new(source),
    }
}

fn parse_holding(line: usize, content: &str) -> Result<Holding, ValidationError> {
    let malformed = || ValidationError::MalformedHolding {
        line,
        content: content.to_owned(),
    };

    let mut fields = content.split_whitespace();
    let (Some(symbol), Some(quantity), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(malformed());
    };

    let symbol = Symbol::parse(symbol).map_err(|source| invalid_at(line, source))?;
    let quantity = quantity.parse::<f64>().map_err(|_| malformed())?;
    Holding::new(symbol, quantity).map_err(|source| invalid_at(line, source))
}
