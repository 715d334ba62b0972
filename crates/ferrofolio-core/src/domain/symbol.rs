use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_SYMBOL_LEN: usize = 15;

/// Normalized asset ticker.
///
/// Tickers compare case-insensitively because they are upper-cased at
/// construction. Leading digits are allowed (`1INCH`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Parse and normalize a symbol to uppercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        let normalized = trimmed.to_ascii_uppercase();
        let len = normalized.chars().count();
        if len > MAX_SYMBOL_LEN {
            return Err(ValidationError::SymbolTooLong {
                len,
                max: MAX_SYMBOL_LEN,
            });
        }

        for (index, ch) in normalized.chars().enumerate() {
            let valid = ch.is_ascii_alphanumeric() || ch == '.' || ch == '-';
            if !valid {
                return Err(ValidationError::SymbolInvalidChar { ch, index });
            }
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Symbol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Symbol {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes_symbol() {
        let parsed = Symbol::parse(" btc ").expect("symbol should parse");
        assert_eq!(parsed.as_str(), "BTC");
    }

    #[test]
    fn equality_is_case_normalized() {
        assert_eq!(
            Symbol::parse("eth").expect("valid"),
            Symbol::parse("ETH").expect("valid")
        );
    }

    #[test]
    fn accepts_leading_digit() {
        let parsed = Symbol::parse("1inch").expect("symbol should parse");
        assert_eq!(parsed.as_str(), "1INCH");
    }

    #[test]
    fn rejects_invalid_chars() {
        let err = Symbol::parse("BTC,ETH").expect_err("must fail");
        assert!(matches!(
            err,
            ValidationError::SymbolInvalidChar { ch: ',', index: 3 }
        ));
    }

    #[test]
    fn rejects_empty() {
        let err = Symbol::parse("   ").expect_err("must fail");
        assert_eq!(err, ValidationError::EmptySymbol);
    }
}
