//! Quote client configuration.
//!
//! | Setting | Env var | Default |
//! |---------|---------|---------|
//! | credential | `FERROFOLIO_CMC_API_KEY`, then `CMC_API_KEY` | required |
//! | endpoint | `FERROFOLIO_ENDPOINT` | [`DEFAULT_ENDPOINT`] |
//! | quote currency | `FERROFOLIO_CURRENCY` | `USD` |

use std::env;
use std::fmt::{Debug, Formatter};

use crate::domain::validate_currency_code;
use crate::error::ConfigError;

pub const DEFAULT_ENDPOINT: &str =
    "https://pro-api.coinmarketcap.com/v1/cryptocurrency/quotes/latest";
pub const DEFAULT_CURRENCY: &str = "USD";
/// Header carrying the credential on every request.
pub const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Settings passed to [`QuoteClient`](crate::QuoteClient) at construction.
#[derive(Clone, PartialEq, Eq)]
pub struct QuoteClientConfig {
    endpoint: String,
    currency: String,
    api_key: String,
    timeout_ms: u64,
}

impl QuoteClientConfig {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential);
        }

        Ok(Self {
            endpoint: String::from(DEFAULT_ENDPOINT),
            currency: String::from(DEFAULT_CURRENCY),
            api_key,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        })
    }

    /// Read the credential and optional overrides from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var("FERROFOLIO_CMC_API_KEY")
            .or_else(|_| env::var("CMC_API_KEY"))
            .map_err(|_| ConfigError::MissingCredential)?;

        let mut config = Self::new(api_key)?;
        if let Ok(endpoint) = env::var("FERROFOLIO_ENDPOINT") {
            config = config.with_endpoint(endpoint)?;
        }
        if let Ok(currency) = env::var("FERROFOLIO_CURRENCY") {
            config = config.with_currency(&currency)?;
        }
        Ok(config)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Result<Self, ConfigError> {
        let endpoint = endpoint.into();
        let trimmed = endpoint.trim();
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ConfigError::InvalidEndpoint { value: endpoint });
        }
        self.endpoint = trimmed.to_owned();
        Ok(self)
    }

    pub fn with_currency(mut self, currency: &str) -> Result<Self, ConfigError> {
        self.currency = validate_currency_code(currency)?;
        Ok(self)
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub const fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }
}

// Keeps the credential out of logs and panic messages.
impl Debug for QuoteClientConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteClientConfig")
            .field("endpoint", &self.endpoint)
            .field("currency", &self.currency)
            .field("api_key", &"<redacted>")
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}
