use thiserror::Error;

/// Validation and contract errors exposed by `ferrofolio-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("currency must be a 3-letter uppercase ISO code: '{value}'")]
    InvalidCurrency { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("line {line}: expected 'SYMBOL QUANTITY', got '{content}'")]
    MalformedHolding { line: usize, content: String },
    #[error("line {line}: {source}")]
    InvalidHolding {
        line: usize,
        #[source]
        source: Box<ValidationError>,
    },

    #[error("cannot sample {requested} symbols from a universe of {available}")]
    UniverseTooSmall { requested: usize, available: usize },
    #[error("batch size must be greater than zero")]
    ZeroBatchSize,
}

/// Configuration problems detected before any request is issued.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing API credential; set FERROFOLIO_CMC_API_KEY or CMC_API_KEY")]
    MissingCredential,
    #[error("endpoint must be an http(s) URL: '{value}'")]
    InvalidEndpoint { value: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Failures that abort a whole `resolve` call.
///
/// Per-symbol misses, parse failures and batch-wide transport failures are
/// never reported here; they are carried as data in `QuoteStatus`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("quote service unreachable: {message}")]
    TransportFatal { message: String },
    #[error("fetch task failed: {message}")]
    TaskFailed { message: String },
}

impl FetchError {
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::TransportFatal {
            message: message.into(),
        }
    }

    pub fn task_failed(message: impl Into<String>) -> Self {
        Self::TaskFailed {
            message: message.into(),
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::TransportFatal { .. } => "fetch.transport_fatal",
            Self::TaskFailed { .. } => "fetch.task_failed",
        }
    }
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to read portfolio file: {0}")]
    Io(#[from] std::io::Error),
}
