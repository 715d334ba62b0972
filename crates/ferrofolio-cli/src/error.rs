use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ferrofolio_core::ValidationError),

    #[error(transparent)]
    Config(#[from] ferrofolio_core::ConfigError),

    #[error(transparent)]
    Fetch(#[from] ferrofolio_core::FetchError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ferrofolio_core::CoreError> for CliError {
    fn from(error: ferrofolio_core::CoreError) -> Self {
        use ferrofolio_core::CoreError;

        match error {
            CoreError::Validation(error) => Self::Validation(error),
            CoreError::Config(error) => Self::Config(error),
            CoreError::Fetch(error) => Self::Fetch(error),
            CoreError::Io(error) => Self::Io(error),
        }
    }
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Command(_) => 2,
            Self::Config(_) => 3,
            Self::Serialization(_) | Self::Csv(_) => 4,
            Self::Fetch(_) => 6,
            Self::Io(_) => 10,
        }
    }

    /// Stable machine-readable code, for errors that carry one.
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::Fetch(error) => Some(error.code()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_categories_to_exit_codes() {
        let validation = CliError::from(ferrofolio_core::ValidationError::ZeroBatchSize);
        let config = CliError::from(ferrofolio_core::ConfigError::MissingCredential);
        let fetch = CliError::from(ferrofolio_core::FetchError::transport_fatal("refused"));

        assert_eq!(validation.exit_code(), 2);
        assert_eq!(config.exit_code(), 3);
        assert_eq!(fetch.exit_code(), 6);
    }

    #[test]
    fn fetch_errors_expose_their_code() {
        let fatal = CliError::from(ferrofolio_core::FetchError::transport_fatal("refused"));
        let panicked = CliError::from(ferrofolio_core::FetchError::task_failed("boom"));
        let command = CliError::Command(String::from("no portfolios"));

        assert_eq!(fatal.code(), Some("fetch.transport_fatal"));
        assert_eq!(panicked.code(), Some("fetch.task_failed"));
        assert_eq!(command.code(), None);
    }

    #[test]
    fn core_errors_keep_their_category() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error = CliError::from(ferrofolio_core::CoreError::Io(io));
        assert_eq!(error.exit_code(), 10);
    }
}
