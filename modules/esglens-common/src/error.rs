use thiserror::Error;

/// How a failure should be handled by the retry layer and the consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network blip, broker reconnect, model rate limit. Retry with backoff.
    Transient,
    /// Malformed input for this message. Dead-letter, never requeue.
    PermanentInput,
    /// Missing schema, invalid config. Fail the process.
    PermanentSystem,
}

#[derive(Error, Debug)]
pub enum EsgError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Object store error: {0}")]
    ObjectStore(String),

    #[error("Broker error: {0}")]
    Broker(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl EsgError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EsgError::Database(_)
            | EsgError::ObjectStore(_)
            | EsgError::Broker(_)
            | EsgError::Embedding(_)
            | EsgError::Scraping(_) => ErrorKind::Transient,
            EsgError::InvalidInput(_) | EsgError::Extraction(_) => ErrorKind::PermanentInput,
            EsgError::Config(_) => ErrorKind::PermanentSystem,
            EsgError::Anyhow(_) => ErrorKind::Transient,
        }
    }
}

pub type Result<T> = std::result::Result<T, EsgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_is_permanent() {
        let e = EsgError::InvalidInput("bad key".into());
        assert_eq!(e.kind(), ErrorKind::PermanentInput);
    }

    #[test]
    fn network_errors_are_transient() {
        assert_eq!(EsgError::Broker("reset".into()).kind(), ErrorKind::Transient);
        assert_eq!(EsgError::Embedding("429".into()).kind(), ErrorKind::Transient);
    }

    #[test]
    fn config_errors_fail_fast() {
        let e = EsgError::Config("DB_HOST unset".into());
        assert_eq!(e.kind(), ErrorKind::PermanentSystem);
    }
}
