//! Error types for debtgraph-rs.

/// Alias for Results returning [`DebtGraphError`].
pub type Result<T> = std::result::Result<T, DebtGraphError>;

/// Top-level error type for debtgraph-rs.
#[derive(Debug, thiserror::Error)]
pub enum DebtGraphError {
    /// The graph store was never connected (or has been closed).
    #[error("Graph store is not initialized")]
    NotInitialized,

    /// The graph store is unreachable.
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error on '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Node not found: {0}")]
    NodeNotFound(String),
}

impl DebtGraphError {
    /// Create an IO error with a path context.
    pub(crate) fn io(path: impl std::fmt::Display, source: std::io::Error) -> Self {
        DebtGraphError::Io {
            path: path.to_string(),
            source,
        }
    }

    /// Whether this error means the graph store itself is unusable.
    ///
    /// Fatal errors abort an ingestion run; everything else is scoped to the
    /// record being processed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DebtGraphError::NotInitialized | DebtGraphError::Connection(_)
        )
    }
}

impl From<neo4rs::Error> for DebtGraphError {
    /// Transport and authentication failures become [`DebtGraphError::Connection`]
    /// so a store lost mid-run aborts it; query failures stay [`DebtGraphError::Driver`].
    fn from(err: neo4rs::Error) -> Self {
        use neo4rs::Error;

        match err {
            Error::ConnectionError
            | Error::IOError { .. }
            | Error::AuthenticationError(_)
            | Error::UrlParseError(_)
            | Error::UnsupportedScheme(_)
            | Error::InvalidDnsName(_) => DebtGraphError::Connection(err.to_string()),
            other => DebtGraphError::Driver(other.to_string()),
        }
    }
}

impl From<neo4rs::DeError> for DebtGraphError {
    fn from(err: neo4rs::DeError) -> Self {
        DebtGraphError::Driver(format!("row decode: {err}"))
    }
}

/// LLM-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Rate limited")]
    RateLimit,

    #[error("Model refused to respond")]
    Refusal,

    #[error("Empty response from LLM")]
    EmptyResponse,

    #[error("Authentication failed")]
    Authentication,

    #[error("API error: HTTP {status}: {message}")]
    Api { status: u16, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_errors_are_fatal() {
        assert!(DebtGraphError::NotInitialized.is_fatal());
        assert!(DebtGraphError::Connection("refused".into()).is_fatal());
    }

    #[test]
    fn record_errors_are_recoverable() {
        assert!(!DebtGraphError::Driver("constraint violated".into()).is_fatal());
        assert!(!DebtGraphError::Validation("missing id".into()).is_fatal());
        assert!(!DebtGraphError::Llm(LlmError::RateLimit).is_fatal());
    }

    #[test]
    fn lost_neo4j_connection_is_fatal() {
        let err: DebtGraphError = neo4rs::Error::ConnectionError.into();
        assert!(matches!(err, DebtGraphError::Connection(_)));
        assert!(err.is_fatal());

        let err: DebtGraphError = neo4rs::Error::IOError {
            detail: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe"),
        }
        .into();
        assert!(err.is_fatal());

        let err: DebtGraphError = neo4rs::Error::AuthenticationError("bad credentials".into()).into();
        assert!(err.is_fatal());
    }

    #[test]
    fn neo4j_query_errors_are_recoverable() {
        let err: DebtGraphError = neo4rs::Error::UnexpectedMessage("FAILURE".into()).into();
        assert!(matches!(err, DebtGraphError::Driver(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn io_error_keeps_path() {
        let err = DebtGraphError::io(
            "data/missing.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("data/missing.json"));
    }
}
