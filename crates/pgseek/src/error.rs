//! Error types for pgseek

use thiserror::Error;

/// Result type alias for pgseek operations
pub type SeekResult<T> = Result<T, SeekError>;

/// Error types for query building, execution and pagination
#[derive(Debug, Error)]
pub enum SeekError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Error reported by the database client
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// A single-row fetch matched no row
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller passed something the operation cannot work with
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Any other failure, annotated with the operation that produced it
    #[error("{operation}: {source}")]
    Execution {
        operation: &'static str,
        source: Box<SeekError>,
    },

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Bind value could not be encoded for the parameter type
    #[error("Encode error: {0}")]
    Encode(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl SeekError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Annotate this error with the name of the operation that failed.
    ///
    /// `NotFound` and `InvalidArgument` keep their kind so callers can still
    /// branch on "absent" vs "broken"; everything else becomes
    /// [`SeekError::Execution`].
    pub fn context(self, operation: &'static str) -> Self {
        match self {
            Self::NotFound(message) => Self::NotFound(format!("{operation}: {message}")),
            Self::InvalidArgument(_) => self,
            other => Self::Execution {
                operation,
                source: Box::new(other),
            },
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is an invalid argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// The outermost operation this error was annotated with, if any.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Execution { operation, .. } => Some(operation),
            _ => None,
        }
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for SeekError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

/// Extension for annotating `SeekResult`s with an operation name.
pub(crate) trait ResultExt<T> {
    fn context(self, operation: &'static str) -> SeekResult<T>;
}

impl<T> ResultExt<T> for SeekResult<T> {
    fn context(self, operation: &'static str) -> SeekResult<T> {
        self.map_err(|e| e.context(operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_wraps_execution_failures() {
        let err = SeekError::Connection("refused".into()).context("execute get all query");
        assert_eq!(err.operation(), Some("execute get all query"));
        assert_eq!(
            err.to_string(),
            "execute get all query: Connection error: refused"
        );
    }

    #[test]
    fn context_keeps_not_found_kind() {
        let err = SeekError::not_found("Expected one row, got none").context("execute get query");
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Not found: execute get query: Expected one row, got none"
        );
    }

    #[test]
    fn context_keeps_invalid_argument_kind() {
        let err = SeekError::invalid_argument("bad key").context("execute page query");
        assert!(err.is_invalid_argument());
        assert_eq!(err.operation(), None);
    }
}
