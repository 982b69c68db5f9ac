use thiserror::Error;

/// Error types for newsletter ingestion and storage
#[derive(Error, Debug)]
pub enum NewsletterError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("No record found for {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for newsletter operations
pub type NewsletterResult<T> = Result<T, NewsletterError>;

impl NewsletterError {
    /// Whether the caller may retry the failed operation unchanged.
    /// The core itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            NewsletterError::Database(e) => !matches!(
                e,
                sqlx::Error::RowNotFound | sqlx::Error::ColumnNotFound(_) | sqlx::Error::TypeNotFound { .. }
            ),
            NewsletterError::Io(_) => true,
            _ => false,
        }
    }

    /// Create a parse error with context
    pub fn parse_error<S: Into<String>>(message: S) -> Self {
        NewsletterError::Parse {
            message: message.into(),
        }
    }

    /// Create a validation error with field context
    pub fn validation_error<S: Into<String>>(field: S, message: S) -> Self {
        NewsletterError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_is_not_retryable() {
        let err = NewsletterError::validation_error("newsletter_id", "expected YYYYMMDD");
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "Validation error: newsletter_id - expected YYYYMMDD"
        );
    }

    #[test]
    fn test_io_error_is_retryable() {
        let err: NewsletterError =
            std::io::Error::new(std::io::ErrorKind::TimedOut, "mailbox timed out").into();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_row_not_found_is_not_retryable() {
        let err: NewsletterError = sqlx::Error::RowNotFound.into();
        assert!(!err.is_retryable());
    }
}
