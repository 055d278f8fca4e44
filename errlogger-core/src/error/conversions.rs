//! From implementations for external error types

use super::types::ErrorLoggerError;

impl From<std::io::Error> for ErrorLoggerError {
    fn from(err: std::io::Error) -> Self {
        ErrorLoggerError::IoError(Box::new(err))
    }
}

impl From<url::ParseError> for ErrorLoggerError {
    fn from(err: url::ParseError) -> Self {
        ErrorLoggerError::configuration("endpoint_url", err.to_string())
    }
}
