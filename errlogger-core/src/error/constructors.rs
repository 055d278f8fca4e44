//! Constructor methods for ErrorLoggerError

use super::types::ErrorLoggerError;

impl ErrorLoggerError {
    /// Create a configuration error with component and message
    ///
    /// # Examples
    /// ```rust
    /// use errlogger_core::error::ErrorLoggerError;
    ///
    /// let err = ErrorLoggerError::configuration("endpoint_url", "must use http or https");
    /// assert!(err.to_string().contains("endpoint_url"));
    /// ```
    pub fn configuration(component: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorLoggerError::ConfigurationError {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a request error for an endpoint
    pub fn request(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        ErrorLoggerError::Request {
            endpoint: endpoint.into(),
            source: Box::new(source),
        }
    }

    /// Create a hook installation error
    pub fn hook(message: impl Into<String>) -> Self {
        ErrorLoggerError::Hook {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        ErrorLoggerError::Internal {
            message: message.into(),
        }
    }

    /// Whether a retry of the same operation could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorLoggerError::Request { .. }
                | ErrorLoggerError::UnexpectedStatus { .. }
                | ErrorLoggerError::Timeout { .. }
        )
    }
}
