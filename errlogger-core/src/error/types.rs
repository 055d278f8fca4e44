//! Core error types for errlogger

use thiserror::Error;

/// Error type for errlogger setup and transport operations
#[derive(Error, Debug)]
pub enum ErrorLoggerError {
    // Configuration Errors
    #[error("Configuration error in {component}: {message}")]
    ConfigurationError { component: String, message: String },

    #[error("Failed to parse configuration file {path}")]
    ConfigParse {
        path: String,
        #[source]
        source: Box<toml::de::Error>,
    },

    // Transport Errors
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] Box<reqwest::Error>),

    #[error("Request to {endpoint} failed")]
    Request {
        endpoint: String,
        #[source]
        source: Box<reqwest::Error>,
    },

    #[error("Endpoint {endpoint} rejected delivery with status {status}")]
    UnexpectedStatus { endpoint: String, status: u16 },

    #[error("Operation timed out: {operation} after {duration:?}")]
    Timeout {
        operation: String,
        duration: std::time::Duration,
    },

    // Hook Errors
    #[error("Capture hook error: {message}")]
    Hook { message: String },

    // System Errors
    #[error("IO error: {0}")]
    IoError(#[from] Box<std::io::Error>),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

pub type Result<T> = std::result::Result<T, ErrorLoggerError>;
pub type ErrorLoggerResult<T> = Result<T>;
