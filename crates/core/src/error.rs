//! Error types for wikirc core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration missing: {message}")]
    ConfigurationMissing {
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    #[error("Query failed: {message}")]
    QueryFailure {
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    #[error("The execution context is not available")]
    ContextUnavailable,

    #[error("Unable to load document [{document}]")]
    Storage {
        document: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to dispatch notification for [{document}]: {reason}")]
    DispatchFailure { document: String, reason: String },

    #[error("Invalid exclusion pattern [{pattern}]: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Chat client error: {0}")]
    Chat(String),

    #[error("Invalid document reference: {0}")]
    InvalidReference(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn configuration_missing(message: impl Into<String>) -> Self {
        Error::ConfigurationMissing {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a lower-level failure with the document it was loading
    pub fn storage(document: impl Into<String>, source: Error) -> Self {
        Error::Storage {
            document: document.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a query execution failure
    pub fn query(message: impl Into<String>, source: Error) -> Self {
        Error::QueryFailure {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
