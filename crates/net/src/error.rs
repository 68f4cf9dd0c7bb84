//! IRC connection error types

use std::io;

/// Network result type
pub type Result<T> = std::result::Result<T, Error>;

/// Network errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Not connected")]
    NotConnected,

    #[error("Outbound queue full")]
    QueueFull,

    #[error("Invalid server address: {0}")]
    InvalidServer(String),
}

impl From<Error> for wikirc_core::Error {
    fn from(e: Error) -> Self {
        wikirc_core::Error::Chat(e.to_string())
    }
}
