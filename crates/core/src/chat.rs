//! Chat client seam
//!
//! The dispatcher only needs to know whether the bot is online, which
//! channels it sits in and how to push a line. The IRC connection lives in
//! `wikirc-net`; tests use an in-memory recorder.

use crate::error::Result;

/// Outbound side of a chat connection
pub trait ChatClient: Send + Sync {
    fn is_connected(&self) -> bool;

    /// Channels currently joined, in join order
    fn channel_names(&self) -> Vec<String>;

    /// Queue `text` for `channel`. Returning `Ok` does not mean delivery.
    fn send_message(&self, channel: &str, text: &str) -> Result<()>;
}
