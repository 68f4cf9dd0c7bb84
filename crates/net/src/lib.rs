//! wikirc network library
//!
//! Minimal IRC client used to announce wiki changes.
//!
//! # Architecture
//!
//! - **Client**: registers, joins the configured channel and answers pings
//! - **Protocol**: IRC message parsing and formatting
//! - **Frame**: CRLF line framing with the 512-byte outbound limit
//!
//! # Usage
//!
//! ```ignore
//! let client = Arc::new(IrcClient::connect(&bot_data).await?);
//!
//! // Queued, not awaited
//! client.send_message("#wiki", "Main.WebHome was modified by alice (created) - ...")?;
//! ```

pub mod client;
pub mod error;
mod frame;
pub mod protocol;

pub use client::{ConnectionState, IrcClient, IrcEvent};
pub use error::{Error, Result};
pub use protocol::Message;

/// Default plaintext IRC port
pub const DEFAULT_PORT: u16 = 6667;
